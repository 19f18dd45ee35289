//! # Media Root Listing
//!
//! Enumerates the supported source assets at the top of the media root for
//! the library endpoint. A missing or unreadable root yields an empty list,
//! never an error — the gallery simply renders empty.

use std::path::Path;

use crate::format::SourceFormat;

/// List supported filenames in the media root, sorted by name.
///
/// Only regular files whose extension passes the format gate are included;
/// subdirectories are not descended into.
pub async fn list_media_files(root: &Path) -> Vec<String> {
    let Ok(mut entries) = tokio::fs::read_dir(root).await else {
        return Vec::new();
    };

    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if SourceFormat::from_rel_path(&name).is_ok() {
            files.push(name);
        }
    }

    files.sort();
    files
}

/// Derive display alt text from a filename: extension stripped, runs of
/// `-` and `_` collapsed to single spaces, with a generic fallback.
pub fn alt_from_filename(filename: &str) -> String {
    let base = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    let alt = base
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string();
    if alt.is_empty() {
        "Photo".to_string()
    } else {
        alt
    }
}
