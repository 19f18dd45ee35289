//! # Degraded-Output Generator
//!
//! When decoding is irrecoverable the endpoint still answers with a 200: a
//! deterministic, fixed-dimension SVG labeled with the source filename. The
//! graphic is generated from the filename alone — never from source pixel
//! data — and is never written to the artifact store.

/// Content type for the degraded SVG response.
pub const PLACEHOLDER_CONTENT_TYPE: &str = "image/svg+xml; charset=utf-8";

/// Escape the five XML special characters in user-supplied text.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Generate the deterministic 1200x900 placeholder graphic for a filename.
pub fn placeholder_svg(filename: &str) -> String {
    let label = escape_xml(filename);
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="900" viewBox="0 0 1200 900" role="img" aria-label="Image preview unavailable">
  <defs>
    <linearGradient id="bg" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0%" stop-color="rgba(255,255,255,0.06)" />
      <stop offset="100%" stop-color="rgba(255,255,255,0.02)" />
    </linearGradient>
  </defs>
  <rect x="0" y="0" width="1200" height="900" rx="48" fill="url(#bg)" />
  <g fill="rgba(255,255,255,0.82)" font-family="ui-sans-serif, system-ui, -apple-system, Segoe UI, Roboto, Helvetica, Arial" text-anchor="middle">
    <text x="600" y="420" font-size="44" font-weight="700">Preview unavailable</text>
    <text x="600" y="486" font-size="26" fill="rgba(255,255,255,0.66)">Open to download the original file</text>
    <text x="600" y="560" font-size="22" fill="rgba(255,255,255,0.50)">{label}</text>
  </g>
</svg>"##
    )
}
