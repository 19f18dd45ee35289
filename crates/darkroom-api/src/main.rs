//! Service entry point: tracing init, config load, bind, graceful shutdown.

use tokio::net::TcpListener;
use tokio::signal::{self, unix::SignalKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

use darkroom_api::config::AppConfig;
use darkroom_api::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::load();
    let address = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config);
    let app = darkroom_api::app(state);

    info!("binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .expect("failed to bind listener");
    info!("media service running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
        info!("received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
