/// Chest X-ray screening server.
///
/// Serves the JSON API (register, login, logout, upload, PDF download,
/// history) over a synchronous tiny_http server. Configuration comes from
/// `XRAY_*` environment variables; see `ServerConfig`.
///
/// Run with:
///   cargo run --bin server --release

mod handlers;
mod routes;
mod state;
mod util;

#[cfg(test)]
mod test_support;

use std::process::ExitCode;
use std::sync::Arc;

use tiny_http::Server;
use tracing_subscriber::EnvFilter;

use xray_diagnosis::config::{default_log_filter, APP_NAME, APP_VERSION};
use xray_diagnosis::db::{open_database, purge_expired_sessions};
use xray_diagnosis::{Classifier, ServerConfig};

use state::AppState;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_log_filter())))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server failed to start");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServerConfig::from_env()?;
    tracing::info!("{APP_NAME} starting v{APP_VERSION}");

    let conn = open_database(&config.database_path)?;
    let purged = purge_expired_sessions(&conn, chrono::Utc::now())?;
    tracing::info!(path = %config.database_path.display(), purged, "Database ready");

    // Loaded once; every request thread shares it read-only.
    let classifier = Arc::new(Classifier::load(&config.model_path)?);

    std::fs::create_dir_all(&config.media_root)?;
    let server = Server::http(&config.bind_addr)?;

    println!("╔══════════════════════════════════════════════╗");
    println!("║          X-ray Diagnosis API                 ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Listening on http://{:<24}║", config.bind_addr);
    println!("╚══════════════════════════════════════════════╝");

    let state = Arc::new(AppState::new(config, conn, classifier));

    // Each request is dispatched on its own thread so a slow inference does
    // not stall other clients.
    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        std::thread::spawn(move || {
            routes::dispatch(request, state);
        });
    }
    Ok(())
}
