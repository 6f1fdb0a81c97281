pub mod types;
pub mod config;
pub mod characters;
pub mod patch;
pub mod session;
pub mod store;
pub mod server;

use session::EditSession;
use store::StateStore;
use types::*;

use std::{
    fs,
    sync::{Arc, Mutex},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

// ── Entry point ────────────────────────────────────────────────────────

pub async fn run() {
    config::load_env_file();

    // Tracing goes to a daily-rolled file under logs/
    let logs_dir = config::repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Melee Overlay Control starting");

    let app_config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; falling back to defaults");
            config::apply_env_overrides(AppConfig::default())
        }
    };

    let overlay_dir = config::resolve_repo_path(&app_config.overlay_dir);
    fs::create_dir_all(&overlay_dir).ok();

    let store = Arc::new(StateStore::from_config(&app_config));
    let mut session = EditSession::new();
    match store.load() {
        Ok(state) => session.install(state),
        Err(e) => error!("{e}; editing is unavailable until a reload succeeds"),
    }
    let session: SharedSession = Arc::new(Mutex::new(session));

    info!("serving overlay dir {}", overlay_dir.display());
    info!("state file {}", store.state_path().display());

    let server_state = OverlayServerState { session, store };
    server::start_overlay_server(server_state, overlay_dir, &app_config.bind_addr).await;
}
