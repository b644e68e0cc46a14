mod logging;
mod routes;
mod settings;

use std::sync::Arc;

use anyhow::Context;
use engine_logging::{engine_info, engine_warn};
use feedpost_core::SharedRunState;
use feedpost_engine::{
    BridgeSettings, EngineHandle, ExtractSettings, HttpPlatformClient, LoopDeps, StateStore,
    WebContentSource,
};

use crate::logging::LogDestination;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_file = Settings::log_file_from_env();
    let destination = match log_file.as_deref() {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    let log_buffer = logging::initialize(destination);
    let settings = Settings::from_env();

    let platform = HttpPlatformClient::new(&settings.platform_api_url, BridgeSettings::default())
        .context("invalid PLATFORM_API_URL")?;
    let deps = LoopDeps {
        source: Arc::new(WebContentSource::new(ExtractSettings::default())),
        platform: Arc::new(platform),
        store: StateStore::new(settings.store.clone()),
        run_state: SharedRunState::new(),
    };
    let engine = Arc::new(EngineHandle::new(settings.engine_config(), deps, log_buffer));

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    engine_info!("Control surface listening on {}", settings.bind_addr);

    axum::serve(listener, routes::router(engine.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("control surface failed")?;

    engine.stop();
    let worker = engine.clone();
    if tokio::task::spawn_blocking(move || worker.join()).await.is_err() {
        engine_warn!("Worker did not shut down cleanly");
    }
    engine_info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        engine_warn!("Could not listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
}
