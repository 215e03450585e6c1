//! Proceso worker: dispatcher, realtime y profiling sobre las colas de la DB.

use std::time::Duration;

use anyhow::Result;
use dotenv::dotenv;
use tokio::sync::watch;

use astro_engine::config::app_config::AppConfig;
use astro_engine::db::setup_database;
use astro_engine::logger::init_logger;
use astro_engine::services::{build_ai_clients, Services};
use astro_engine::worker::Worker;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logger();

    let config = AppConfig::from_env()?;
    let db_pool = setup_database(&config.database_url).await?;
    let services = Services::build(db_pool, &config, build_ai_clients(&config));

    let worker = Worker::new(
        services,
        Duration::from_secs(config.poll_interval_secs),
        config.enable_profiling_worker,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = worker.spawn(shutdown_rx);
    log::info!("Worker process started with {} loops.", handles.len());

    wait_for_shutdown().await;
    log::info!("Shutdown signal received. Stopping worker loops...");
    let _ = shutdown_tx.send(true);

    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            log::error!("Worker loop terminated abnormally: {:?}", e);
        }
    }
    log::info!("Worker process stopped.");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            log::warn!("Could not install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}
