//! Docling conversion service
//!
//! Entry point for the docling-service server: configuration loading, worker
//! pool startup, HTTP serving and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docling_job_queue::JobQueueClient;
use docling_jobs::{register_all_executors, ConversionExecutor};
use docling_store::{FsConversionStore, FsInputStore};
use tokio::net::TcpListener;

use docling_service::state::AppState;

mod cli;
mod config_helpers;
mod tracing_setup;

use cli::CliArgs;
use config_helpers::{
    converter_from_config, notifier_from_config, parse_bind_address, worker_pool_from_config,
};
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = docling_config::load_config(args.config_path.as_deref())
        .context("failed to load configuration")?;
    docling_config::validate_config(&config).context("invalid configuration")?;
    install_tracing_from_config(&config.logging);
    tracing::info!(config_path = ?args.config_path, "configuration loaded");

    let inputs = Arc::new(
        FsInputStore::open(&config.storage.input_dir)
            .with_context(|| format!("cannot open input dir {}", config.storage.input_dir))?,
    );
    let artifacts = Arc::new(
        FsConversionStore::open(&config.storage.output_dir)
            .with_context(|| format!("cannot open output dir {}", config.storage.output_dir))?,
    );
    tracing::info!(
        input_dir = %config.storage.input_dir,
        output_dir = %config.storage.output_dir,
        backend_url = %config.backend.url,
        converter = %config.converter.kind,
        "storage and backend configuration"
    );

    let converter = converter_from_config(&config.converter)?;
    let notifier = notifier_from_config(&config.backend)?;
    let executor = ConversionExecutor::new(converter, artifacts.clone(), notifier)
        .with_timeout(Duration::from_secs(config.jobs.conversion_timeout_secs));

    let job_queue = JobQueueClient::new();
    register_all_executors(&job_queue, executor).await;
    let workers = job_queue
        .start(worker_pool_from_config(&config.jobs))
        .await?;

    let state = Arc::new(AppState::new(inputs, artifacts, job_queue.clone()));
    let app = docling_service::build_router_with_config(state, &config);

    let addr = parse_bind_address(&config.server.host, config.server.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "docling service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("http server stopped, waiting for queued conversions");
    job_queue.shutdown().await;
    if let Err(e) = workers.await {
        tracing::error!(error = %e, "job worker pool terminated abnormally");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
