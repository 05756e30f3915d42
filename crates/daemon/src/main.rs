//! Extracta - Main Entry Point
//! Job registry + single-flight worker + JSON-RPC server (HTTP and WebSocket)

mod config;

use anyhow::Result;
use config::{DaemonConfig, LogFormat};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use extracta_api_rpc::{RpcServer, RpcServerConfig};
use extracta_core::application::constants::WORKER_SHUTDOWN_GRACE;
use extracta_core::application::{
    job_queue, shutdown_channel, ExtractorRegistry, InMemoryJobStore, JobRegistry,
    RunOrchestrator, Worker,
};
use extracta_core::port::id_provider::UuidProvider;
use extracta_core::port::time_provider::SystemTimeProvider;
use extracta_core::port::{NoopPersister, ResultPersister};
use extracta_infra_web::{register_builtin, HttpContextProvider, HttpResultForwarder};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global subscriber. The returned guard flushes the file sink on drop.
fn init_logging(config: &DaemonConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("extracta=info"))?;

    let console = match config.log_format {
        // Production: JSON structured logging
        LogFormat::Json => fmt::layer().json().boxed(),
        // Development: Pretty formatting with colors
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
    };

    let (file, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "extracta.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let config = DaemonConfig::from_env()?;
    let _log_guard = init_logging(&config)?;

    info!("Extracta v{} starting...", VERSION);

    // 2. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let store = Arc::new(InMemoryJobStore::new());
    let (queue_tx, queue_rx) = job_queue();

    let mut extractors = ExtractorRegistry::new();
    register_builtin(&mut extractors);
    info!(extractors = ?extractors.entries(), "Extractors registered");

    let contexts = Arc::new(match &config.user_agent {
        Some(agent) => HttpContextProvider::new(agent.clone()),
        None => HttpContextProvider::default(),
    });

    let orchestrator = Arc::new(RunOrchestrator::new(
        Arc::new(extractors),
        contexts,
        id_provider.clone(),
        time_provider.clone(),
        config.orchestrator.clone(),
    ));

    let persister: Arc<dyn ResultPersister> = match &config.persist_url {
        Some(url) => Arc::new(
            HttpResultForwarder::new(url.clone(), config.persist_timeout)
                .map_err(|e| anyhow::anyhow!("Result forwarder setup failed: {}", e))?,
        ),
        None => {
            info!("No persistence endpoint configured, results stay in memory");
            Arc::new(NoopPersister)
        }
    };

    let registry = Arc::new(JobRegistry::new(
        store.clone(),
        queue_tx,
        id_provider,
        time_provider.clone(),
    ));

    // 3. Start Worker (job processing loop)
    info!("Starting worker...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker = Worker::new(
        queue_rx,
        store,
        orchestrator.clone(),
        persister,
        time_provider,
    );
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(shutdown_rx).await {
            tracing::error!(error = ?e, "Worker failed");
        }
    });

    // 4. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_config = RpcServerConfig {
        host: config.rpc_host.clone(),
        port: config.rpc_port,
        cancel_on_disconnect: config.cancel_on_disconnect,
    };
    let (rpc_handle, addr) = RpcServer::new(rpc_config, registry, orchestrator)
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %addr, "System ready. Waiting for jobs...");
    info!("Press Ctrl+C to shutdown");

    // 5. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting gracefully...");

    // 6. Graceful shutdown: stop accepting calls, then let the in-flight job finish
    if let Err(e) = rpc_handle.stop() {
        warn!(error = %e, "RPC server was already stopped");
    }
    shutdown_tx.raise();
    if tokio::time::timeout(WORKER_SHUTDOWN_GRACE, worker_handle)
        .await
        .is_err()
    {
        warn!(
            grace_ms = WORKER_SHUTDOWN_GRACE.as_millis() as u64,
            "Worker did not stop in time, abandoning in-flight job"
        );
    }

    info!("Shutdown complete.");
    Ok(())
}
