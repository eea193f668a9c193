//! Startup steps shared by the API and worker binaries.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use cogniread_config::Config;
use cogniread_embeddings::Embedder;
use cogniread_job_queue::{connect, ConnectOptions, Connection, JobQueueClient, Worker};
use cogniread_jobs::register_all_executors;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

/// Load and validate configuration. Any problem aborts startup.
pub fn load_startup_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = cogniread_config::load_config(path).context("failed to load configuration")?;
    cogniread_config::validate_config(&config).context("invalid configuration")?;
    Ok(config)
}

/// Log the resolved settings once the subscriber is installed.
pub fn log_config_summary(config: &Config, component: &str) {
    tracing::info!(
        component,
        broker_url = %config.queue.broker_url,
        queue = %config.queue.name,
        result_ttl_secs = config.queue.result_ttl_secs,
        embeddings_dim = config.embeddings.dim,
        worker_concurrency = config.worker.concurrency,
        "configuration loaded"
    );
}

pub fn connect_options(config: &Config) -> ConnectOptions {
    ConnectOptions {
        result_ttl: Duration::from_secs(config.queue.result_ttl_secs),
        poll_interval: Duration::from_millis(config.worker.poll_interval_ms),
    }
}

/// Open the broker and result backend named by `queue.broker_url`.
pub fn connect_broker(config: &Config) -> anyhow::Result<Connection> {
    connect(&config.queue.broker_url, connect_options(config))
        .with_context(|| format!("failed to open broker {}", config.queue.broker_url))
}

/// Build the API state: the embedder and a client for the configured queue.
pub fn build_state(config: &Config, connection: Connection) -> anyhow::Result<AppState> {
    let embedder = Embedder::new(config.embeddings.dim).context("invalid embeddings.dim")?;
    let job_queue = JobQueueClient::new(config.queue.name.clone(), connection);
    Ok(AppState::new(embedder, job_queue))
}

/// Build a worker for the configured queue with every executor registered.
pub fn build_worker(config: &Config, connection: Connection) -> Worker {
    let mut worker = Worker::new(config.queue.name.clone(), connection)
        .with_concurrency(config.worker.concurrency);
    register_all_executors(&mut worker);
    worker
}

/// Bind `host:port`; hostnames are resolved.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))
}

/// Serve `router` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("http server failed")
}
