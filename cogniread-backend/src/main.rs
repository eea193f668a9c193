//! CogniRead API server
//!
//! Loads configuration, connects to the broker and serves the HTTP API.
//! With a `memory://` broker the worker runs inside this process, since no
//! other process can reach the queue.

use std::sync::Arc;

use clap::Parser;
use cogniread_backend::cli::CliArgs;
use cogniread_backend::shutdown::cancel_on_signal;
use cogniread_backend::startup::{
    bind, build_state, build_worker, connect_broker, load_startup_config, log_config_summary,
    serve,
};
use cogniread_backend::tracing_setup::install_tracing_from_config;
use cogniread_job_queue::is_in_process;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let config = load_startup_config(args.config_path.as_deref())?;
    install_tracing_from_config(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to install tracing: {e}"))?;
    log_config_summary(&config, "api");

    let connection = connect_broker(&config)?;
    let shutdown = CancellationToken::new();

    let embedded_worker = if is_in_process(&config.queue.broker_url) {
        tracing::warn!("in-process broker selected; running an embedded worker");
        let worker = build_worker(&config, connection.clone());
        let token = shutdown.clone();
        Some(tokio::spawn(async move { worker.run(token).await }))
    } else {
        None
    };

    let state = build_state(&config, connection)?;
    let app = cogniread_backend::build_router(Arc::new(state));

    let listener = bind(&config.server.host, config.server.port).await?;
    let signal = cancel_on_signal(shutdown.clone());

    let served = serve(listener, app, shutdown.clone()).await;
    shutdown.cancel();
    signal.await?;

    if let Some(worker) = embedded_worker {
        worker.await??;
    }
    served?;

    tracing::info!("api stopped");
    Ok(())
}
