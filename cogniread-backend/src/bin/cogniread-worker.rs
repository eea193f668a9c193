//! CogniRead worker
//!
//! Consumes the configured queue and runs `worker.process_text` jobs, with a
//! liveness endpoint on `worker.host:worker.health_port`. SIGINT/SIGTERM stop
//! intake; in-flight jobs finish before exit.

use clap::Parser;
use cogniread_backend::build_health_router;
use cogniread_backend::cli::CliArgs;
use cogniread_backend::shutdown::cancel_on_signal;
use cogniread_backend::startup::{
    bind, build_worker, connect_broker, load_startup_config, log_config_summary, serve,
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
    log_config_summary(&config, "worker");

    if is_in_process(&config.queue.broker_url) {
        tracing::warn!(
            "in-process broker selected; this worker only sees jobs from its own process"
        );
    }

    let connection = connect_broker(&config)?;
    let worker = build_worker(&config, connection);

    let shutdown = CancellationToken::new();
    let listener = bind(&config.worker.host, config.worker.health_port).await?;
    let health = tokio::spawn(serve(listener, build_health_router(), shutdown.clone()));
    let signal = cancel_on_signal(shutdown.clone());

    let ran = worker.run(shutdown.clone()).await;
    shutdown.cancel();
    signal.await?;
    health.await??;
    ran?;

    tracing::info!("worker stopped");
    Ok(())
}
