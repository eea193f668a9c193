use cogniread_config::LoggingConfig;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::EnvFilter;

pub type TracingInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Install the global tracing subscriber from configuration.
///
/// `RUST_LOG` overrides `logging.level`. Fails if a subscriber is already set.
pub fn install_tracing_from_config(cfg: &LoggingConfig) -> Result<(), TracingInitError> {
    let env_filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.level.clone());
    let env_filter = EnvFilter::new(&env_filter_str);

    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_timer(ChronoUtc::rfc_3339())
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_timer(ChronoUtc::rfc_3339())
            .try_init()
    }
}
