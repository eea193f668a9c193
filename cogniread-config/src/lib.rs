//! Configuration for the CogniRead API service and worker process.
//!
//! A [`Config`] is resolved once at startup from built-in defaults, an optional
//! config file and the process environment (in that order of precedence, lowest
//! first), then checked with [`validate_config`] before any listener is bound.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Pre-compiled regex for hostname validation (compiled once at first use)
static HOSTNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][-a-zA-Z0-9\.]*[a-zA-Z0-9]$").expect("hostname regex is valid")
});

/// Broker URL schemes understood by the job queue.
pub const SUPPORTED_BROKER_SCHEMES: &[&str] = &["redis", "memory"];

#[derive(Debug, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub worker: Option<WorkerSection>,
    #[serde(default)]
    pub queue: Option<QueueSection>,
    #[serde(default)]
    pub embeddings: Option<EmbeddingsSection>,
    #[serde(default)]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct WorkerSection {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub health_port: Option<u16>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct QueueSection {
    #[serde(default)]
    pub broker_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub result_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingsSection {
    #[serde(default)]
    pub dim: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: Option<bool>,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a RawConfigFile from a path. The format is inferred from the extension: .toml, .yaml/.yml, .json
pub fn load_raw_from_file<P: AsRef<Path>>(path: P) -> Result<RawConfigFile, ConfigError> {
    let path = path.as_ref();
    let s = fs::read_to_string(path)?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    parse_config_str(&s, ext.as_deref())
}

/// Parse configuration from a string with optional format hint
#[inline]
fn parse_config_str(s: &str, ext: Option<&str>) -> Result<RawConfigFile, ConfigError> {
    match ext {
        #[cfg(feature = "toml")]
        Some("toml") => toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        #[cfg(feature = "yaml")]
        Some("yaml" | "yml") => {
            serde_yaml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        #[cfg(feature = "json")]
        Some("json") => serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string())),
        _ => parse_config_auto(s),
    }
}

/// Try to parse config by attempting each enabled format
#[inline]
fn parse_config_auto(s: &str) -> Result<RawConfigFile, ConfigError> {
    #[cfg(feature = "toml")]
    if let Ok(cfg) = toml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "json")]
    if let Ok(cfg) = serde_json::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(feature = "yaml")]
    if let Ok(cfg) = serde_yaml::from_str(s) {
        return Ok(cfg);
    }

    #[cfg(any(feature = "yaml", feature = "toml", feature = "json"))]
    {
        Err(ConfigError::Parse(
            "failed to parse config as any supported format".into(),
        ))
    }

    #[cfg(not(any(feature = "yaml", feature = "toml", feature = "json")))]
    {
        let _ = s;
        Err(ConfigError::Parse("no config format enabled".into()))
    }
}

/// Concrete application configuration with defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub worker: WorkerConfig,
    pub queue: QueueConfig,
    pub embeddings: EmbeddingsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerConfig {
    pub host: String,
    pub health_port: u16,
    /// Jobs executed in parallel by one worker process.
    pub concurrency: usize,
    /// Idle wait between broker polls when the queue is empty.
    pub poll_interval_ms: u64,
}

/// Broker and result-backend settings shared by the API submitter and the worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueConfig {
    pub broker_url: String,
    pub name: String,
    pub result_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingsConfig {
    pub dim: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            worker: WorkerConfig {
                host: "0.0.0.0".to_string(),
                health_port: 8001,
                concurrency: 4,
                poll_interval_ms: 250,
            },
            queue: QueueConfig {
                broker_url: "redis://redis:6379/0".to_string(),
                name: "ai-tasks".to_string(),
                result_ttl_secs: 86_400,
            },
            embeddings: EmbeddingsConfig { dim: 16 },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

#[inline]
fn parse_bool(s: &str) -> Result<bool, ()> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        _ => Err(()),
    }
}

/// Helper macro to apply optional value if present
macro_rules! apply_opt {
    ($target:expr, $source:expr) => {
        if let Some(v) = $source {
            $target = v;
        }
    };
}

/// Load concrete `Config` from optional file and the process environment.
/// Environment variables take precedence over file values and defaults.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| env::var(key).ok())
}

/// Like [`load_config`], but environment values come from `lookup`.
pub fn load_config_with_env<P, F>(path: Option<P>, lookup: F) -> Result<Config, ConfigError>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = Config::default();

    if let Some(p) = path {
        apply_file(&mut cfg, load_raw_from_file(p)?);
    }

    apply_env_overrides(&mut cfg, &lookup)?;

    Ok(cfg)
}

fn apply_file(cfg: &mut Config, raw: RawConfigFile) {
    if let Some(server) = raw.server {
        apply_opt!(cfg.server.host, server.host);
        apply_opt!(cfg.server.port, server.port);
    }
    if let Some(worker) = raw.worker {
        apply_opt!(cfg.worker.host, worker.host);
        apply_opt!(cfg.worker.health_port, worker.health_port);
        apply_opt!(cfg.worker.concurrency, worker.concurrency);
        apply_opt!(cfg.worker.poll_interval_ms, worker.poll_interval_ms);
    }
    if let Some(queue) = raw.queue {
        apply_opt!(cfg.queue.broker_url, queue.broker_url);
        apply_opt!(cfg.queue.name, queue.name);
        apply_opt!(cfg.queue.result_ttl_secs, queue.result_ttl_secs);
    }
    if let Some(embeddings) = raw.embeddings {
        apply_opt!(cfg.embeddings.dim, embeddings.dim);
    }
    if let Some(logging) = raw.logging {
        apply_opt!(cfg.logging.level, logging.level);
        apply_opt!(cfg.logging.json, logging.json);
    }
}

/// Helper to parse an env value as a specific type
#[inline]
fn env_parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Parse(format!("invalid {}: {}", key, e))),
        None => Ok(None),
    }
}

/// Helper to parse an env value as bool
#[inline]
fn env_bool<F>(lookup: &F, key: &str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(v) => parse_bool(&v)
            .map(Some)
            .map_err(|_| ConfigError::Parse(format!("invalid {}", key))),
        None => Ok(None),
    }
}

/// Apply all environment variable overrides to config.
///
/// The short names used by the deployment manifests (`REDIS_URL`,
/// `AI_WORKER_QUEUE`, `EMBEDDINGS_DIM`, `LOG_LEVEL`, `PORT`) are read first so
/// the prefixed `COGNIREAD_*` names win when both are set.
fn apply_env_overrides<F>(cfg: &mut Config, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Deployment aliases
    if let Some(v) = lookup("REDIS_URL") {
        cfg.queue.broker_url = v;
    }
    if let Some(v) = lookup("AI_WORKER_QUEUE") {
        cfg.queue.name = v;
    }
    if let Some(v) = env_parse::<usize, _>(lookup, "EMBEDDINGS_DIM")? {
        cfg.embeddings.dim = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_parse::<u16, _>(lookup, "PORT")? {
        cfg.server.port = v;
    }

    // Server
    if let Some(v) = lookup("COGNIREAD_SERVER_HOST") {
        cfg.server.host = v;
    }
    if let Some(v) = env_parse::<u16, _>(lookup, "COGNIREAD_SERVER_PORT")? {
        cfg.server.port = v;
    }

    // Worker
    if let Some(v) = lookup("COGNIREAD_WORKER_HOST") {
        cfg.worker.host = v;
    }
    if let Some(v) = env_parse::<u16, _>(lookup, "COGNIREAD_WORKER_HEALTH_PORT")? {
        cfg.worker.health_port = v;
    }
    if let Some(v) = env_parse::<usize, _>(lookup, "COGNIREAD_WORKER_CONCURRENCY")? {
        cfg.worker.concurrency = v;
    }
    if let Some(v) = env_parse::<u64, _>(lookup, "COGNIREAD_WORKER_POLL_INTERVAL_MS")? {
        cfg.worker.poll_interval_ms = v;
    }

    // Queue
    if let Some(v) = lookup("COGNIREAD_BROKER_URL") {
        cfg.queue.broker_url = v;
    }
    if let Some(v) = lookup("COGNIREAD_QUEUE_NAME") {
        cfg.queue.name = v;
    }
    if let Some(v) = env_parse::<u64, _>(lookup, "COGNIREAD_RESULT_TTL_SECS")? {
        cfg.queue.result_ttl_secs = v;
    }

    // Embeddings
    if let Some(v) = env_parse::<usize, _>(lookup, "COGNIREAD_EMBEDDINGS_DIM")? {
        cfg.embeddings.dim = v;
    }

    // Logging
    if let Some(v) = lookup("COGNIREAD_LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env_bool(lookup, "COGNIREAD_LOG_JSON")? {
        cfg.logging.json = v;
    }

    Ok(())
}

fn validate_host(field: &str, host: &str) -> Result<(), ConfigError> {
    let host_ok = host.parse::<std::net::IpAddr>().is_ok() || HOSTNAME_REGEX.is_match(host);
    if !host_ok {
        return Err(ConfigError::Validation(format!(
            "invalid {}: {}",
            field, host
        )));
    }
    Ok(())
}

/// Validate higher-level constraints on the resolved configuration.
pub fn validate_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.server.port == 0 {
        return Err(ConfigError::Validation("server.port must be > 0".into()));
    }
    validate_host("server.host", &cfg.server.host)?;

    if cfg.worker.health_port == 0 {
        return Err(ConfigError::Validation(
            "worker.health_port must be > 0".into(),
        ));
    }
    validate_host("worker.host", &cfg.worker.host)?;
    if cfg.worker.concurrency == 0 {
        return Err(ConfigError::Validation(
            "worker.concurrency must be at least 1".into(),
        ));
    }
    if cfg.worker.poll_interval_ms == 0 {
        return Err(ConfigError::Validation(
            "worker.poll_interval_ms must be at least 1".into(),
        ));
    }

    if cfg.embeddings.dim == 0 {
        return Err(ConfigError::Validation(
            "embeddings.dim must be a positive integer".into(),
        ));
    }

    if cfg.queue.name.trim().is_empty() {
        return Err(ConfigError::Validation("queue.name must not be empty".into()));
    }
    if cfg.queue.result_ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "queue.result_ttl_secs must be at least 1".into(),
        ));
    }
    match url::Url::parse(&cfg.queue.broker_url) {
        Ok(u) => {
            if !SUPPORTED_BROKER_SCHEMES.contains(&u.scheme()) {
                return Err(ConfigError::Validation(format!(
                    "unsupported broker scheme: {}",
                    u.scheme()
                )));
            }
        }
        Err(_) => {
            return Err(ConfigError::Validation(format!(
                "invalid queue.broker_url: {}",
                cfg.queue.broker_url
            )))
        }
    }

    Ok(())
}
