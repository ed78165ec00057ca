//! Configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > warden.toml > defaults

use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Maximum number of guarded attempts before the final unguarded call.
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Longest server-suggested wait the retry driver will honour.
pub const DEFAULT_MAX_WAIT_MS: u64 = 5_000;

/// Get the global configuration, if [`init`] has run.
pub fn get() -> Option<&'static AppConfig> {
    CONFIG.get()
}

/// Initialize the global configuration from environment.
///
/// Should be called once at startup. Later calls return the first loaded value.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    let app_config = load()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

/// Build a fresh configuration without touching the global.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("retry.max_retries", i64::from(DEFAULT_MAX_RETRIES))?
        .set_default("retry.max_wait_ms", DEFAULT_MAX_WAIT_MS as i64)?
        .set_default("log.filter", "warden=info")?
        // Optional config file
        .add_source(config::File::with_name("warden").required(false))
        // Environment variables (WARDEN__RETRY__MAX_RETRIES, WARDEN__LOG__FILTER, etc.)
        .add_source(
            config::Environment::with_prefix("WARDEN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    tracing::debug!(?app_config, "configuration loaded");
    Ok(app_config)
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    pub retry: RetryConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Guarded attempts before the final unguarded call
    pub max_retries: u32,
    /// Longest rate-limit wait (milliseconds) that is waited out instead of propagated
    pub max_wait_ms: u64,
}

impl RetryConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, max_wait_ms: DEFAULT_MAX_WAIT_MS }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing_subscriber` env-filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "warden=info".to_owned() }
    }
}
