//! Application configuration loaded from environment variables.

use std::time::Duration;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `CACHE_TTL_SECS` — read cache TTL (default: `60`)
/// - `PAYMENT_MAX_ATTEMPTS` — payment retry cap (default: `5`)
/// - `PAYMENT_BASE_DELAY_MS` — first backoff tier (default: `200`)
/// - `PAYMENT_FAILURE_RATE` — simulated gateway failure rate (default: `0.3`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub cache_ttl: Duration,
    pub payment_max_attempts: u32,
    pub payment_base_delay: Duration,
    pub payment_failure_rate: f64,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parsed("PORT", 3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            cache_ttl: Duration::from_secs(env_parsed("CACHE_TTL_SECS", 60)),
            payment_max_attempts: env_parsed("PAYMENT_MAX_ATTEMPTS", 5),
            payment_base_delay: Duration::from_millis(env_parsed("PAYMENT_BASE_DELAY_MS", 200)),
            payment_failure_rate: env_parsed("PAYMENT_FAILURE_RATE", 0.3),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            cache_ttl: Duration::from_secs(60),
            payment_max_attempts: 5,
            payment_base_delay: Duration::from_millis(200),
            payment_failure_rate: 0.3,
        }
    }
}
