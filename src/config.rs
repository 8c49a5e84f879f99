use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use thiserror::Error;

use crate::debounce;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Runtime settings read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub debounce_window: Duration,
    pub rate_limit_burst: NonZeroU32,
    pub rate_limit_window: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            debounce_window: debounce::DEFAULT_WINDOW,
            rate_limit_burst: NonZeroU32::new(30).unwrap_or(NonZeroU32::MIN),
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    #[tracing::instrument(name = "load_config")]
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            tracing::warn!(error = %err, "Ignoring unreadable .env file");
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("APP_BIND_ADDR") {
            Some(value) => value.trim().parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
                name: "APP_BIND_ADDR",
                value,
                reason: "expected host:port",
            })?,
            None => defaults.bind_addr,
        };

        let debounce_window = match lookup("DEBOUNCE_WINDOW_MS") {
            Some(value) => Duration::from_millis(parse_positive("DEBOUNCE_WINDOW_MS", value)?),
            None => defaults.debounce_window,
        };

        let rate_limit_burst = match lookup("RATE_LIMIT_BURST") {
            Some(value) => {
                let parsed = parse_positive("RATE_LIMIT_BURST", value.clone())?;
                u32::try_from(parsed)
                    .ok()
                    .and_then(NonZeroU32::new)
                    .ok_or(ConfigError::Invalid {
                        name: "RATE_LIMIT_BURST",
                        value,
                        reason: "must fit in 32 bits",
                    })?
            }
            None => defaults.rate_limit_burst,
        };

        let rate_limit_window = match lookup("RATE_LIMIT_WINDOW_SECS") {
            Some(value) => Duration::from_secs(parse_positive("RATE_LIMIT_WINDOW_SECS", value)?),
            None => defaults.rate_limit_window,
        };

        let config = Self {
            bind_addr,
            debounce_window,
            rate_limit_burst,
            rate_limit_window,
        };

        tracing::debug!(
            bind_addr = %config.bind_addr,
            debounce_window_ms = config.debounce_window.as_millis() as u64,
            rate_limit_burst = config.rate_limit_burst.get(),
            rate_limit_window_secs = config.rate_limit_window.as_secs(),
            "Configuration loaded"
        );

        Ok(config)
    }
}

fn parse_positive(name: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::Invalid {
            name,
            value,
            reason: "expected a positive integer",
        }),
    }
}
