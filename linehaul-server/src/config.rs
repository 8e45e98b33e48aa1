//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cache::MileageCacheConfig;
use crate::dispatch::CoordinatorConfig;

pub const BIND_VAR: &str = "LINEHAUL_BIND";
pub const SEED_VAR: &str = "LINEHAUL_SEED";
pub const ATTEMPTS_VAR: &str = "LINEHAUL_MAX_ALLOCATION_ATTEMPTS";

const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is not a socket address")]
    InvalidBind { var: &'static str, value: String },

    #[error("{var}={value:?} must be a positive integer")]
    InvalidAttempts { var: &'static str, value: String },
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// JSON snapshot to seed the store from. An empty store otherwise.
    pub seed: Option<PathBuf>,

    pub coordinator: CoordinatorConfig,

    pub mileage_cache: MileageCacheConfig,
}

impl ServerConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read through `lookup`, which returns a variable's value if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = match lookup(BIND_VAR) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidBind {
                var: BIND_VAR,
                value,
            })?,
            None => DEFAULT_BIND.parse().map_err(|_| ConfigError::InvalidBind {
                var: BIND_VAR,
                value: DEFAULT_BIND.to_string(),
            })?,
        };

        let seed = lookup(SEED_VAR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        let mut coordinator = CoordinatorConfig::default();
        if let Some(value) = lookup(ATTEMPTS_VAR) {
            coordinator.max_allocation_attempts = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidAttempts {
                        var: ATTEMPTS_VAR,
                        value,
                    });
                }
            };
        }

        Ok(Self {
            bind,
            seed,
            coordinator,
            mileage_cache: MileageCacheConfig::default(),
        })
    }
}
