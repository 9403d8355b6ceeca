use core::fmt::{Debug, Display};
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "gift-exchange.toml";
pub const ENV_PREFIX: &str = "GIFT_EXCHANGE_";

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Independent randomized attempts before a draw is reported as infeasible.
    pub max_attempts: u32,
    /// Tentative pairings a single attempt may try before it is abandoned.
    pub step_limit: Option<u64>,
    /// Seed for reproducible draws. Draws are seeded from system entropy without it.
    pub seed: Option<u64>,
    /// `tracing_subscriber::EnvFilter` directives, used when `RUST_LOG` is not set.
    pub log_filter: Option<String>,
    pub roster_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            step_limit: None,
            seed: None,
            log_filter: None,
            roster_file: None,
        }
    }
}

#[derive(thiserror::Error)]
pub enum ConfigError {
    #[error("config error: {0}")]
    Figment(#[from] figment::Error),
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
}

impl Debug for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Config {
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(self)
    }
}

pub fn figment_from(path: impl AsRef<Path>) -> Figment {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

pub fn get_config() -> Result<Config, ConfigError> {
    get_config_from(CONFIG_FILE)
}

pub fn get_config_from(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    figment_from(path).extract::<Config>()?.validate()
}
