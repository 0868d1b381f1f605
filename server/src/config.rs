use std::path::PathBuf;

use crate::server::DEFAULT_OUTBOX_CAPACITY;

pub const BIND_ADDRESS_VAR: &str = "DRAW_BIND_ADDRESS";
pub const DATA_FILE_VAR: &str = "DRAW_DATA_FILE";
pub const ALLOWED_ORIGINS_VAR: &str = "DRAW_ALLOWED_ORIGINS";
pub const OUTBOX_CAPACITY_VAR: &str = "DRAW_OUTBOX_CAPACITY";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
];

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_address: String,
    /// `None` keeps diagrams in memory only.
    pub data_file: Option<PathBuf>,
    pub allowed_origins: Vec<String>,
    pub outbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.into(),
            data_file: None,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|&s| s.into()).collect(),
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(bind_address) = lookup(BIND_ADDRESS_VAR) {
            if bind_address.trim().is_empty() {
                return Err(ConfigError::Empty(BIND_ADDRESS_VAR));
            }
            config.bind_address = bind_address.trim().into();
        }

        config.data_file = lookup(DATA_FILE_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        if let Some(origins) = lookup(ALLOWED_ORIGINS_VAR) {
            config.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(value) = lookup(OUTBOX_CAPACITY_VAR) {
            config.outbox_capacity = match value.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: OUTBOX_CAPACITY_VAR,
                        value,
                    })
                }
            };
        }

        Ok(config)
    }
}
