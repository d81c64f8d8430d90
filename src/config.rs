//! Runtime configuration resolved from the environment.
//!
//! API base URL: DRIVIUM_API_URL > VITE_API_URL (shared with the web app's
//! `.env`) > `http://localhost:8000`.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::api::tokens::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Unknown token store {0:?} (expected file, keyring or memory)")]
    UnknownTokenStore(String),

    #[error("No config directory available for the token file")]
    NoConfigDir,

    #[error("The keyring token store is not available on this platform (use file or memory)")]
    KeyringUnavailable,
}

/// Where the access token is persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for TokenStoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" | "keychain" => Ok(TokenStoreKind::Keyring),
            "memory" => Ok(TokenStoreKind::Memory),
            _ => Err(ConfigError::UnknownTokenStore(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub token_store: TokenStoreKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            token_store: TokenStoreKind::default(),
        }
    }
}

impl Config {
    /// Resolve configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("DRIVIUM_API_URL")
            .or_else(|| lookup("VITE_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout = secs_var(&lookup, "DRIVIUM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let connect_timeout = secs_var(
            &lookup,
            "DRIVIUM_CONNECT_TIMEOUT_SECS",
            DEFAULT_CONNECT_TIMEOUT_SECS,
        )?;

        let token_store = match lookup("DRIVIUM_TOKEN_STORE") {
            Some(value) => value.parse()?,
            None => TokenStoreKind::default(),
        };

        Ok(Self {
            api_base_url,
            timeout,
            connect_timeout,
            token_store,
        })
    }

    /// Build the token store selected by `token_store`.
    pub fn open_token_store(&self) -> Result<Arc<dyn TokenStore>, ConfigError> {
        Ok(match self.token_store {
            TokenStoreKind::File => {
                let path = FileTokenStore::default_location().ok_or(ConfigError::NoConfigDir)?;
                log::debug!("Using token file {}", path.display());
                Arc::new(FileTokenStore::new(path))
            }
            TokenStoreKind::Keyring => {
                if !KeyringTokenStore::is_supported() {
                    return Err(ConfigError::KeyringUnavailable);
                }
                Arc::new(KeyringTokenStore::new())
            }
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        })
    }
}

fn secs_var<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(Duration::from_secs(default)),
    }
}
