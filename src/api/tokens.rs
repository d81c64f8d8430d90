//! Access token storage.
//!
//! The gateway reads the token through the `TokenStore` trait on every
//! authenticated request and evicts it on a 401. Login writes it, logout
//! deletes it. At most one token is held per store, under a fixed key.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::Engine;
use keyring::Entry;
use serde::Deserialize;
use thiserror::Error;
use zeroize::Zeroize;

/// Keychain service name for the keyring-backed store.
const SERVICE_NAME: &str = "drivium";

/// Fixed key the token is stored under.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Token store operation failed: {0}")]
    OperationFailed(String),

    #[error("Token file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl From<keyring::Error> for TokenStoreError {
    fn from(err: keyring::Error) -> Self {
        TokenStoreError::OperationFailed(err.to_string())
    }
}

/// Get/set/clear access to the single stored access token.
///
/// Implementations must be shareable across tasks; the gateway holds one
/// behind an `Arc<dyn TokenStore>`.
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` if nothing is stored.
    fn get(&self) -> Result<Option<String>, TokenStoreError>;

    /// Overwrite the stored token.
    fn set(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Delete the stored token. Idempotent.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// In-process token store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a token.
    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

fn poisoned<T>(_: T) -> TokenStoreError {
    TokenStoreError::OperationFailed("token lock poisoned".to_string())
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self.token.read().map_err(poisoned)?.clone())
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        let mut guard = self.token.write().map_err(poisoned)?;
        if let Some(ref mut old) = *guard {
            old.zeroize();
        }
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        let mut guard = self.token.write().map_err(poisoned)?;
        if let Some(ref mut old) = *guard {
            old.zeroize();
        }
        *guard = None;
        Ok(())
    }
}

/// Token persisted as a single file, by default
/// `<config dir>/drivium/access_token`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default token file location under the user's config directory.
    pub fn default_location() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(SERVICE_NAME).join(ACCESS_TOKEN_KEY))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Result<Option<String>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a pre-existing file too
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(token.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()), // Already gone
            Err(e) => Err(e.into()),
        }
    }
}

/// Token held in the OS keychain (service `drivium`, user `access_token`).
#[derive(Default)]
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self
    }

    /// Whether this build has a persistent keychain backend. Only the Apple
    /// keychain is compiled in; elsewhere keyring would fall back to an
    /// in-process mock that forgets every entry.
    pub const fn is_supported() -> bool {
        cfg!(any(target_os = "macos", target_os = "ios"))
    }

    fn entry(&self) -> Result<Entry, TokenStoreError> {
        Ok(Entry::new(SERVICE_NAME, ACCESS_TOKEN_KEY)?)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Result<Option<String>, TokenStoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TokenStoreError::from(e)),
        }
    }

    fn set(&self, token: &str) -> Result<(), TokenStoreError> {
        self.entry()?.set_password(token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(TokenStoreError::from(e)),
        }
    }
}

/// Claims carried by a Drivium access token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenClaims {
    pub username: Option<String>,
    pub user_id: Option<i64>,
    /// Expiry as a Unix timestamp in seconds.
    pub exp: Option<i64>,
}

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("Invalid JWT format")]
    Malformed,

    #[error("Failed to decode JWT payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Failed to parse JWT payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload of a JWT access token without verifying it.
///
/// For display only; the server remains the authority on validity.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(ClaimsError::Malformed);
    }

    let payload = parts[1].trim_end_matches('=');
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload)?;
    Ok(serde_json::from_slice(&decoded)?)
}
