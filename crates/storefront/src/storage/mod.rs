//! Session storage for persisted client state.
//!
//! A small key/value seam standing in for browser session storage. Each key
//! holds one JSON document. Two backends are provided:
//!
//! - [`FileStorage`] - one file per key under a directory (CLI sessions)
//! - [`MemoryStorage`] - process memory (tests, ephemeral sessions)
//!
//! Every write is a scoped acquisition: open, write, release. Nothing is
//! batched or held open between calls.

mod file;
mod memory;

use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Well-known storage keys.
pub mod keys {
    /// Persisted cart record.
    pub const CART: &str = "ryj_cart";

    /// Bearer token of the logged-in user.
    pub const TOKEN: &str = "ryj_token";

    /// Profile of the logged-in user.
    pub const USER: &str = "ryj_user";
}

/// Errors that can occur when reading or writing session storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that are not allowed.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Stored record could not be decoded.
    #[error("Corrupt record under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Value could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Key/value storage scoped to a storefront session.
pub trait SessionStorage: Send + Sync {
    /// Read the raw value under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON record.
///
/// # Errors
///
/// Returns [`StorageError::Corrupt`] if the record is not valid JSON for `T`,
/// or any backend read error.
pub fn load_json<T>(storage: &dyn SessionStorage, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
{
    let Some(raw) = storage.read(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Corrupt {
            key: key.to_string(),
            source,
        })
}

/// Encode and write a JSON record.
///
/// # Errors
///
/// Returns an error if encoding or the backend write fails.
pub fn save_json<T>(storage: &dyn SessionStorage, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    storage.write(key, &raw)
}

/// Keys map to file names, so only a conservative alphabet is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
