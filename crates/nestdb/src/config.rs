//! Store configuration.

use std::path::PathBuf;
use std::time::Duration;

use nestdb_storage::backends::RedbConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Configuration for a [`Store`](crate::Store).
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use nestdb::Config;
///
/// let config = Config::new("/var/lib/app/app.db")
///     .request_timeout(Duration::from_secs(5))
///     .cache_size(64 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Location of the database file.
    pub db_path: PathBuf,

    /// How long `open` waits for another handle to release the database file.
    /// Zero means no waiting.
    #[serde(rename = "request_timeout_in_seconds", with = "duration_secs", default)]
    pub request_timeout: Duration,

    /// Page cache size in bytes; the engine default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,
}

impl Config {
    /// Create a configuration for the database file at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self { db_path: db_path.into(), ..Self::default() }
    }

    /// Set the lock wait timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the cache size.
    #[must_use]
    pub const fn cache_size(mut self, size: usize) -> Self {
        self.cache_size = Some(size);
        self
    }

    /// Check that the configuration can be used to open a store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no database path is set.
    pub fn validate(&self) -> Result<()> {
        if self.db_path.as_os_str().is_empty() {
            return Err(Error::Config("store path not set".into()));
        }
        Ok(())
    }

    pub(crate) fn engine_config(&self) -> RedbConfig {
        let config = RedbConfig::new().lock_timeout(self.request_timeout);
        match self.cache_size {
            Some(size) => config.cache_size(size),
            None => config,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
