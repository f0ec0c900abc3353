//! Session configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{StoreError, StoreResult};

/// File name used when no database path is configured.
pub const DEFAULT_DATABASE_NAME: &str = "chatkit-database.db";

pub const DEFAULT_IDENTITY_CACHE_CAPACITY: usize = 1024;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Where the session keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseTarget {
    InMemory,
    File { path: PathBuf },
}

/// Options for [`Session::open`](crate::Session::open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub database: DatabaseTarget,
    /// Maximum number of rows kept in the identity cache.
    pub identity_cache_capacity: usize,
    /// How long SQLite waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            database: DatabaseTarget::File {
                path: PathBuf::from(DEFAULT_DATABASE_NAME),
            },
            identity_cache_capacity: DEFAULT_IDENTITY_CACHE_CAPACITY,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

impl SessionConfig {
    /// In-memory database (for testing).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseTarget::InMemory,
            ..Self::default()
        }
    }

    /// Database file at `path`.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseTarget::File { path: path.into() },
            ..Self::default()
        }
    }

    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.identity_cache_capacity == 0 {
            return Err(StoreError::Config(
                "identity_cache_capacity must be greater than zero".into(),
            ));
        }
        if let DatabaseTarget::File { path } = &self.database
            && path.as_os_str().is_empty()
        {
            return Err(StoreError::Config("database path is empty".into()));
        }
        Ok(())
    }
}
