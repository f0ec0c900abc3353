//! Error types for the store layer.

use chatkit_model::{ConstructionError, EntityKind, ModelError};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration could not be parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed query or call; raised before storage is touched.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The entity factory could not produce an instance.
    #[error("entity construction failed: {0}")]
    Construction(#[from] ConstructionError),

    /// A stored row could not be decoded.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// The entity kind has no table in this session.
    #[error("entity kind {0} is not registered with this session")]
    UnregisteredKind(EntityKind),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// `close` was called while other handles still share the session.
    #[error("session is still shared by {0} other handle(s)")]
    SessionInUse(usize),

    /// A background write did not run to completion.
    #[error("background task failed: {0}")]
    Task(String),
}
