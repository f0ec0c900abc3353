//! Core type definitions for chatkit.
//!
//! This crate defines the storage-agnostic types used throughout the
//! persistence core:
//! - Internal row identifiers and external (server) identifiers
//! - The external identifier generator
//! - Dynamically typed cell values and their column types
//!
//! Entity shapes and schemas live in `chatkit-model`, storage in
//! `chatkit-store`.

mod ids;
mod value;

pub use ids::{EXTERNAL_ID_BITS, ExternalId, RowId};
pub use value::{Value, ValueType};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid external id: {0:?}")]
    InvalidExternalId(String),

    #[error("unsupported JSON value: {0}")]
    UnsupportedJson(String),
}
