//! Entity model for chatkit.
//!
//! Defines the types the persistence core is generic over:
//! - [`Property`]: an immutable reference to one column of one entity kind
//! - [`EntitySchema`]: the table and ordered properties of a kind
//! - [`Entity`] / [`Record`]: the object-safe and the static entity capabilities
//! - [`JoinEntity`]: records linking two entities many-to-many
//! - [`EntityRegistry`]: constructs entities from a runtime kind tag
//!
//! The chat kinds in [`kinds`] are the data shapes shipped with the core.

mod entity;
mod factory;
pub mod kinds;
mod property;
mod schema;

pub use entity::{Entity, JoinEntity, Row, Record};
pub use factory::{Access, ConstructionError, CopyConstructor, EmptyConstructor, EntityRegistry};
pub use property::Property;
pub use schema::{ENTITY_ID, EntityKind, EntitySchema, ROW_ID};

use chatkit_types::{Value, ValueType};
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while decoding rows or registering schemas.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The row is shorter than the schema.
    #[error("column {column} missing from row of {len} values")]
    MissingColumn { column: &'static str, len: usize },

    /// A stored value does not match the column type.
    #[error("column {column}: expected {expected}, found {found}")]
    TypeMismatch {
        column: &'static str,
        expected: ValueType,
        found: Value,
    },

    /// A non-nullable column held NULL.
    #[error("column {0} is not nullable")]
    UnexpectedNull(&'static str),

    /// The schema breaks a layout invariant.
    #[error("invalid schema for {kind}: {reason}")]
    InvalidSchema { kind: EntityKind, reason: String },

    /// Two registrations for the same kind tag.
    #[error("entity kind {0} is already registered")]
    DuplicateKind(EntityKind),
}
