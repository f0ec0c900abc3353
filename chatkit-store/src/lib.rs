//! SQLite persistence for chatkit entities.
//!
//! Provides the storage session, the equality query builder and the entity
//! lifecycle manager on top of the kinds described by `chatkit-model`.
//!
//! # Architecture
//!
//! - One table per registered kind, created on open from its schema
//! - `_id` is the auto-assigned row id; `ENTITY_ID` holds the external id
//! - Rows read or written by id go through a bounded identity cache that
//!   every delete clears
//! - Query results are eager, or lazy (ids first, entities on access)
//! - Many-to-many relationships are join rows holding both endpoints' row ids
//!
//! ```ignore
//! let manager = EntityManager::open(SessionConfig::in_memory(), EntityRegistry::chat()?)?;
//! let account: Account = manager.fetch_or_create("abc123")?;
//! ```

mod async_session;
mod config;
mod error;
mod lazy;
mod manager;
mod query;
mod relation;
mod session;

pub use async_session::{AsyncSession, join};
pub use config::{
    DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_DATABASE_NAME, DEFAULT_IDENTITY_CACHE_CAPACITY,
    DatabaseTarget, SessionConfig,
};
pub use error::{StoreError, StoreResult};
pub use lazy::{LazyList, ResultIter, ResultSet};
pub use manager::{DeleteOutcome, EntityManager, Fetched, UpdateOutcome};
pub use query::{Order, QueryBuilder};
pub use session::{Session, SessionStats};
