//! Fire-and-forget writes on tokio's blocking pool.
//!
//! The core API stays synchronous. This channel only moves `create`,
//! `update` and `delete` off the caller's task; each call owns its entity
//! and hands it back through the join handle.

use chatkit_model::Entity;
use chatkit_types::RowId;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::manager::{DeleteOutcome, EntityManager, UpdateOutcome};

/// Background writer sharing the manager's session.
#[derive(Debug, Clone)]
pub struct AsyncSession {
    manager: EntityManager,
}

impl EntityManager {
    /// Starts a background write channel over this manager's session.
    #[must_use]
    pub fn start_async(&self) -> AsyncSession {
        AsyncSession {
            manager: self.clone(),
        }
    }
}

impl AsyncSession {
    #[must_use]
    pub fn manager(&self) -> &EntityManager {
        &self.manager
    }

    /// Inserts or replaces `entity`; the handle yields it back with its row id set.
    pub fn create<E: Entity>(&self, mut entity: E) -> JoinHandle<StoreResult<(E, RowId)>> {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || {
            let id = manager.create(&mut entity)?;
            let id = id.ok_or_else(|| StoreError::Task("insert returned no row id".into()))?;
            Ok((entity, id))
        })
    }

    pub fn update<E: Entity>(&self, entity: E) -> JoinHandle<StoreResult<(E, UpdateOutcome)>> {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || {
            let outcome = manager
                .update(&entity)?
                .unwrap_or(UpdateOutcome::NotFound);
            Ok((entity, outcome))
        })
    }

    pub fn delete<E: Entity>(&self, entity: E) -> JoinHandle<StoreResult<DeleteOutcome>> {
        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || manager.delete(&entity))
    }
}

/// Awaits a background write, folding a panicked or cancelled task into [`StoreError::Task`].
pub async fn join<T>(handle: JoinHandle<StoreResult<T>>) -> StoreResult<T> {
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Background write did not complete");
            Err(StoreError::Task(e.to_string()))
        }
    }
}
