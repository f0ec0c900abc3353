//! Many-to-many relationships stored as join entities.

use chatkit_model::{Entity, JoinEntity};
use chatkit_types::{RowId, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::manager::{DeleteOutcome, EntityManager};

impl EntityManager {
    /// Records that `left` and `right` are related.
    ///
    /// Both endpoints must already be stored. A new link row is written on
    /// every call, so linking the same pair twice yields two links.
    pub fn link<J: JoinEntity>(&self, left: &J::Left, right: &J::Right) -> StoreResult<J> {
        let (left_id, right_id) = (endpoint(left)?, endpoint(right)?);
        let mut link = J::join(left_id, right_id);
        self.create(&mut link)?;
        debug!(kind = %link.kind(), left = %left_id, right = %right_id, "Linked");
        Ok(link)
    }

    /// Removes one link between `left` and `right`.
    ///
    /// Returns [`DeleteOutcome::Absent`] when the pair was not linked.
    pub fn unlink<J: JoinEntity>(&self, left: &J::Left, right: &J::Right) -> StoreResult<DeleteOutcome> {
        let (left_id, right_id) = (endpoint(left)?, endpoint(right)?);
        let link = self.fetch_one::<J>(
            &[J::RIGHT, J::LEFT],
            &[Value::from(right_id), Value::from(left_id)],
        )?;
        let outcome = self.delete(link.as_ref())?;
        debug!(left = %left_id, right = %right_id, ?outcome, "Unlinked");
        Ok(outcome)
    }

    /// Every link whose left endpoint is `left`.
    pub fn linked_rows<J: JoinEntity>(&self, left: &J::Left) -> StoreResult<Vec<J>> {
        let left_id = endpoint(left)?;
        self.fetch_all_with_property(&J::LEFT, left_id)
    }
}

fn endpoint<E: Entity>(entity: &E) -> StoreResult<RowId> {
    entity.row_id().ok_or_else(|| {
        StoreError::InvalidArguments(format!("{} must be stored before it can be linked", entity.kind()))
    })
}
