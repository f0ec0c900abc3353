//! Lazily materialized query results.

use chatkit_model::Record;
use chatkit_types::RowId;
use std::vec;
use tracing::debug;

use crate::error::StoreResult;
use crate::session::Session;

/// Query result whose row ids are resolved up front and whose entities are
/// loaded one at a time, on first access.
///
/// Loading goes through the session identity cache. A row deleted after the
/// list was built is skipped.
pub struct LazyList<T> {
    session: Session,
    ids: Vec<RowId>,
    loaded: Vec<Option<T>>,
    next: usize,
}

impl<T: Record> LazyList<T> {
    pub(crate) fn new(session: Session, ids: Vec<RowId>) -> Self {
        let loaded = ids.iter().map(|_| None).collect();
        Self {
            session,
            ids,
            loaded,
            next: 0,
        }
    }

    /// Number of matching rows, loaded or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn row_ids(&self) -> &[RowId] {
        &self.ids
    }

    /// How many entities have been materialized and are still held.
    #[must_use]
    pub fn loaded_count(&self) -> usize {
        self.loaded.iter().filter(|slot| slot.is_some()).count()
    }

    /// Entity at `index`, loading it if needed.
    ///
    /// `None` when the index is out of range or the row no longer exists.
    pub fn get(&mut self, index: usize) -> StoreResult<Option<&T>> {
        let Some(&id) = self.ids.get(index) else {
            return Ok(None);
        };
        if self.loaded[index].is_none() {
            self.loaded[index] = self.session.load::<T>(id)?;
        }
        Ok(self.loaded[index].as_ref())
    }

    /// Materializes every remaining entity.
    pub fn into_vec(self) -> StoreResult<Vec<T>> {
        self.collect()
    }
}

impl<T: Record> Iterator for LazyList<T> {
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.ids.len() {
            let index = self.next;
            self.next += 1;
            if let Some(entity) = self.loaded[index].take() {
                return Some(Ok(entity));
            }
            match self.session.load::<T>(self.ids[index]) {
                Ok(Some(entity)) => return Some(Ok(entity)),
                Ok(None) => {
                    let kind = T::SCHEMA.kind;
                    let row_id = self.ids[index];
                    debug!(kind = %kind, row_id = %row_id, "Row vanished before load");
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.ids.len() - self.next))
    }
}

impl<T> std::fmt::Debug for LazyList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyList")
            .field("ids", &self.ids)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

/// Result of [`EntityManager::fetch_many`](crate::EntityManager::fetch_many):
/// eager without a limit, lazy with one.
#[derive(Debug)]
pub enum ResultSet<T> {
    Eager(Vec<T>),
    Lazy(LazyList<T>),
}

impl<T: Record> ResultSet<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Eager(items) => items.len(),
            Self::Lazy(list) => list.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_lazy(&self) -> bool {
        matches!(self, Self::Lazy(_))
    }

    pub fn into_vec(self) -> StoreResult<Vec<T>> {
        match self {
            Self::Eager(items) => Ok(items),
            Self::Lazy(list) => list.into_vec(),
        }
    }
}

impl<T: Record> IntoIterator for ResultSet<T> {
    type Item = StoreResult<T>;
    type IntoIter = ResultIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::Eager(items) => ResultIter::Eager(items.into_iter()),
            Self::Lazy(list) => ResultIter::Lazy(list),
        }
    }
}

/// Iterator over a [`ResultSet`].
pub enum ResultIter<T> {
    Eager(vec::IntoIter<T>),
    Lazy(LazyList<T>),
}

impl<T: Record> Iterator for ResultIter<T> {
    type Item = StoreResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Eager(items) => items.next().map(Ok),
            Self::Lazy(list) => list.next(),
        }
    }
}
