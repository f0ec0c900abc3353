//! Entity lifecycle: create, update, delete, and the fetch-or-create
//! lookups built on the query builder and the entity factory.

use chatkit_model::{ConstructionError, ENTITY_ID, Entity, EntityRegistry, Property, Record};
use chatkit_types::{ExternalId, RowId, Value};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::StoreResult;
use crate::lazy::ResultSet;
use crate::query::{Filter, Order, QueryBuilder};
use crate::session::Session;

/// What `update` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    /// No row carries the entity's row id (or it never had one). Nothing was written.
    NotFound,
}

/// What `delete` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The entity had no row to delete.
    NotFound,
    /// No entity was given.
    Absent,
}

/// Result of a fetch-or-create lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Found(T),
    Created(T),
}

impl<T> Fetched<T> {
    #[must_use]
    pub const fn was_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    #[must_use]
    pub const fn get(&self) -> &T {
        match self {
            Self::Found(entity) | Self::Created(entity) => entity,
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        match self {
            Self::Found(entity) | Self::Created(entity) => entity,
        }
    }

    #[must_use]
    pub fn into_inner(self) -> T {
        match self {
            Self::Found(entity) | Self::Created(entity) => entity,
        }
    }
}

/// Creates, updates, deletes and looks up entities through one [`Session`].
#[derive(Debug, Clone)]
pub struct EntityManager {
    session: Session,
}

impl EntityManager {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Opens a session and wraps it.
    pub fn open(config: SessionConfig, registry: EntityRegistry) -> StoreResult<Self> {
        Session::open(config, registry).map(Self::new)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Closes the underlying session.
    pub fn close(self) -> StoreResult<()> {
        self.session.close()
    }

    /// Starts a fluent query over `T`.
    #[must_use]
    pub fn query<T: Record>(&self) -> QueryBuilder<'_, T> {
        self.session.query()
    }

    // ── Create / update / delete ─────────────────────────────────

    /// Inserts the entity, or replaces the row with the same row id.
    ///
    /// Returns the row id, or `None` (with no side effects) when no entity is given.
    pub fn create<'a, E>(&self, entity: impl Into<Option<&'a mut E>>) -> StoreResult<Option<RowId>>
    where
        E: Entity + ?Sized + 'a,
    {
        let Some(entity) = entity.into() else {
            return Ok(None);
        };
        let id = self.session.insert_or_replace(entity)?;
        debug!(kind = %entity.kind(), row_id = %id, "Entity created");
        Ok(Some(id))
    }

    /// Updates the row matching the entity's row id.
    ///
    /// Updating an entity whose row does not exist is a no-op reported as
    /// [`UpdateOutcome::NotFound`]; it never inserts.
    pub fn update<'a, E>(&self, entity: impl Into<Option<&'a E>>) -> StoreResult<Option<UpdateOutcome>>
    where
        E: Entity + ?Sized + 'a,
    {
        let Some(entity) = entity.into() else {
            return Ok(None);
        };
        let outcome = if self.session.update(entity)? {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::NotFound
        };
        debug!(kind = %entity.kind(), row_id = ?entity.row_id(), ?outcome, "Entity updated");
        Ok(Some(outcome))
    }

    /// Deletes the row matching the entity's row id and clears the identity cache.
    pub fn delete<'a, E>(&self, entity: impl Into<Option<&'a E>>) -> StoreResult<DeleteOutcome>
    where
        E: Entity + ?Sized + 'a,
    {
        let Some(entity) = entity.into() else {
            debug!("Delete called without an entity");
            return Ok(DeleteOutcome::Absent);
        };
        let outcome = if self.session.delete(entity)? {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::NotFound
        };
        debug!(kind = %entity.kind(), row_id = ?entity.row_id(), ?outcome, "Entity deleted");
        Ok(outcome)
    }

    // ── Queries ──────────────────────────────────────────────────

    /// First entity with `properties[i] = values[i]` for every `i`.
    pub fn fetch_one<T: Record>(
        &self,
        properties: &[Property],
        values: &[Value],
    ) -> StoreResult<Option<T>> {
        let filter = Filter::from_lists(properties, values)?;
        QueryBuilder::<T>::with_filter(&self.session, filter).unique()
    }

    /// Every entity matching the predicates, optionally ordered.
    ///
    /// With a limit the result is a [`ResultSet::Lazy`] that loads entities on
    /// access; without one every row is loaded up front.
    pub fn fetch_many<T: Record>(
        &self,
        properties: &[Property],
        values: &[Value],
        order: Option<(Property, Order)>,
        limit: Option<usize>,
    ) -> StoreResult<ResultSet<T>> {
        let mut filter = Filter::from_lists(properties, values)?;
        if let Some((property, direction)) = order {
            filter.set_order(property, direction);
        }
        if let Some(limit) = limit {
            filter.set_limit(limit);
        }
        QueryBuilder::<T>::with_filter(&self.session, filter).result_set()
    }

    pub fn fetch_with_external_id<T: Record>(
        &self,
        external_id: impl AsRef<str>,
    ) -> StoreResult<Option<T>> {
        self.fetch_with_property(&ENTITY_ID, external_id.as_ref())
    }

    pub fn fetch_with_property<T: Record>(
        &self,
        property: &Property,
        value: impl Into<Value>,
    ) -> StoreResult<Option<T>> {
        self.fetch_one(&[*property], &[value.into()])
    }

    pub fn fetch_all_with_property<T: Record>(
        &self,
        property: &Property,
        value: impl Into<Value>,
    ) -> StoreResult<Vec<T>> {
        self.fetch_many(&[*property], &[value.into()], None, None)?
            .into_vec()
    }

    pub fn fetch_with_properties<T: Record>(
        &self,
        properties: &[Property],
        values: &[Value],
    ) -> StoreResult<Option<T>> {
        self.fetch_one(properties, values)
    }

    pub fn fetch_all_with_properties<T: Record>(
        &self,
        properties: &[Property],
        values: &[Value],
        order: Option<(Property, Order)>,
    ) -> StoreResult<Vec<T>> {
        self.fetch_many(properties, values, order, None)?.into_vec()
    }

    // ── Fetch or create ──────────────────────────────────────────

    /// Entity with `external_id`, created through the factory if none exists.
    pub fn fetch_or_create<T: Record>(&self, external_id: impl AsRef<str>) -> StoreResult<T> {
        let external_id = external_id.as_ref();
        let kind = T::SCHEMA.kind;
        debug!(%kind, external_id, "Fetch or create by external id");
        if let Some(found) = self.fetch_with_external_id::<T>(external_id)? {
            return Ok(found);
        }

        let mut entity = self
            .session
            .registry()
            .instantiate_as::<T>()
            .inspect_err(|e| warn!(%kind, error = %e, "Cannot construct entity"))?;
        entity.set_external_id(Some(ExternalId::from(external_id)));
        self.create(&mut entity)?;
        Ok(entity)
    }

    /// Like [`fetch_or_create`](Self::fetch_or_create) for a kind known only by its tag.
    pub fn fetch_or_create_kind(
        &self,
        kind: &str,
        external_id: impl AsRef<str>,
    ) -> StoreResult<Box<dyn Entity>> {
        let external_id = external_id.as_ref();
        let registry = self.session.registry();
        let construct = |kind: &str| {
            registry
                .instantiate(kind)
                .inspect_err(|e| warn!(kind, error = %e, "Cannot construct entity"))
        };
        let schema = registry
            .schema(kind)
            .ok_or_else(|| ConstructionError::UnknownKind(kind.to_owned()))?;

        let mut filter = Filter::from_lists(&[ENTITY_ID], &[Value::from(external_id)])?;
        filter.validate(schema)?;
        filter.set_limit(1);
        if let Some(row) = self.session.select_rows(schema, &filter)?.into_iter().next() {
            let mut entity = construct(kind)?;
            entity.load_row(&row)?;
            return Ok(entity);
        }

        let mut entity = construct(kind)?;
        entity.set_external_id(Some(ExternalId::from(external_id)));
        self.create(&mut *entity)?;
        Ok(entity)
    }

    /// Entity with `property = value`, created through the factory if none exists.
    ///
    /// A created entity does **not** receive `value`: the caller populates the
    /// property (and updates) when the result is [`Fetched::Created`]. Until
    /// then further calls keep creating new entities.
    pub fn fetch_or_create_by_property<T: Record>(
        &self,
        property: &Property,
        value: impl Into<Value>,
    ) -> StoreResult<Fetched<T>> {
        let value = value.into();
        let kind = T::SCHEMA.kind;
        debug!(%kind, property = property.column, %value, "Fetch or create by property");
        if let Some(found) = self.fetch_with_property::<T>(property, value)? {
            return Ok(Fetched::Found(found));
        }

        let mut entity = self
            .session
            .registry()
            .instantiate_as::<T>()
            .inspect_err(|e| warn!(%kind, error = %e, "Cannot construct entity"))?;
        self.create(&mut entity)?;
        Ok(Fetched::Created(entity))
    }
}

impl From<Session> for EntityManager {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
