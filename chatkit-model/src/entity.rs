use chatkit_types::{ExternalId, RowId, Value, ValueType};
use std::any::Any;
use std::fmt;

use crate::{EntityKind, EntitySchema, ModelError, ModelResult, Property};

/// Capability shared by every persisted object.
///
/// The trait is object safe: the store and the factory work with
/// `Box<dyn Entity>` when the kind is only known at runtime.
pub trait Entity: Any + fmt::Debug + Send + Sync {
    fn schema(&self) -> &'static EntitySchema;

    /// Internal identifier, `None` until the first insert.
    fn row_id(&self) -> Option<RowId>;

    fn set_row_id(&mut self, id: Option<RowId>);

    fn external_id(&self) -> Option<&ExternalId>;

    fn set_external_id(&mut self, id: Option<ExternalId>);

    /// Cell values in property order.
    fn to_row(&self) -> Row;

    /// Replaces every field with the values of a stored row.
    fn load_row(&mut self, row: &Row) -> ModelResult<()>;

    fn kind(&self) -> EntityKind {
        self.schema().kind
    }
}

impl dyn Entity {
    #[must_use]
    pub fn is<T: Entity>(&self) -> bool {
        (self as &dyn Any).is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref()
    }

    pub fn downcast_mut<T: Entity>(&mut self) -> Option<&mut T> {
        (self as &mut dyn Any).downcast_mut()
    }

    /// Converts a boxed entity into its concrete type, `None` on a kind mismatch.
    #[must_use]
    pub fn downcast<T: Entity>(self: Box<Self>) -> Option<Box<T>> {
        let any: Box<dyn Any> = self;
        any.downcast().ok()
    }
}

/// An entity kind known at compile time.
pub trait Record: Entity + Default + Sized {
    const SCHEMA: &'static EntitySchema;

    fn from_row(row: &Row) -> ModelResult<Self> {
        let mut entity = Self::default();
        entity.load_row(row)?;
        Ok(entity)
    }
}

/// A record expressing one many-to-many link between two entities.
///
/// The link holds the row ids of both endpoints and is never updated in
/// place: it is created on link and deleted on unlink.
pub trait JoinEntity: Record {
    type Left: Entity;
    type Right: Entity;

    /// Property holding the left endpoint's row id.
    const LEFT: Property;

    /// Property holding the right endpoint's row id.
    const RIGHT: Property;

    fn join(left: RowId, right: RowId) -> Self;

    fn left(&self) -> Option<RowId>;

    fn right(&self) -> Option<RowId>;
}

/// The stored values of one entity, indexed by property ordinal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Replaces the value stored for `property`.
    pub fn set(&mut self, property: &Property, value: impl Into<Value>) -> ModelResult<()> {
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(property.ordinal)
            .ok_or(ModelError::MissingColumn {
                column: property.column,
                len,
            })?;
        *slot = value.into();
        Ok(())
    }

    pub fn get(&self, property: &Property) -> ModelResult<&Value> {
        self.values
            .get(property.ordinal)
            .ok_or(ModelError::MissingColumn {
                column: property.column,
                len: self.values.len(),
            })
    }

    pub fn opt_int(&self, property: &Property) -> ModelResult<Option<i64>> {
        self.typed(property, ValueType::Integer, Value::as_i64)
    }

    pub fn int(&self, property: &Property) -> ModelResult<i64> {
        required(property, self.opt_int(property)?)
    }

    pub fn opt_real(&self, property: &Property) -> ModelResult<Option<f64>> {
        self.typed(property, ValueType::Real, Value::as_f64)
    }

    pub fn real(&self, property: &Property) -> ModelResult<f64> {
        required(property, self.opt_real(property)?)
    }

    pub fn opt_text(&self, property: &Property) -> ModelResult<Option<String>> {
        self.typed(property, ValueType::Text, |v| v.as_str().map(str::to_owned))
    }

    pub fn text(&self, property: &Property) -> ModelResult<String> {
        required(property, self.opt_text(property)?)
    }

    pub fn opt_bool(&self, property: &Property) -> ModelResult<Option<bool>> {
        self.typed(property, ValueType::Bool, Value::as_bool)
    }

    pub fn bool(&self, property: &Property) -> ModelResult<bool> {
        required(property, self.opt_bool(property)?)
    }

    pub fn opt_row_id(&self, property: &Property) -> ModelResult<Option<RowId>> {
        Ok(self.opt_int(property)?.map(RowId::new))
    }

    pub fn opt_external_id(&self, property: &Property) -> ModelResult<Option<ExternalId>> {
        Ok(self.opt_text(property)?.map(ExternalId::from))
    }

    fn typed<T>(
        &self,
        property: &Property,
        expected: ValueType,
        convert: impl FnOnce(&Value) -> Option<T>,
    ) -> ModelResult<Option<T>> {
        let value = self.get(property)?;
        if value.is_null() {
            return Ok(None);
        }
        convert(value)
            .map(Some)
            .ok_or_else(|| ModelError::TypeMismatch {
                column: property.column,
                expected,
                found: value.clone(),
            })
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

fn required<T>(property: &Property, value: Option<T>) -> ModelResult<T> {
    value.ok_or(ModelError::UnexpectedNull(property.column))
}
