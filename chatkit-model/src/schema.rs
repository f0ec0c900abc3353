use chatkit_types::ValueType;
use std::collections::HashSet;
use std::fmt;

use crate::{ModelError, ModelResult, Property};

/// The internal identifier property. Every schema starts with it.
pub const ROW_ID: Property = Property::new(0, ValueType::Integer, "id", true, "_id");

/// The external identifier property. Every schema lists it right after [`ROW_ID`].
///
/// Nullable by declaration; entities that never leave the device (join
/// records, for instance) leave it empty.
pub const ENTITY_ID: Property = Property::new(1, ValueType::Text, "entity_id", true, "ENTITY_ID");

/// Stable tag naming an entity kind, e.g. `"Account"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityKind(&'static str);

impl EntityKind {
    #[must_use]
    pub const fn new(tag: &'static str) -> Self {
        Self(tag)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Describes how an entity kind maps onto a table.
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub table: &'static str,
    /// Properties ordered by ordinal.
    pub properties: &'static [Property],
}

impl EntitySchema {
    #[must_use]
    pub const fn new(kind: EntityKind, table: &'static str, properties: &'static [Property]) -> Self {
        Self {
            kind,
            table,
            properties,
        }
    }

    /// The internal identifier property.
    #[must_use]
    pub const fn row_id_property(&self) -> &'static Property {
        &ROW_ID
    }

    /// The external identifier property.
    #[must_use]
    pub const fn external_id_property(&self) -> &'static Property {
        &ENTITY_ID
    }

    /// Whether `property` is one of this schema's properties.
    #[must_use]
    pub fn contains(&self, property: &Property) -> bool {
        self.properties.get(property.ordinal) == Some(property)
    }

    /// Looks up a property by field name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&'static Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.column)
    }

    /// Checks the layout invariants the store relies on.
    pub fn validate(&self) -> ModelResult<()> {
        let invalid = |reason: String| ModelError::InvalidSchema {
            kind: self.kind,
            reason,
        };

        if self.table.is_empty() {
            return Err(invalid("empty table name".into()));
        }
        if self.properties.first() != Some(&ROW_ID) {
            return Err(invalid("first property must be the row id".into()));
        }
        if self.properties.get(1) != Some(&ENTITY_ID) {
            return Err(invalid("second property must be the entity id".into()));
        }

        let mut columns = HashSet::new();
        for (position, property) in self.properties.iter().enumerate() {
            if property.ordinal != position {
                return Err(invalid(format!(
                    "property {} has ordinal {} at position {position}",
                    property.name, property.ordinal
                )));
            }
            if !columns.insert(property.column) {
                return Err(invalid(format!("duplicate column {}", property.column)));
            }
        }
        Ok(())
    }
}
