use chatkit_types::ValueType;
use std::fmt;

/// Reference to one column of one entity kind.
///
/// Properties are plain `const` values and are the unit of predicate
/// composition: queries pair a property with the value it must equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    /// Position of the property in its schema (0 is always the row id).
    pub ordinal: usize,
    pub value_type: ValueType,
    /// Field name on the Rust side.
    pub name: &'static str,
    pub nullable: bool,
    /// Column name in the backing table.
    pub column: &'static str,
}

impl Property {
    #[must_use]
    pub const fn new(
        ordinal: usize,
        value_type: ValueType,
        name: &'static str,
        nullable: bool,
        column: &'static str,
    ) -> Self {
        Self {
            ordinal,
            value_type,
            name,
            nullable,
            column,
        }
    }

    #[must_use]
    pub const fn is_primary_key(&self) -> bool {
        self.ordinal == 0
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column)
    }
}
