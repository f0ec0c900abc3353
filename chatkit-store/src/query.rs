//! Equality queries over one entity kind.
//!
//! A query is an AND of `property = value` predicates, with an optional
//! single-column order and an optional row limit. Everything is validated
//! against the kind's schema before SQLite sees the statement.

use chatkit_model::{EntitySchema, Property, Record};
use chatkit_types::Value;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::error::{StoreError, StoreResult};
use crate::lazy::{LazyList, ResultSet};
use crate::session::{Session, quoted};

/// Sort direction of an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Predicates, ordering and limit of one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Filter {
    predicates: Vec<(Property, Value)>,
    order: Option<(Property, Order)>,
    limit: Option<usize>,
}

impl Filter {
    /// Pairs `properties[i]` with `values[i]`.
    pub(crate) fn from_lists(properties: &[Property], values: &[Value]) -> StoreResult<Self> {
        if properties.len() != values.len() {
            return Err(StoreError::InvalidArguments(format!(
                "{} properties but {} values",
                properties.len(),
                values.len()
            )));
        }
        Ok(Self {
            predicates: properties.iter().copied().zip(values.iter().cloned()).collect(),
            ..Self::default()
        })
    }

    pub(crate) fn push(&mut self, property: Property, value: Value) {
        self.predicates.push((property, value));
    }

    pub(crate) fn set_order(&mut self, property: Property, order: Order) {
        self.order = Some((property, order));
    }

    pub(crate) fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
    }

    pub(crate) const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Rejects filters that would be a programming error to run.
    pub(crate) fn validate(&self, schema: &EntitySchema) -> StoreResult<()> {
        if self.predicates.is_empty() {
            return Err(StoreError::InvalidArguments(
                "at least one predicate is required".into(),
            ));
        }
        for (property, value) in &self.predicates {
            ensure_member(schema, property)?;
            if !value.is_null() && !property.value_type.accepts(value) {
                return Err(StoreError::InvalidArguments(format!(
                    "{}.{} is {} but the value is {value}",
                    schema.kind, property.name, property.value_type
                )));
            }
        }
        if let Some((property, _)) = &self.order {
            ensure_member(schema, property)?;
        }
        Ok(())
    }

    /// `SELECT {projection} FROM … WHERE … [ORDER BY …] [LIMIT …]`.
    pub(crate) fn to_sql(&self, schema: &EntitySchema, projection: &str) -> String {
        let conditions = self
            .predicates
            .iter()
            .map(|(property, value)| {
                if value.is_null() {
                    format!("{} IS NULL", quoted(property.column))
                } else {
                    format!("{} = ?", quoted(property.column))
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        let mut sql = format!(
            "SELECT {projection} FROM {} WHERE {conditions}",
            quoted(schema.table)
        );
        if let Some((property, order)) = &self.order {
            sql.push_str(&format!(" ORDER BY {} {}", quoted(property.column), order.sql()));
        }
        if let Some(limit) = self.limit {
            // SQLite limits are signed 64-bit; anything larger means "all rows".
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// Bound parameters, in placeholder order.
    pub(crate) fn params(&self) -> impl Iterator<Item = &Value> {
        self.predicates
            .iter()
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }
}

fn ensure_member(schema: &EntitySchema, property: &Property) -> StoreResult<()> {
    if schema.contains(property) {
        Ok(())
    } else {
        Err(StoreError::InvalidArguments(format!(
            "property {} does not belong to {}",
            property.column, schema.kind
        )))
    }
}

/// Fluent query over `T`, created by [`Session::query`].
///
/// ```ignore
/// let latest = session
///     .query::<Message>()
///     .filter(&Message::THREAD_ID, 7)
///     .order_by(&Message::SENT_AT, Order::Descending)
///     .limit(2)
///     .list_lazy()?;
/// ```
pub struct QueryBuilder<'s, T> {
    session: &'s Session,
    filter: Filter,
    _kind: PhantomData<fn() -> T>,
}

impl<'s, T: Record> QueryBuilder<'s, T> {
    pub(crate) fn new(session: &'s Session) -> Self {
        Self::with_filter(session, Filter::default())
    }

    pub(crate) fn with_filter(session: &'s Session, filter: Filter) -> Self {
        Self {
            session,
            filter,
            _kind: PhantomData,
        }
    }

    /// Adds `property = value` to the predicate set.
    #[must_use]
    pub fn filter(mut self, property: &Property, value: impl Into<Value>) -> Self {
        self.filter.push(*property, value.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, property: &Property, order: Order) -> Self {
        self.filter.set_order(*property, order);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.filter.set_limit(limit);
        self
    }

    /// First matching entity in the store's order (or the requested order).
    pub fn unique(mut self) -> StoreResult<Option<T>> {
        self.filter.validate(T::SCHEMA)?;
        if self.filter.limit() == Some(0) {
            return Ok(None);
        }
        self.filter.set_limit(1);
        let rows = self.session.select_rows(T::SCHEMA, &self.filter)?;
        rows.first().map(T::from_row).transpose().map_err(Into::into)
    }

    /// Every matching entity, loaded eagerly.
    pub fn list(self) -> StoreResult<Vec<T>> {
        self.filter.validate(T::SCHEMA)?;
        if self.filter.limit() == Some(0) {
            return Ok(Vec::new());
        }
        self.session
            .select_rows(T::SCHEMA, &self.filter)?
            .iter()
            .map(|row| T::from_row(row).map_err(Into::into))
            .collect()
    }

    /// Matching entities, each loaded on first access.
    pub fn list_lazy(self) -> StoreResult<LazyList<T>> {
        self.filter.validate(T::SCHEMA)?;
        if self.filter.limit() == Some(0) {
            return Ok(LazyList::new(self.session.clone(), Vec::new()));
        }
        let ids = self.session.select_ids(T::SCHEMA, &self.filter)?;
        Ok(LazyList::new(self.session.clone(), ids))
    }

    /// Lazy when a limit was set, eager otherwise.
    pub fn result_set(self) -> StoreResult<ResultSet<T>> {
        if self.filter.limit().is_some() {
            self.list_lazy().map(ResultSet::Lazy)
        } else {
            self.list().map(ResultSet::Eager)
        }
    }

    /// Number of matching rows; order and limit do not apply.
    pub fn count(mut self) -> StoreResult<u64> {
        self.filter.validate(T::SCHEMA)?;
        self.filter.order = None;
        self.filter.limit = None;
        self.session.count_rows(T::SCHEMA, &self.filter)
    }
}
