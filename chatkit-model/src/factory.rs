//! Entity construction from a runtime kind tag.
//!
//! Kinds are registered explicitly at startup with a zero-argument
//! constructor and, optionally, a copy constructor. Nothing is resolved by
//! inspecting types at runtime.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;
use tracing::warn;

use crate::{Entity, EntityKind, EntitySchema, ModelError, ModelResult, Record};

/// Builds a default-initialized entity.
pub type EmptyConstructor = fn() -> Box<dyn Entity>;

/// Builds an entity from an existing one, `None` if the source kind is not accepted.
pub type CopyConstructor = fn(&dyn Entity) -> Option<Box<dyn Entity>>;

/// Whether the factory may construct a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    Open,
    /// The kind can be stored and queried but not constructed through the factory.
    Restricted,
}

/// Why the factory could not produce an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("unknown entity kind: {0}")]
    UnknownKind(String),

    #[error("{kind} has no constructor matching {}", .from_kind.map_or("no arguments", |k| k.as_str()))]
    NoMatchingConstructor {
        kind: EntityKind,
        from_kind: Option<EntityKind>,
    },

    #[error("construction of {0} is restricted")]
    Restricted(EntityKind),

    #[error("constructor for {kind} panicked: {message}")]
    ConstructorPanicked { kind: EntityKind, message: String },
}

struct Registration {
    schema: &'static EntitySchema,
    empty: EmptyConstructor,
    copy: Option<CopyConstructor>,
    access: Access,
}

/// Maps kind tags to their schemas and constructors.
#[derive(Default)]
pub struct EntityRegistry {
    kinds: BTreeMap<&'static str, Registration>,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every chat kind shipped with the core.
    ///
    /// The join kind is restricted: links are only created by the store's
    /// relationship operations.
    pub fn chat() -> ModelResult<Self> {
        use crate::kinds::{Account, AccountConversationLink, Conversation, Message};

        let mut registry = Self::new();
        registry
            .register_with_copy::<Account>()?
            .register_with_copy::<Conversation>()?
            .register_with_copy::<Message>()?
            .register::<AccountConversationLink>()?;
        registry.kinds.entry(AccountConversationLink::SCHEMA.kind.as_str()).and_modify(|r| {
            r.access = Access::Restricted;
        });
        Ok(registry)
    }

    /// Registers a kind with only a default constructor.
    pub fn register<T: Record>(&mut self) -> ModelResult<&mut Self> {
        self.register_raw(T::SCHEMA, empty_record::<T>, None)
    }

    /// Registers a kind with a default and a copy constructor.
    pub fn register_with_copy<T: Record + Clone>(&mut self) -> ModelResult<&mut Self> {
        self.register_raw(T::SCHEMA, empty_record::<T>, Some(copy_record::<T>))
    }

    /// Registers a kind from explicit constructor functions.
    pub fn register_raw(
        &mut self,
        schema: &'static EntitySchema,
        empty: EmptyConstructor,
        copy: Option<CopyConstructor>,
    ) -> ModelResult<&mut Self> {
        schema.validate()?;
        if self.kinds.contains_key(schema.kind.as_str()) {
            return Err(ModelError::DuplicateKind(schema.kind));
        }
        self.kinds.insert(
            schema.kind.as_str(),
            Registration {
                schema,
                empty,
                copy,
                access: Access::Open,
            },
        );
        Ok(self)
    }

    /// Changes whether the factory may construct `kind`.
    pub fn set_access(&mut self, kind: &str, access: Access) -> Result<(), ConstructionError> {
        let registration = self
            .kinds
            .get_mut(kind)
            .ok_or_else(|| ConstructionError::UnknownKind(kind.to_owned()))?;
        registration.access = access;
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.kinds.contains_key(kind)
    }

    #[must_use]
    pub fn schema(&self, kind: &str) -> Option<&'static EntitySchema> {
        self.kinds.get(kind).map(|r| r.schema)
    }

    /// Registered schemas ordered by kind tag.
    pub fn schemas(&self) -> impl Iterator<Item = &'static EntitySchema> + '_ {
        self.kinds.values().map(|r| r.schema)
    }

    /// Constructs a default-initialized entity of `kind`.
    pub fn instantiate(&self, kind: &str) -> Result<Box<dyn Entity>, ConstructionError> {
        let registration = self.open_registration(kind)?;
        let schema = registration.schema;
        let empty = registration.empty;
        let entity = guarded(schema.kind, empty)?;
        ensure_kind(schema, entity, None)
    }

    /// Constructs an entity of `kind` by copying `source`.
    pub fn instantiate_from(
        &self,
        kind: &str,
        source: &dyn Entity,
    ) -> Result<Box<dyn Entity>, ConstructionError> {
        let registration = self.open_registration(kind)?;
        let schema = registration.schema;
        let no_match = || ConstructionError::NoMatchingConstructor {
            kind: schema.kind,
            from_kind: Some(source.kind()),
        };
        let copy = registration.copy.ok_or_else(no_match)?;
        let entity = guarded(schema.kind, || copy(source))?.ok_or_else(no_match)?;
        ensure_kind(schema, entity, Some(source.kind()))
    }

    /// Constructs a default-initialized `T` through its registration.
    pub fn instantiate_as<T: Record>(&self) -> Result<T, ConstructionError> {
        let entity = self.instantiate(T::SCHEMA.kind.as_str())?;
        entity
            .downcast::<T>()
            .map(|boxed| *boxed)
            .ok_or(ConstructionError::NoMatchingConstructor {
                kind: T::SCHEMA.kind,
                from_kind: None,
            })
    }

    /// Best-effort variant of [`instantiate`](Self::instantiate): logs and drops the failure.
    #[must_use]
    pub fn try_instantiate(&self, kind: &str) -> Option<Box<dyn Entity>> {
        self.instantiate(kind)
            .inspect_err(|e| log_failure(kind, e))
            .ok()
    }

    /// Best-effort variant of [`instantiate_from`](Self::instantiate_from).
    #[must_use]
    pub fn try_instantiate_from(&self, kind: &str, source: &dyn Entity) -> Option<Box<dyn Entity>> {
        self.instantiate_from(kind, source)
            .inspect_err(|e| log_failure(kind, e))
            .ok()
    }

    fn open_registration(&self, kind: &str) -> Result<&Registration, ConstructionError> {
        let registration = self
            .kinds
            .get(kind)
            .ok_or_else(|| ConstructionError::UnknownKind(kind.to_owned()))?;
        if registration.access == Access::Restricted {
            return Err(ConstructionError::Restricted(registration.schema.kind));
        }
        Ok(registration)
    }
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.kinds.keys()).finish()
    }
}

fn empty_record<T: Record>() -> Box<dyn Entity> {
    Box::new(T::default())
}

/// Copies every field except the row id, so the copy is stored as a new row.
fn copy_record<T: Record + Clone>(source: &dyn Entity) -> Option<Box<dyn Entity>> {
    source.downcast_ref::<T>().map(|original| {
        let mut copy = original.clone();
        copy.set_row_id(None);
        Box::new(copy) as Box<dyn Entity>
    })
}

fn guarded<R>(kind: EntityKind, constructor: impl FnOnce() -> R) -> Result<R, ConstructionError> {
    panic::catch_unwind(AssertUnwindSafe(constructor)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_owned());
        ConstructionError::ConstructorPanicked { kind, message }
    })
}

fn ensure_kind(
    schema: &'static EntitySchema,
    entity: Box<dyn Entity>,
    from_kind: Option<EntityKind>,
) -> Result<Box<dyn Entity>, ConstructionError> {
    if entity.kind() == schema.kind {
        Ok(entity)
    } else {
        Err(ConstructionError::NoMatchingConstructor {
            kind: schema.kind,
            from_kind,
        })
    }
}

fn log_failure(kind: &str, error: &ConstructionError) {
    let cause = match error {
        ConstructionError::UnknownKind(_) => "unknown_kind",
        ConstructionError::NoMatchingConstructor { .. } => "no_matching_constructor",
        ConstructionError::Restricted(_) => "restricted",
        ConstructionError::ConstructorPanicked { .. } => "constructor_panicked",
    };
    warn!(kind = %kind, cause, error = %error, "Entity construction failed");
}
