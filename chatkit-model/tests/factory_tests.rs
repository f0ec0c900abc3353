use chatkit_model::kinds::{Account, AccountConversationLink, Conversation, Message};
use chatkit_model::{
    Access, ConstructionError, Entity, EntityKind, EntityRegistry, ModelError, Record,
};
use chatkit_types::{ExternalId, RowId};

fn registry() -> EntityRegistry {
    EntityRegistry::chat().unwrap()
}

fn panicking_constructor() -> Box<dyn Entity> {
    panic!("account constructor exploded")
}

fn wrong_kind_constructor() -> Box<dyn Entity> {
    Box::new(Message::default())
}

// ── Default construction ─────────────────────────────────────────

#[test]
fn instantiate_known_kind() {
    let entity = registry().instantiate("Account").unwrap();
    assert_eq!(entity.kind(), Account::SCHEMA.kind);
    assert!(entity.row_id().is_none());
    assert!(entity.external_id().is_none());
}

#[test]
fn instantiate_as_concrete_type() {
    let conversation: Conversation = registry().instantiate_as().unwrap();
    assert_eq!(conversation, Conversation::default());
}

#[test]
fn registry_lists_schemas_in_tag_order() {
    let kinds: Vec<_> = registry().schemas().map(|s| s.kind.as_str()).collect();
    assert_eq!(kinds, vec!["Account", "AccountConversationLink", "Conversation", "Message"]);
}

// ── Copy construction ────────────────────────────────────────────

#[test]
fn instantiate_from_copies_fields_but_not_row_id() {
    let source = Account {
        row_id: Some(RowId::new(4)),
        external_id: Some(ExternalId::new("u-1")),
        name: Some("Ada".into()),
        ..Account::default()
    };
    let copy = registry().instantiate_from("Account", &source).unwrap();
    let copy = copy.downcast::<Account>().unwrap();
    assert_eq!(copy.row_id, None);
    assert_eq!(copy.external_id, source.external_id);
    assert_eq!(copy.name.as_deref(), Some("Ada"));
}

// ── Failure variants ─────────────────────────────────────────────

#[test]
fn unknown_kind() {
    let err = registry().instantiate("Sticker").unwrap_err();
    assert_eq!(err, ConstructionError::UnknownKind("Sticker".into()));
}

#[test]
fn copy_from_incompatible_kind() {
    let source = Message::default();
    let err = registry().instantiate_from("Account", &source).unwrap_err();
    assert_eq!(
        err,
        ConstructionError::NoMatchingConstructor {
            kind: Account::SCHEMA.kind,
            from_kind: Some(Message::SCHEMA.kind),
        }
    );
}

#[test]
fn copy_without_copy_constructor() {
    let mut registry = EntityRegistry::new();
    registry.register::<Account>().unwrap();
    let err = registry.instantiate_from("Account", &Account::default()).unwrap_err();
    assert!(matches!(err, ConstructionError::NoMatchingConstructor { .. }));
}

#[test]
fn join_kind_is_restricted() {
    let err = registry().instantiate("AccountConversationLink").unwrap_err();
    assert_eq!(err, ConstructionError::Restricted(AccountConversationLink::SCHEMA.kind));
}

#[test]
fn access_can_be_reopened() {
    let mut registry = registry();
    registry.set_access("AccountConversationLink", Access::Open).unwrap();
    assert!(registry.instantiate("AccountConversationLink").is_ok());
}

#[test]
fn set_access_on_unknown_kind() {
    let err = registry().set_access("Nope", Access::Restricted).unwrap_err();
    assert!(matches!(err, ConstructionError::UnknownKind(_)));
}

#[test]
fn panicking_constructor_is_contained() {
    let mut registry = EntityRegistry::new();
    registry
        .register_raw(Account::SCHEMA, panicking_constructor, None)
        .unwrap();
    let err = registry.instantiate("Account").unwrap_err();
    match err {
        ConstructionError::ConstructorPanicked { kind, message } => {
            assert_eq!(kind, EntityKind::new("Account"));
            assert!(message.contains("exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn constructor_producing_other_kind_is_rejected() {
    let mut registry = EntityRegistry::new();
    registry
        .register_raw(Account::SCHEMA, wrong_kind_constructor, None)
        .unwrap();
    let err = registry.instantiate("Account").unwrap_err();
    assert!(matches!(err, ConstructionError::NoMatchingConstructor { from_kind: None, .. }));
}

#[test]
fn failures_are_distinguishable_by_message() {
    let registry = registry();
    let unknown = registry.instantiate("X").unwrap_err().to_string();
    let restricted = registry
        .instantiate("AccountConversationLink")
        .unwrap_err()
        .to_string();
    assert!(unknown.starts_with("unknown entity kind"));
    assert!(restricted.contains("restricted"));
}

// ── Best-effort variants ─────────────────────────────────────────

#[test]
fn try_instantiate_returns_none_on_failure() {
    let registry = registry();
    assert!(registry.try_instantiate("Unknown").is_none());
    assert!(registry.try_instantiate("AccountConversationLink").is_none());
    assert!(registry.try_instantiate("Message").is_some());
}

#[test]
fn try_instantiate_from_returns_none_on_failure() {
    let registry = registry();
    assert!(registry.try_instantiate_from("Account", &Message::default()).is_none());
    assert!(registry.try_instantiate_from("Message", &Message::default()).is_some());
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = registry();
    let err = registry.register::<Account>().unwrap_err();
    assert!(matches!(err, ModelError::DuplicateKind(kind) if kind.as_str() == "Account"));
}
