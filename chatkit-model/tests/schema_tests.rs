use chatkit_model::kinds::{Account, AccountConversationLink, Conversation, Message};
use chatkit_model::{ENTITY_ID, EntityKind, EntitySchema, ModelError, Property, ROW_ID, Record};
use chatkit_types::ValueType;
use pretty_assertions::assert_eq;

// ── Identifier layout ────────────────────────────────────────────

#[test]
fn row_id_is_first_and_primary() {
    assert_eq!(ROW_ID.ordinal, 0);
    assert!(ROW_ID.is_primary_key());
    assert_eq!(ROW_ID.column, "_id");
}

#[test]
fn entity_id_is_second_and_textual() {
    assert_eq!(ENTITY_ID.ordinal, 1);
    assert_eq!(ENTITY_ID.value_type, ValueType::Text);
    assert_eq!(ENTITY_ID.column, "ENTITY_ID");
    assert!(!ENTITY_ID.is_primary_key());
}

#[test]
fn bundled_schemas_validate() {
    for schema in [
        Account::SCHEMA,
        Conversation::SCHEMA,
        Message::SCHEMA,
        AccountConversationLink::SCHEMA,
    ] {
        schema.validate().unwrap();
        assert_eq!(schema.row_id_property(), &ROW_ID);
        assert_eq!(schema.external_id_property(), &ENTITY_ID);
    }
}

#[test]
fn columns_follow_property_order() {
    let columns: Vec<_> = Message::SCHEMA.columns().collect();
    assert_eq!(
        columns,
        vec!["_id", "ENTITY_ID", "THREAD_ID", "SENDER_ID", "TEXT", "SENT_AT", "DELIVERED"]
    );
}

// ── Membership ───────────────────────────────────────────────────

#[test]
fn contains_own_properties() {
    assert!(Message::SCHEMA.contains(&Message::SENT_AT));
    assert!(Message::SCHEMA.contains(&ENTITY_ID));
}

#[test]
fn rejects_foreign_property_with_same_ordinal() {
    // Account::NAME has ordinal 2, like Message::THREAD_ID
    assert!(!Message::SCHEMA.contains(&Account::NAME));
}

#[test]
fn lookup_by_field_name() {
    assert_eq!(Account::SCHEMA.property("email"), Some(&Account::EMAIL));
    assert_eq!(Account::SCHEMA.property("missing"), None);
}

// ── Validation failures ──────────────────────────────────────────

static MISSING_ENTITY_ID: EntitySchema =
    EntitySchema::new(EntityKind::new("Broken"), "BROKEN", &[ROW_ID]);

static WRONG_ORDINAL: EntitySchema = EntitySchema::new(
    EntityKind::new("Skewed"),
    "SKEWED",
    &[
        ROW_ID,
        ENTITY_ID,
        Property::new(5, ValueType::Text, "title", true, "TITLE"),
    ],
);

static DUPLICATE_COLUMN: EntitySchema = EntitySchema::new(
    EntityKind::new("Twice"),
    "TWICE",
    &[
        ROW_ID,
        ENTITY_ID,
        Property::new(2, ValueType::Text, "title", true, "ENTITY_ID"),
    ],
);

#[test]
fn schema_without_entity_id_is_invalid() {
    let err = MISSING_ENTITY_ID.validate().unwrap_err();
    assert!(matches!(err, ModelError::InvalidSchema { .. }));
    assert!(err.to_string().contains("entity id"));
}

#[test]
fn schema_with_skewed_ordinal_is_invalid() {
    let err = WRONG_ORDINAL.validate().unwrap_err();
    assert!(err.to_string().contains("ordinal 5"));
}

#[test]
fn schema_with_duplicate_column_is_invalid() {
    let err = DUPLICATE_COLUMN.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate column ENTITY_ID"));
}
