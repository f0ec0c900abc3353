use chatkit_model::kinds::{Account, AccountConversationLink, Conversation, Message};
use chatkit_model::{ENTITY_ID, Entity, JoinEntity, ModelError, ROW_ID, Record, Row};
use chatkit_types::{ExternalId, RowId, Value};
use pretty_assertions::assert_eq;

fn sample_message() -> Message {
    Message {
        row_id: Some(RowId::new(3)),
        external_id: Some(ExternalId::new("m-1")),
        thread_row_id: Some(RowId::new(7)),
        sender_row_id: None,
        text: Some("hello".into()),
        sent_at: 1_700_000_000_000,
        delivered: true,
    }
}

// ── Row conversion ───────────────────────────────────────────────

#[test]
fn to_row_follows_schema_order() {
    let row = sample_message().to_row();
    assert_eq!(row.len(), Message::SCHEMA.properties.len());
    assert_eq!(row.get(&ROW_ID).unwrap(), &Value::Integer(3));
    assert_eq!(row.get(&ENTITY_ID).unwrap(), &Value::Text("m-1".into()));
    assert_eq!(row.get(&Message::SENDER_ID).unwrap(), &Value::Null);
    assert_eq!(row.get(&Message::DELIVERED).unwrap(), &Value::Bool(true));
}

#[test]
fn from_row_restores_fields() {
    let original = sample_message();
    let restored = Message::from_row(&original.to_row()).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn from_row_accepts_sqlite_booleans() {
    let mut row = sample_message().to_row();
    row.set(&Message::DELIVERED, 0).unwrap();
    let restored = Message::from_row(&row).unwrap();
    assert!(!restored.delivered);
}

#[test]
fn non_nullable_null_is_rejected() {
    let mut row = Account::default().to_row();
    row.set(&Account::ONLINE, Value::Null).unwrap();
    let err = Account::from_row(&row).unwrap_err();
    assert!(matches!(err, ModelError::UnexpectedNull("ONLINE")));
}

#[test]
fn type_mismatch_is_reported() {
    let mut row = Conversation::default().to_row();
    row.set(&Conversation::CREATED_AT, "yesterday").unwrap();
    let err = Conversation::from_row(&row).unwrap_err();
    assert!(matches!(err, ModelError::TypeMismatch { column: "CREATED_AT", .. }));
}

#[test]
fn short_row_is_rejected() {
    let row = Row::new(vec![Value::Integer(1)]);
    let err = Account::from_row(&row).unwrap_err();
    assert!(matches!(err, ModelError::MissingColumn { column: "ENTITY_ID", len: 1 }));
}

// ── Identifiers ──────────────────────────────────────────────────

#[test]
fn identifiers_are_settable_through_the_trait() {
    let mut account = Account::default();
    let entity: &mut dyn Entity = &mut account;
    entity.set_row_id(Some(RowId::new(11)));
    entity.set_external_id(Some(ExternalId::new("abc123")));
    assert_eq!(entity.row_id(), Some(RowId::new(11)));
    assert_eq!(entity.external_id().map(ExternalId::as_str), Some("abc123"));
    assert_eq!(entity.kind().as_str(), "Account");
}

// ── Downcasting ──────────────────────────────────────────────────

#[test]
fn downcast_to_concrete_kind() {
    let boxed: Box<dyn Entity> = Box::new(sample_message());
    assert!(boxed.is::<Message>());
    assert!(boxed.downcast_ref::<Account>().is_none());
    let message = boxed.downcast::<Message>().unwrap();
    assert_eq!(message.text.as_deref(), Some("hello"));
}

#[test]
fn downcast_to_wrong_kind_is_none() {
    let boxed: Box<dyn Entity> = Box::new(Account::default());
    assert!(boxed.downcast::<Conversation>().is_none());
}

// ── Join records ─────────────────────────────────────────────────

#[test]
fn join_record_references_both_endpoints() {
    let link = AccountConversationLink::join(RowId::new(1), RowId::new(2));
    assert_eq!(link.left(), Some(RowId::new(1)));
    assert_eq!(link.right(), Some(RowId::new(2)));
    assert_eq!(link.row_id, None);
    assert_eq!(AccountConversationLink::LEFT, AccountConversationLink::ACCOUNT_ID);
    assert_eq!(AccountConversationLink::RIGHT, AccountConversationLink::CONVERSATION_ID);
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn serialization_skips_internal_ids() {
    let json = serde_json::to_value(sample_message()).unwrap();
    assert_eq!(json["external_id"], "m-1");
    assert!(json.get("row_id").is_none());
    assert!(json.get("thread_row_id").is_none());
}
