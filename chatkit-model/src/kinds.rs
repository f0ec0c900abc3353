//! Chat entity kinds: accounts, conversations, messages and the link
//! between accounts and the conversations they take part in.

use chatkit_types::{ExternalId, RowId, ValueType};
use serde::{Deserialize, Serialize};

use crate::{
    ENTITY_ID, Entity, EntityKind, EntitySchema, JoinEntity, ModelResult, Property, ROW_ID,
    Record, Row,
};

/// A user account as known to the chat server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(skip)]
    pub row_id: Option<RowId>,
    pub external_id: Option<ExternalId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub online: bool,
    /// Unix millis of the last presence update.
    pub last_online: Option<i64>,
}

impl Account {
    pub const NAME: Property = Property::new(2, ValueType::Text, "name", true, "NAME");
    pub const EMAIL: Property = Property::new(3, ValueType::Text, "email", true, "EMAIL");
    pub const ONLINE: Property = Property::new(4, ValueType::Bool, "online", false, "ONLINE");
    pub const LAST_ONLINE: Property =
        Property::new(5, ValueType::Integer, "last_online", true, "LAST_ONLINE");
}

impl Entity for Account {
    fn schema(&self) -> &'static EntitySchema {
        Self::SCHEMA
    }

    fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    fn set_row_id(&mut self, id: Option<RowId>) {
        self.row_id = id;
    }

    fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    fn set_external_id(&mut self, id: Option<ExternalId>) {
        self.external_id = id;
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.row_id.into(),
            self.external_id.clone().into(),
            self.name.clone().into(),
            self.email.clone().into(),
            self.online.into(),
            self.last_online.into(),
        ])
    }

    fn load_row(&mut self, row: &Row) -> ModelResult<()> {
        self.row_id = row.opt_row_id(&ROW_ID)?;
        self.external_id = row.opt_external_id(&ENTITY_ID)?;
        self.name = row.opt_text(&Self::NAME)?;
        self.email = row.opt_text(&Self::EMAIL)?;
        self.online = row.bool(&Self::ONLINE)?;
        self.last_online = row.opt_int(&Self::LAST_ONLINE)?;
        Ok(())
    }
}

impl Record for Account {
    const SCHEMA: &'static EntitySchema = &EntitySchema::new(
        EntityKind::new("Account"),
        "ACCOUNT",
        &[
            ROW_ID,
            ENTITY_ID,
            Account::NAME,
            Account::EMAIL,
            Account::ONLINE,
            Account::LAST_ONLINE,
        ],
    );
}

/// Kind of conversation.
pub mod conversation_type {
    pub const PRIVATE: i64 = 0;
    pub const GROUP: i64 = 1;
    pub const PUBLIC: i64 = 2;
}

/// A chat thread.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(skip)]
    pub row_id: Option<RowId>,
    pub external_id: Option<ExternalId>,
    pub name: Option<String>,
    /// One of the [`conversation_type`] constants.
    pub conversation_type: i64,
    pub created_at: i64,
    #[serde(skip)]
    pub creator_row_id: Option<RowId>,
}

impl Conversation {
    pub const NAME: Property = Property::new(2, ValueType::Text, "name", true, "NAME");
    pub const TYPE: Property =
        Property::new(3, ValueType::Integer, "conversation_type", false, "TYPE");
    pub const CREATED_AT: Property =
        Property::new(4, ValueType::Integer, "created_at", false, "CREATED_AT");
    pub const CREATOR_ID: Property =
        Property::new(5, ValueType::Integer, "creator_row_id", true, "CREATOR_ID");
}

impl Entity for Conversation {
    fn schema(&self) -> &'static EntitySchema {
        Self::SCHEMA
    }

    fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    fn set_row_id(&mut self, id: Option<RowId>) {
        self.row_id = id;
    }

    fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    fn set_external_id(&mut self, id: Option<ExternalId>) {
        self.external_id = id;
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.row_id.into(),
            self.external_id.clone().into(),
            self.name.clone().into(),
            self.conversation_type.into(),
            self.created_at.into(),
            self.creator_row_id.into(),
        ])
    }

    fn load_row(&mut self, row: &Row) -> ModelResult<()> {
        self.row_id = row.opt_row_id(&ROW_ID)?;
        self.external_id = row.opt_external_id(&ENTITY_ID)?;
        self.name = row.opt_text(&Self::NAME)?;
        self.conversation_type = row.int(&Self::TYPE)?;
        self.created_at = row.int(&Self::CREATED_AT)?;
        self.creator_row_id = row.opt_row_id(&Self::CREATOR_ID)?;
        Ok(())
    }
}

impl Record for Conversation {
    const SCHEMA: &'static EntitySchema = &EntitySchema::new(
        EntityKind::new("Conversation"),
        "CONVERSATION",
        &[
            ROW_ID,
            ENTITY_ID,
            Conversation::NAME,
            Conversation::TYPE,
            Conversation::CREATED_AT,
            Conversation::CREATOR_ID,
        ],
    );
}

/// A message posted to a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(skip)]
    pub row_id: Option<RowId>,
    pub external_id: Option<ExternalId>,
    #[serde(skip)]
    pub thread_row_id: Option<RowId>,
    #[serde(skip)]
    pub sender_row_id: Option<RowId>,
    pub text: Option<String>,
    /// Unix millis.
    pub sent_at: i64,
    pub delivered: bool,
}

impl Message {
    pub const THREAD_ID: Property =
        Property::new(2, ValueType::Integer, "thread_row_id", true, "THREAD_ID");
    pub const SENDER_ID: Property =
        Property::new(3, ValueType::Integer, "sender_row_id", true, "SENDER_ID");
    pub const TEXT: Property = Property::new(4, ValueType::Text, "text", true, "TEXT");
    pub const SENT_AT: Property = Property::new(5, ValueType::Integer, "sent_at", false, "SENT_AT");
    pub const DELIVERED: Property =
        Property::new(6, ValueType::Bool, "delivered", false, "DELIVERED");
}

impl Entity for Message {
    fn schema(&self) -> &'static EntitySchema {
        Self::SCHEMA
    }

    fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    fn set_row_id(&mut self, id: Option<RowId>) {
        self.row_id = id;
    }

    fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    fn set_external_id(&mut self, id: Option<ExternalId>) {
        self.external_id = id;
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.row_id.into(),
            self.external_id.clone().into(),
            self.thread_row_id.into(),
            self.sender_row_id.into(),
            self.text.clone().into(),
            self.sent_at.into(),
            self.delivered.into(),
        ])
    }

    fn load_row(&mut self, row: &Row) -> ModelResult<()> {
        self.row_id = row.opt_row_id(&ROW_ID)?;
        self.external_id = row.opt_external_id(&ENTITY_ID)?;
        self.thread_row_id = row.opt_row_id(&Self::THREAD_ID)?;
        self.sender_row_id = row.opt_row_id(&Self::SENDER_ID)?;
        self.text = row.opt_text(&Self::TEXT)?;
        self.sent_at = row.int(&Self::SENT_AT)?;
        self.delivered = row.bool(&Self::DELIVERED)?;
        Ok(())
    }
}

impl Record for Message {
    const SCHEMA: &'static EntitySchema = &EntitySchema::new(
        EntityKind::new("Message"),
        "MESSAGE",
        &[
            ROW_ID,
            ENTITY_ID,
            Message::THREAD_ID,
            Message::SENDER_ID,
            Message::TEXT,
            Message::SENT_AT,
            Message::DELIVERED,
        ],
    );
}

/// Membership of an account in a conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountConversationLink {
    pub row_id: Option<RowId>,
    pub external_id: Option<ExternalId>,
    pub account_row_id: Option<RowId>,
    pub conversation_row_id: Option<RowId>,
}

impl AccountConversationLink {
    pub const ACCOUNT_ID: Property =
        Property::new(2, ValueType::Integer, "account_row_id", true, "ACCOUNT_ID");
    pub const CONVERSATION_ID: Property =
        Property::new(3, ValueType::Integer, "conversation_row_id", true, "CONVERSATION_ID");
}

impl Entity for AccountConversationLink {
    fn schema(&self) -> &'static EntitySchema {
        Self::SCHEMA
    }

    fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    fn set_row_id(&mut self, id: Option<RowId>) {
        self.row_id = id;
    }

    fn external_id(&self) -> Option<&ExternalId> {
        self.external_id.as_ref()
    }

    fn set_external_id(&mut self, id: Option<ExternalId>) {
        self.external_id = id;
    }

    fn to_row(&self) -> Row {
        Row::new(vec![
            self.row_id.into(),
            self.external_id.clone().into(),
            self.account_row_id.into(),
            self.conversation_row_id.into(),
        ])
    }

    fn load_row(&mut self, row: &Row) -> ModelResult<()> {
        self.row_id = row.opt_row_id(&ROW_ID)?;
        self.external_id = row.opt_external_id(&ENTITY_ID)?;
        self.account_row_id = row.opt_row_id(&Self::ACCOUNT_ID)?;
        self.conversation_row_id = row.opt_row_id(&Self::CONVERSATION_ID)?;
        Ok(())
    }
}

impl Record for AccountConversationLink {
    const SCHEMA: &'static EntitySchema = &EntitySchema::new(
        EntityKind::new("AccountConversationLink"),
        "ACCOUNT_CONVERSATION_LINK",
        &[
            ROW_ID,
            ENTITY_ID,
            AccountConversationLink::ACCOUNT_ID,
            AccountConversationLink::CONVERSATION_ID,
        ],
    );
}

impl JoinEntity for AccountConversationLink {
    type Left = Account;
    type Right = Conversation;

    const LEFT: Property = Self::ACCOUNT_ID;
    const RIGHT: Property = Self::CONVERSATION_ID;

    fn join(left: RowId, right: RowId) -> Self {
        Self {
            account_row_id: Some(left),
            conversation_row_id: Some(right),
            ..Self::default()
        }
    }

    fn left(&self) -> Option<RowId> {
        self.account_row_id
    }

    fn right(&self) -> Option<RowId> {
        self.conversation_row_id
    }
}
