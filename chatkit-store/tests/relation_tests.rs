use chatkit_model::kinds::{Account, AccountConversationLink, Conversation, conversation_type};
use chatkit_model::{EntityRegistry, JoinEntity};
use chatkit_store::{DeleteOutcome, EntityManager, SessionConfig, StoreError};
use pretty_assertions::assert_eq;

type Membership = AccountConversationLink;

fn manager() -> EntityManager {
    EntityManager::open(SessionConfig::in_memory(), EntityRegistry::chat().unwrap()).unwrap()
}

fn stored_pair(manager: &EntityManager) -> (Account, Conversation) {
    let account = manager.fetch_or_create::<Account>("acc-1").unwrap();
    let mut conversation = manager.fetch_or_create::<Conversation>("conv-1").unwrap();
    conversation.conversation_type = conversation_type::PRIVATE;
    manager.update(&conversation).unwrap();
    (account, conversation)
}

#[test]
fn link_stores_both_row_ids() {
    let manager = manager();
    let (account, conversation) = stored_pair(&manager);

    let link = manager.link::<Membership>(&account, &conversation).unwrap();
    assert!(link.row_id.is_some());
    assert_eq!(link.left(), account.row_id);
    assert_eq!(link.right(), conversation.row_id);

    let rows = manager.linked_rows::<Membership>(&account).unwrap();
    assert_eq!(rows, vec![link]);
}

#[test]
fn link_then_unlink() {
    let manager = manager();
    let (account, conversation) = stored_pair(&manager);

    manager.link::<Membership>(&account, &conversation).unwrap();
    let outcome = manager.unlink::<Membership>(&account, &conversation).unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(manager.linked_rows::<Membership>(&account).unwrap().is_empty());
}

#[test]
fn unlink_without_link_is_absent() {
    let manager = manager();
    let (account, conversation) = stored_pair(&manager);

    let before = manager.session().stats().cache_clears;
    let outcome = manager.unlink::<Membership>(&account, &conversation).unwrap();
    assert_eq!(outcome, DeleteOutcome::Absent);
    assert_eq!(manager.session().stats().cache_clears, before);
}

#[test]
fn linking_twice_creates_two_rows() {
    let manager = manager();
    let (account, conversation) = stored_pair(&manager);

    manager.link::<Membership>(&account, &conversation).unwrap();
    manager.link::<Membership>(&account, &conversation).unwrap();
    assert_eq!(manager.linked_rows::<Membership>(&account).unwrap().len(), 2);

    manager.unlink::<Membership>(&account, &conversation).unwrap();
    assert_eq!(manager.linked_rows::<Membership>(&account).unwrap().len(), 1);
}

#[test]
fn linked_rows_only_for_the_given_account() {
    let manager = manager();
    let (alice, conversation) = stored_pair(&manager);
    let bob = manager.fetch_or_create::<Account>("acc-2").unwrap();

    manager.link::<Membership>(&alice, &conversation).unwrap();
    manager.link::<Membership>(&bob, &conversation).unwrap();

    let alice_links = manager.linked_rows::<Membership>(&alice).unwrap();
    assert_eq!(alice_links.len(), 1);
    assert_eq!(alice_links[0].left(), alice.row_id);
}

#[test]
fn unsaved_endpoint_is_rejected() {
    let manager = manager();
    let (account, _) = stored_pair(&manager);
    let draft = Conversation::default();

    let err = manager.link::<Membership>(&account, &draft).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArguments(_)));
}
