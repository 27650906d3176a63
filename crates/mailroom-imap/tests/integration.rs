//! Integration tests for the mailbox layer.
//!
//! These tests drive a [`Connection`] over the in-memory session and check
//! both the results and the commands that reached the session.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mailroom_imap::memory::{Command, MemorySession, Operation};
use mailroom_imap::{
    CloseFlags, Connection, ConnectionConfig, Criterion, Error, SearchExpression, SeqNum, Uid,
    UidSet,
};

const NS: &str = "{imap.example.com}";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn wire(name: &str) -> String {
    format!("{NS}{name}")
}

/// INBOX with three messages, plus Sent/Items and an empty Drafts.
fn session() -> MemorySession {
    let mut session = MemorySession::new()
        .with_mailbox(wire("INBOX"))
        .with_mailbox(wire("Sent,Items"))
        .with_mailbox(wire("Drafts"));
    for subject in ["one", "two", "three"] {
        session.deliver(
            &wire("INBOX"),
            format!("Subject: {subject}\r\nFrom: alice@example.com\r\n\r\nbody {subject}"),
        );
    }
    session.deliver(&wire("Sent,Items"), "Subject: sent\r\n\r\nsent body");
    session
}

fn connect(session: MemorySession) -> Connection<MemorySession> {
    connect_with(session, NS)
}

fn connect_with(session: MemorySession, namespace: &str) -> Connection<MemorySession> {
    init_tracing();
    Connection::new(session, ConnectionConfig::new(namespace)).unwrap()
}

fn selects(connection: &Connection<MemorySession>) -> Vec<String> {
    connection.with_session(|s| s.selects().into_iter().map(String::from).collect())
}

fn list_count(connection: &Connection<MemorySession>) -> usize {
    connection.with_session(|s| {
        s.commands()
            .iter()
            .filter(|c| matches!(c, Command::List(..)))
            .count()
    })
}

// === Directory ===

#[test]
fn test_names_are_decoded_and_unprefixed() {
    let connection = connect(session());

    assert_eq!(
        connection.mailbox_names().unwrap(),
        ["INBOX", "Sent/Items", "Drafts"]
    );

    let sent = connection.mailbox("Sent/Items").unwrap();
    assert_eq!(sent.name(), "Sent/Items");
    assert_eq!(sent.full_name(), "{imap.example.com}Sent/Items");
    assert_eq!(sent.wire_name(), "{imap.example.com}Sent,Items");
}

#[test]
fn test_modified_utf7_names() {
    let session = MemorySession::new()
        .with_mailbox(wire("Entw&APw-rfe"))
        .with_mailbox(wire("Tom &- Jerry"))
        .with_mailbox(wire("Broken&AOQ"));
    let connection = connect(session);

    assert_eq!(
        connection.mailbox_names().unwrap(),
        ["Entwürfe", "Tom & Jerry", "Broken"]
    );

    let broken = connection.mailbox("Broken").unwrap();
    assert!(broken.is_lossy());
    assert!(!connection.mailbox("Entwürfe").unwrap().is_lossy());
}

#[test]
fn test_directory_is_listed_once() {
    let connection = connect(session());

    connection.mailbox_names().unwrap();
    connection.mailboxes().unwrap();
    assert!(connection.has_mailbox("INBOX").unwrap());
    connection.mailbox("Drafts").unwrap();

    assert_eq!(list_count(&connection), 1);
    assert_eq!(
        connection.with_session(|s| s.commands()[0].clone()),
        Command::List(NS.into(), "*".into())
    );
}

#[test]
fn test_has_mailbox_matches_listing() {
    let connection = connect(session());
    let names = connection.mailbox_names().unwrap();

    for candidate in ["INBOX", "Sent/Items", "Drafts", "Sent,Items", "inbox", "Trash", ""] {
        assert_eq!(
            connection.has_mailbox(candidate).unwrap(),
            names.iter().any(|n| n == candidate),
            "{candidate}"
        );
    }
}

#[test]
fn test_mailboxes_in_server_order() {
    let connection = connect(session());
    let mailboxes = connection.mailboxes().unwrap();
    let names: Vec<_> = mailboxes.iter().map(|m| m.name()).collect();
    assert_eq!(names, ["INBOX", "Sent/Items", "Drafts"]);
}

#[test]
fn test_unknown_mailbox() {
    let connection = connect(session());
    let err = connection.mailbox("Trash").unwrap_err();
    assert!(matches!(err, Error::MailboxNotFound { ref name } if name == "Trash"));
}

#[test]
fn test_list_failure_leaves_directory_unloaded() {
    let mut session = session();
    session.fail(Operation::List);
    let connection = connect(session);

    assert!(connection.mailbox_names().is_err());

    connection.with_session(|s| s.recover(Operation::List));
    assert_eq!(connection.mailbox_names().unwrap().len(), 3);
}

#[test]
fn test_create_mailbox() {
    let connection = connect(session());
    assert!(!connection.has_mailbox("Archive").unwrap());

    let archive = connection.create_mailbox("Archive").unwrap();
    assert_eq!(archive.name(), "Archive");
    assert_eq!(archive.full_name(), "{imap.example.com}Archive");
    assert!(connection.has_mailbox("Archive").unwrap());
    assert_eq!(list_count(&connection), 2);
}

#[test]
fn test_create_mailbox_encodes_name() {
    let connection = connect(session());

    let drafts = connection.create_mailbox("Entwürfe/Alt").unwrap();
    assert_eq!(drafts.wire_name(), "{imap.example.com}Entw&APw-rfe,Alt");
    assert!(
        connection.with_session(|s| s.contains("{imap.example.com}Entw&APw-rfe,Alt"))
    );
}

#[test]
fn test_create_failure_keeps_directory() {
    let mut session = session();
    session.fail(Operation::Create);
    let connection = connect(session);
    let before = connection.mailbox_names().unwrap();

    let err = connection.create_mailbox("Archive").unwrap_err();
    assert!(matches!(err, Error::MailboxCreateFailed { .. }));
    assert_eq!(
        err.to_string(),
        "Can not create 'Archive' mailbox at '{imap.example.com}'"
    );

    assert_eq!(connection.mailbox_names().unwrap(), before);
    assert_eq!(list_count(&connection), 1);
}

#[test]
fn test_delete_mailbox() {
    let connection = connect(session());

    connection.mailbox("Drafts").unwrap().delete().unwrap();

    assert!(!connection.has_mailbox("Drafts").unwrap());
    assert_eq!(connection.mailbox_names().unwrap(), ["INBOX", "Sent/Items"]);
    assert_eq!(list_count(&connection), 2);
}

#[test]
fn test_delete_failure_keeps_directory() {
    let mut session = session();
    session.fail(Operation::Delete);
    let connection = connect(session);
    let drafts = connection.mailbox("Drafts").unwrap();

    let err = drafts.delete().unwrap_err();
    assert!(matches!(err, Error::MailboxDeleteFailed { ref mailbox, .. } if mailbox == "Drafts"));
    assert!(connection.has_mailbox("Drafts").unwrap());
    assert_eq!(list_count(&connection), 1);
}

#[test]
fn test_refresh_lists_again() {
    let connection = connect(session());
    connection.mailbox_names().unwrap();

    connection.with_session(|s| s.add_mailbox(wire("Trash")));
    assert!(!connection.has_mailbox("Trash").unwrap());

    connection.refresh();
    assert!(connection.has_mailbox("Trash").unwrap());
}

// === Selection ===

#[test]
fn test_alternating_mailboxes_reselect() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();
    let sent = connection.mailbox("Sent/Items").unwrap();

    assert_eq!(inbox.count().unwrap(), 3);
    assert_eq!(sent.count().unwrap(), 1);
    assert_eq!(inbox.count().unwrap(), 3);

    assert_eq!(
        selects(&connection),
        [wire("INBOX"), wire("Sent,Items"), wire("INBOX")]
    );
}

#[test]
fn test_same_mailbox_selected_once() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    inbox.count().unwrap();
    inbox.iter().unwrap();
    inbox.expunge().unwrap();

    assert_eq!(selects(&connection), [wire("INBOX")]);
    assert_eq!(
        connection.selected_mailbox().as_deref(),
        Some("{imap.example.com}INBOX")
    );
}

#[test]
fn test_select_failure_is_reported() {
    let mut session = session();
    session.fail(Operation::Select);
    let connection = connect(session);
    let inbox = connection.mailbox("INBOX").unwrap();

    let err = inbox.count().unwrap_err();
    assert!(matches!(err, Error::SelectFailed { ref mailbox, .. } if mailbox == &wire("INBOX")));
}

#[test]
fn test_reopen_ignores_failure() {
    let mut session = session();
    session.fail(Operation::Select);
    let connection = connect(session);
    let inbox = connection.mailbox("INBOX").unwrap();

    inbox.reopen();
    assert_eq!(connection.selected_mailbox(), None);

    connection.with_session(|s| s.recover(Operation::Select));
    inbox.reopen();
    assert_eq!(connection.selected_mailbox(), Some(wire("INBOX")));
}

#[test]
fn test_shared_connection_across_threads() {
    let connection = connect(session());

    std::thread::scope(|scope| {
        for (name, expected) in [("INBOX", 3), ("Sent/Items", 1)] {
            let connection = &connection;
            scope.spawn(move || {
                let mailbox = connection.mailbox(name).unwrap();
                for _ in 0..50 {
                    assert_eq!(mailbox.count().unwrap(), expected);
                }
            });
        }
    });
}

// === Messages ===

#[test]
fn test_iter_matches_search_all() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    let all: Vec<_> = inbox.iter().unwrap().map(|m| m.id()).collect();
    let explicit: Vec<_> = inbox
        .messages(Some(&SearchExpression::all()))
        .unwrap()
        .map(|m| m.id())
        .collect();

    assert_eq!(all.len(), 3);
    assert_eq!(all, explicit);
    assert!(all.iter().all(|id| id.is_uid()));
}

#[test]
fn test_search_without_matches_is_empty() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    let deleted = SearchExpression::from(Criterion::Deleted);
    let mut messages = inbox.messages(Some(&deleted)).unwrap();
    assert!(messages.is_empty());
    assert!(messages.next().is_none());
}

#[test]
fn test_search_by_flag() {
    let mut session = session();
    session.mark_seen(&wire("INBOX"), Uid::new(2).unwrap());
    let connection = connect(session);
    let inbox = connection.mailbox("INBOX").unwrap();

    let unseen = SearchExpression::new().and(Criterion::Unseen);
    let uids: Vec<_> = inbox
        .messages(Some(&unseen))
        .unwrap()
        .map(|m| m.id().value())
        .collect();
    assert_eq!(uids, [1, 3]);

    assert!(connection.with_session(|s| {
        s.commands()
            .contains(&Command::Search("UNSEEN".into()))
    }));
}

#[test]
fn test_search_rejected_by_server() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    let query = SearchExpression::from(Criterion::Subject("report".into()));
    assert!(matches!(
        inbox.messages(Some(&query)),
        Err(Error::Session(_))
    ));
}

#[test]
fn test_fetch_overview() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    let range = UidSet::range(Uid::new(2).unwrap(), Uid::new(3).unwrap());
    let ids: Vec<_> = inbox
        .fetch_overview(&range)
        .unwrap()
        .map(|m| m.id().value())
        .collect();
    assert_eq!(ids, [2, 3]);

    let beyond = UidSet::single(Uid::new(42).unwrap());
    assert_eq!(inbox.fetch_overview(&beyond).unwrap().len(), 0);
}

#[test]
fn test_message_by_sequence_number() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();

    let message = inbox.message(SeqNum::new(2).unwrap()).unwrap();
    assert_eq!(message.mailbox(), wire("INBOX"));
    let raw = message.fetch_raw().unwrap();
    assert!(raw.starts_with(b"Subject: two"));
}

#[test]
fn test_fetch_reselects_mailbox() {
    let connection = connect(session());
    let inbox = connection.mailbox("INBOX").unwrap();
    let sent = connection.mailbox("Sent/Items").unwrap();

    let first = inbox.iter().unwrap().next().unwrap();
    sent.count().unwrap();

    let raw = first.fetch_raw().unwrap();
    assert!(raw.starts_with(b"Subject: one"));
    assert_eq!(
        selects(&connection),
        [wire("INBOX"), wire("Sent,Items"), wire("INBOX")]
    );
}

#[test]
fn test_expunge_removes_deleted() {
    let mut session = session();
    session.mark_deleted(&wire("INBOX"), Uid::new(1).unwrap());
    let connection = connect(session);
    let inbox = connection.mailbox("INBOX").unwrap();

    assert_eq!(inbox.expunge().unwrap().count().unwrap(), 2);
}

#[test]
fn test_add_message_does_not_select() {
    let connection = connect(session());
    let drafts = connection.mailbox("Drafts").unwrap();

    assert!(drafts.add_message("Subject: draft\r\n\r\nwip"));

    assert!(selects(&connection).is_empty());
    assert_eq!(
        connection.with_session(|s| s.stored_messages(&wire("Drafts")).len()),
        1
    );
}

#[test]
fn test_add_message_failure() {
    let mut session = session();
    session.fail(Operation::Append);
    let connection = connect(session);

    assert!(!connection.mailbox("Drafts").unwrap().add_message(b"x".as_slice()));
}

// === Connection ===

#[test]
fn test_dead_session_is_rejected() {
    let mut session = session();
    session.terminate();

    let err = Connection::new(session, ConnectionConfig::new(NS)).unwrap_err();
    assert!(matches!(err, Error::InvalidSessionHandle));
}

#[test]
fn test_connection_counts_follow_selection() {
    let connection = connect(session());
    assert!(connection.count().is_err());

    connection.mailbox("INBOX").unwrap().reopen();
    assert_eq!(connection.count().unwrap(), 3);
    assert_eq!(connection.count_messages().unwrap(), 3);
    assert_eq!(connection.count_recent().unwrap(), 0);
}

#[test]
fn test_info_snapshot() {
    let mut session = session();
    session.mark_seen(&wire("INBOX"), Uid::new(1).unwrap());
    session.mark_deleted(&wire("INBOX"), Uid::new(3).unwrap());
    let connection = connect(session);
    connection.mailbox("INBOX").unwrap().reopen();

    let info = connection.info().unwrap();
    assert_eq!(info["mailbox"], wire("INBOX"));
    assert_eq!(info["messages"], "3");
    assert_eq!(info["unread"], "2");
    assert_eq!(info["deleted"], "1");
}

#[test]
fn test_close_passes_flags() {
    let connection = connect(session());
    assert!(connection.close(CloseFlags::EXPUNGE));
}

#[test]
fn test_close_failure() {
    let mut session = session();
    session.fail(Operation::Close);
    let connection = connect(session);
    assert!(!connection.close(CloseFlags::NONE));
}

#[test]
fn test_server_namespace_config() {
    let config = ConnectionConfig::for_server("imap.example.com", None, mailroom_imap::Security::Implicit);
    let session = MemorySession::new().with_mailbox("{imap.example.com:993/imap/ssl}INBOX");
    let connection = Connection::new(session, config).unwrap();

    let inbox = connection.mailbox("INBOX").unwrap();
    assert_eq!(inbox.name(), "INBOX");
    assert_eq!(inbox.full_name(), "{imap.example.com:993/imap/ssl}INBOX");
}

#[test]
fn test_dotted_namespace_names() {
    let session = MemorySession::new()
        .with_mailbox("INBOX.Sent")
        .with_mailbox("INBOX.Drafts");
    let connection = connect_with(session, "INBOX.");

    assert_eq!(connection.mailbox_names().unwrap(), ["Sent", "Drafts"]);

    let sent = connection.mailbox("Sent").unwrap();
    assert_eq!(sent.name(), "Sent");
    assert_eq!(sent.full_name(), "INBOX.Sent");
    assert!(connection.has_mailbox(sent.name()).unwrap());

    for mailbox in connection.mailboxes().unwrap() {
        assert!(connection.has_mailbox(mailbox.name()).unwrap());
    }
}

#[test]
fn test_empty_namespace_keeps_whole_name() {
    let mut session = MemorySession::new()
        .with_mailbox("INBOX")
        .with_mailbox("Work}Notes");
    session.fail(Operation::Delete);
    let connection = connect_with(session, "");

    let notes = connection.mailbox("Work}Notes").unwrap();
    assert_eq!(notes.name(), "Work}Notes");
    assert_eq!(notes.full_name(), "Work}Notes");
    assert!(connection.has_mailbox(notes.name()).unwrap());

    let err = notes.delete().unwrap_err();
    assert!(matches!(err, Error::MailboxDeleteFailed { ref mailbox, .. } if mailbox == "Work}Notes"));
}
