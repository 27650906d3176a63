//! Mailbox handles.
//!
//! A [`Mailbox`] is a cheap handle naming one mailbox on a [`Connection`]. It
//! holds no server state. The session can only have one mailbox selected at
//! a time and other handles may select theirs at any point, so every
//! operation that needs the mailbox selected asks the session what it has
//! open and re-selects when it is something else.

use std::sync::Arc;

use crate::connection::Connection;
use crate::directory::DirectoryEntry;
use crate::message::{Message, MessageIterator};
use crate::search::SearchExpression;
use crate::session::Session;
use crate::types::{MessageId, SeqNum, UidSet};
use crate::{Error, Result};

/// An IMAP mailbox (commonly referred to as a 'folder').
pub struct Mailbox<'c, S> {
    connection: &'c Connection<S>,
    full_name: String,
    name: String,
    wire_name: Arc<str>,
    lossy: bool,
}

impl<S> std::fmt::Debug for Mailbox<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("name", &self.name)
            .field("full_name", &self.full_name)
            .field("wire_name", &self.wire_name)
            .finish_non_exhaustive()
    }
}

impl<S> Clone for Mailbox<'_, S> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection,
            full_name: self.full_name.clone(),
            name: self.name.clone(),
            wire_name: Arc::clone(&self.wire_name),
            lossy: self.lossy,
        }
    }
}

impl<'c, S: Session> Mailbox<'c, S> {
    /// Builds a handle. The caller has already checked the mailbox exists.
    pub(crate) fn new(
        connection: &'c Connection<S>,
        full_name: String,
        entry: &DirectoryEntry,
    ) -> Self {
        let config = connection.config();
        let name = full_name
            .strip_prefix(config.namespace.as_str())
            .unwrap_or_else(|| short_name(&full_name, config.namespace_delimiter))
            .to_string();
        Self {
            connection,
            full_name,
            name,
            wire_name: Arc::from(entry.wire_name.as_str()),
            lossy: entry.lossy,
        }
    }

    /// Returns the short mailbox name, without namespace prefix.
    ///
    /// This is the name the mailbox was looked up or listed under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace prefix followed by the short name.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Returns the name used when talking to the session, exactly as the
    /// server listed it.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        &self.wire_name
    }

    /// Returns true if the listed name could not be fully decoded.
    #[must_use]
    pub const fn is_lossy(&self) -> bool {
        self.lossy
    }

    /// Returns the connection this mailbox belongs to.
    #[must_use]
    pub const fn connection(&self) -> &'c Connection<S> {
        self.connection
    }

    /// Number of messages in this mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or counted.
    pub fn count(&self) -> Result<u32> {
        self.connection
            .with_selected(&self.wire_name, S::message_count)
    }

    /// Searches this mailbox by UID.
    ///
    /// Without an expression every message matches. A search the server
    /// answers without matches gives an empty iterator.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or the search
    /// command fails.
    pub fn messages(&self, search: Option<&SearchExpression>) -> Result<MessageIterator<'c, S>> {
        let query = search.map_or_else(|| SearchExpression::all().to_string(), ToString::to_string);
        let uids = self
            .connection
            .with_selected(&self.wire_name, |session| session.uid_search(&query))?
            .unwrap_or_default();

        tracing::debug!(mailbox = %self.name, query = %query, found = uids.len(), "Searched mailbox");
        Ok(self.iterator(uids.into_iter().map(MessageId::Uid).collect()))
    }

    /// Fetches message summaries for a UID range and returns the messages
    /// that carried a UID.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or the fetch
    /// command fails.
    pub fn fetch_overview(&self, uids: &UidSet) -> Result<MessageIterator<'c, S>> {
        let records = self
            .connection
            .with_selected(&self.wire_name, |session| session.uid_fetch_overview(uids))?
            .unwrap_or_default();

        let ids = records
            .iter()
            .filter_map(|record| record.uid)
            .map(MessageId::Uid)
            .collect();
        Ok(self.iterator(ids))
    }

    /// Re-opens this mailbox on the session, ignoring failures.
    pub fn reopen(&self) {
        let result = self
            .connection
            .with_session(|session| session.select(&self.wire_name));
        if let Err(e) = result {
            tracing::warn!(mailbox = %self.name, ?e, "Reopen failed");
        }
    }

    /// Gets a message by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected.
    pub fn message(&self, number: SeqNum) -> Result<Message<'c, S>> {
        self.connection.with_selected(&self.wire_name, |_| Ok(()))?;
        Ok(Message::new(
            self.connection,
            Arc::clone(&self.wire_name),
            MessageId::Seq(number),
        ))
    }

    /// Iterates over every message in this mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or searched.
    pub fn iter(&self) -> Result<MessageIterator<'c, S>> {
        self.messages(None)
    }

    /// Deletes this mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxDeleteFailed`] if the server refuses.
    pub fn delete(&self) -> Result<()> {
        self.connection.delete_mailbox(self)
    }

    /// Permanently removes messages flagged for deletion.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or expunged.
    pub fn expunge(&self) -> Result<&Self> {
        self.connection
            .with_selected(&self.wire_name, S::expunge)?;
        Ok(self)
    }

    /// Appends a raw RFC 822 message to this mailbox.
    ///
    /// The mailbox does not need to be selected. Returns whether the server
    /// accepted the message.
    pub fn add_message(&self, message: impl AsRef<[u8]>) -> bool {
        let result = self
            .connection
            .with_session(|session| session.append(&self.wire_name, message.as_ref()));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(mailbox = %self.name, ?e, "Append failed");
                false
            }
        }
    }

    fn iterator(&self, ids: Vec<MessageId>) -> MessageIterator<'c, S> {
        MessageIterator::new(self.connection, Arc::clone(&self.wire_name), ids)
    }
}

/// Everything after the first `delimiter`, or the whole name without one.
///
/// Only used for names that do not start with the namespace prefix.
fn short_name(full_name: &str, delimiter: char) -> &str {
    full_name
        .split_once(delimiter)
        .map_or(full_name, |(_, rest)| rest)
}

/// Selects `mailbox` unless the session already has it selected.
pub(crate) fn ensure_selected<S: Session + ?Sized>(session: &mut S, mailbox: &str) -> Result<()> {
    let current = match session.check() {
        Ok(status) if status.mailbox == mailbox => return Ok(()),
        Ok(status) => Some(status.mailbox),
        Err(_) => None,
    };

    tracing::debug!(mailbox, ?current, "Selecting mailbox");
    session
        .select(mailbox)
        .map(drop)
        .map_err(|source| Error::SelectFailed {
            mailbox: mailbox.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_after_first_marker() {
        assert_eq!(short_name("{imap.example.com}INBOX", '}'), "INBOX");
        assert_eq!(short_name("{a}b}c", '}'), "b}c");
    }

    #[test]
    fn short_name_without_marker() {
        assert_eq!(short_name("INBOX", '}'), "INBOX");
    }
}
