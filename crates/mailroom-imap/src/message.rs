//! Message handles and lazy result sets.

use std::sync::Arc;

use crate::Result;
use crate::connection::Connection;
use crate::session::Session;
use crate::types::MessageId;

/// A message in a mailbox, addressed by sequence number or UID.
///
/// The handle is lazy: nothing is fetched until asked for.
pub struct Message<'c, S> {
    connection: &'c Connection<S>,
    mailbox: Arc<str>,
    id: MessageId,
}

impl<S> std::fmt::Debug for Message<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("mailbox", &self.mailbox)
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl<'c, S: Session> Message<'c, S> {
    pub(crate) fn new(connection: &'c Connection<S>, mailbox: Arc<str>, id: MessageId) -> Self {
        Self {
            connection,
            mailbox,
            id,
        }
    }

    /// Returns the identifier of this message.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns the wire name of the mailbox holding this message.
    #[must_use]
    pub fn mailbox(&self) -> &str {
        &self.mailbox
    }

    /// Fetches the raw RFC 822 text, selecting the mailbox first if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox cannot be selected or the fetch fails.
    pub fn fetch_raw(&self) -> Result<Vec<u8>> {
        self.connection
            .with_selected(&self.mailbox, |session| session.fetch_raw(self.id))
    }
}

/// Lazy sequence of messages, in the order the server returned them.
pub struct MessageIterator<'c, S> {
    connection: &'c Connection<S>,
    mailbox: Arc<str>,
    ids: std::vec::IntoIter<MessageId>,
}

impl<S> std::fmt::Debug for MessageIterator<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageIterator")
            .field("mailbox", &self.mailbox)
            .field("remaining", &self.ids.as_slice())
            .finish_non_exhaustive()
    }
}

impl<'c, S: Session> MessageIterator<'c, S> {
    pub(crate) fn new(connection: &'c Connection<S>, mailbox: Arc<str>, ids: Vec<MessageId>) -> Self {
        Self {
            connection,
            mailbox,
            ids: ids.into_iter(),
        }
    }

    /// Identifiers not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> &[MessageId] {
        self.ids.as_slice()
    }

    /// Returns true if no messages are left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.as_slice().is_empty()
    }
}

impl<'c, S: Session> Iterator for MessageIterator<'c, S> {
    type Item = Message<'c, S>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.ids.next()?;
        Some(Message::new(self.connection, Arc::clone(&self.mailbox), id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

impl<S: Session> ExactSizeIterator for MessageIterator<'_, S> {}
