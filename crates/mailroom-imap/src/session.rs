//! The session contract consumed by [`Connection`](crate::Connection).
//!
//! A `Session` is one authenticated, stateful IMAP session. It executes a
//! single command at a time and has at most one selected mailbox. Every
//! mailbox name passed in is fully qualified (namespace prefix included).
//! Connecting, authenticating and speaking the wire protocol are the
//! implementor's business.

use crate::error::SessionError;
use crate::types::{
    CloseFlags, MailboxDescriptor, MailboxInfo, MailboxStatus, MessageId, OverviewRecord,
    SessionStatus, Uid, UidSet,
};

/// Result type for session commands.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// An authenticated IMAP session.
pub trait Session {
    /// Returns true while the session can still carry commands.
    fn is_alive(&self) -> bool;

    /// Lists mailboxes under `reference` matching `pattern` (LIST).
    fn list_mailboxes(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> SessionResult<Vec<MailboxDescriptor>>;

    /// Selects (or re-opens) a mailbox.
    fn select(&mut self, mailbox: &str) -> SessionResult<MailboxStatus>;

    /// Reports the currently selected mailbox (CHECK).
    ///
    /// Fails when nothing is selected.
    fn check(&mut self) -> SessionResult<SessionStatus>;

    /// Creates a mailbox.
    fn create(&mut self, mailbox: &str) -> SessionResult<()>;

    /// Deletes a mailbox.
    fn delete(&mut self, mailbox: &str) -> SessionResult<()>;

    /// Number of messages in the selected mailbox.
    fn message_count(&mut self) -> SessionResult<u32>;

    /// Number of recent messages in the selected mailbox.
    fn recent_count(&mut self) -> SessionResult<u32>;

    /// Status snapshot of the selected mailbox.
    fn mailbox_info(&mut self) -> SessionResult<MailboxInfo>;

    /// Searches the selected mailbox (UID SEARCH).
    ///
    /// `Ok(None)` means the server answered but nothing matched.
    fn uid_search(&mut self, query: &str) -> SessionResult<Option<Vec<Uid>>>;

    /// Fetches message summaries by UID from the selected mailbox.
    ///
    /// `Ok(None)` means the server answered without any records.
    fn uid_fetch_overview(&mut self, uids: &UidSet) -> SessionResult<Option<Vec<OverviewRecord>>>;

    /// Fetches the full raw text of a message in the selected mailbox.
    fn fetch_raw(&mut self, id: MessageId) -> SessionResult<Vec<u8>>;

    /// Appends a message to a mailbox; no selection needed.
    fn append(&mut self, mailbox: &str, message: &[u8]) -> SessionResult<()>;

    /// Permanently removes messages flagged for deletion in the selected
    /// mailbox.
    fn expunge(&mut self) -> SessionResult<()>;

    /// Ends the session.
    fn close(&mut self, flags: CloseFlags) -> SessionResult<()>;
}
