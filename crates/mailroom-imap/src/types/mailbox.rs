//! Mailbox types exchanged with a session.

use std::collections::BTreeMap;

use super::{SeqNum, Uid};

/// One entry of a mailbox listing, as the server reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MailboxDescriptor {
    /// Fully-qualified name in modified UTF-7, namespace prefix included.
    pub name: String,
}

impl MailboxDescriptor {
    /// Creates a descriptor from a raw listed name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Mailbox status returned when a mailbox is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Next UID to be assigned.
    pub uid_next: Option<Uid>,
}

/// Result of asking the session what it currently has open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    /// Fully-qualified name of the selected mailbox.
    pub mailbox: String,
    /// Number of messages in it.
    pub messages: u32,
    /// Number of recent messages in it.
    pub recent: u32,
}

/// Status snapshot of the currently selected mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MailboxInfo {
    /// Fully-qualified mailbox name.
    pub mailbox: String,
    /// Number of messages.
    pub messages: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Number of unread messages.
    pub unread: u32,
    /// Number of messages flagged for deletion.
    pub deleted: u32,
    /// Total size of all messages in bytes.
    pub size: u64,
}

impl MailboxInfo {
    /// Flattens the snapshot into key/value pairs.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("mailbox".to_string(), self.mailbox.clone()),
            ("messages".to_string(), self.messages.to_string()),
            ("recent".to_string(), self.recent.to_string()),
            ("unread".to_string(), self.unread.to_string()),
            ("deleted".to_string(), self.deleted.to_string()),
            ("size".to_string(), self.size.to_string()),
        ])
    }
}

/// Summary of one message from an overview fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewRecord {
    /// UID, when the server reported one.
    pub uid: Option<Uid>,
    /// Sequence number.
    pub seq: Option<SeqNum>,
    /// Subject header.
    pub subject: Option<String>,
    /// From header.
    pub from: Option<String>,
    /// Date header.
    pub date: Option<String>,
    /// Size in bytes.
    pub size: u32,
    /// Whether the message has been read.
    pub seen: bool,
    /// Whether the message is flagged for deletion.
    pub deleted: bool,
}

/// Options passed through to the session when a connection closes.
///
/// The bits are opaque to this crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CloseFlags(pub u32);

impl CloseFlags {
    /// Close without side effects.
    pub const NONE: Self = Self(0);
    /// Expunge messages flagged for deletion while closing.
    pub const EXPUNGE: Self = Self(0x8000);

    /// Returns true if every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}
