//! Cached mailbox directory.
//!
//! The directory is the decoded list of mailboxes a connection knows about.
//! It is loaded lazily, kept in server order and thrown away whenever a
//! mailbox is created or deleted.

use crate::codec::decode_listed_name;
use crate::types::MailboxDescriptor;

/// One mailbox known to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirectoryEntry {
    /// Decoded short name.
    pub name: String,
    /// Name exactly as the server listed it.
    pub wire_name: String,
    /// Whether decoding dropped part of the name.
    pub lossy: bool,
}

impl DirectoryEntry {
    pub fn from_descriptor(descriptor: MailboxDescriptor, namespace: &str) -> Self {
        let decoded = decode_listed_name(&descriptor.name, namespace);
        if decoded.is_lossy() {
            tracing::warn!(
                raw = %descriptor.name,
                name = %decoded.name,
                "Mailbox name decoded lossily"
            );
        } else {
            tracing::trace!(raw = %descriptor.name, name = %decoded.name, "Decoded mailbox name");
        }
        Self {
            name: decoded.name,
            wire_name: descriptor.name,
            lossy: decoded.lossy,
        }
    }
}

/// Load state of the directory.
///
/// Names and mailbox entries live in one place, so they can never disagree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) enum Directory {
    /// Never listed.
    #[default]
    NotLoaded,
    /// Listed and decoded, in server order.
    Loaded(Vec<DirectoryEntry>),
    /// Dropped after a create or delete; next access lists again.
    Invalidated,
}

impl Directory {
    /// Builds a loaded directory from a listing.
    pub fn from_listing(descriptors: Vec<MailboxDescriptor>, namespace: &str) -> Self {
        Self::Loaded(
            descriptors
                .into_iter()
                .map(|d| DirectoryEntry::from_descriptor(d, namespace))
                .collect(),
        )
    }

    /// Returns the entries if loaded.
    pub fn entries(&self) -> Option<&[DirectoryEntry]> {
        match self {
            Self::Loaded(entries) => Some(entries),
            Self::NotLoaded | Self::Invalidated => None,
        }
    }

    /// Finds an entry by short name.
    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries()?.iter().find(|e| e.name == name)
    }

    /// Drops the cached listing.
    pub fn invalidate(&mut self) {
        *self = Self::Invalidated;
    }
}
