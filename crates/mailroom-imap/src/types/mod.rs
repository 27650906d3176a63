//! Core types exchanged between the mailbox layer and a session.

#![allow(clippy::missing_const_for_fn)]

mod identifiers;
mod mailbox;
mod sequence;

pub use identifiers::{MessageId, SeqNum, Uid};
pub use mailbox::{
    CloseFlags, MailboxDescriptor, MailboxInfo, MailboxStatus, OverviewRecord, SessionStatus,
};
pub use sequence::{ParseUidSetError, UidSet};
