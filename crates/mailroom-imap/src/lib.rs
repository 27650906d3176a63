//! # mailroom-imap
//!
//! The mailbox-directory and selection-state layer of an IMAP client.
//!
//! It sits on top of an already authenticated [`Session`] and gives callers
//! a small object model: a [`Connection`] that knows the server's namespace
//! prefix and its mailboxes, [`Mailbox`] handles that can be used in any
//! order, and lazy [`Message`] handles.
//!
//! ## Features
//!
//! - **Mailbox discovery**: LIST results are decoded from modified UTF-7,
//!   stripped of the namespace prefix and cached until a mailbox is created
//!   or deleted
//! - **Transparent selection**: an IMAP session has one selected mailbox;
//!   every mailbox operation re-selects when another handle moved the
//!   session elsewhere
//! - **Search and overview**: UID SEARCH and summary fetches yield lazy
//!   message iterators
//! - **Pluggable transport**: anything implementing [`Session`] can be used;
//!   [`memory::MemorySession`] keeps everything in process
//!
//! ## Quick Start
//!
//! ```
//! use mailroom_imap::memory::MemorySession;
//! use mailroom_imap::{Connection, ConnectionConfig, Criterion, SearchExpression};
//!
//! # fn main() -> mailroom_imap::Result<()> {
//! let mut session = MemorySession::new()
//!     .with_mailbox("{imap.example.com}INBOX")
//!     .with_mailbox("{imap.example.com}Sent,Items");
//! session.deliver("{imap.example.com}INBOX", "Subject: hello\r\n\r\nhi");
//!
//! let connection = Connection::new(session, ConnectionConfig::new("{imap.example.com}"))?;
//! assert_eq!(connection.mailbox_names()?, ["INBOX", "Sent/Items"]);
//!
//! let inbox = connection.mailbox("INBOX")?;
//! assert_eq!(inbox.count()?, 1);
//!
//! let unseen = SearchExpression::from(Criterion::Unseen);
//! for message in inbox.messages(Some(&unseen))? {
//!     let raw = message.fetch_raw()?;
//!     assert!(raw.starts_with(b"Subject: hello"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`codec`]: Modified UTF-7 mailbox name encoding
//! - [`config`]: Connection configuration
//! - [`memory`]: In-memory session
//! - [`search`]: Search expressions
//! - [`types`]: Identifiers, UID sets and status snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod config;
mod connection;
mod directory;
mod error;
mod mailbox;
pub mod memory;
mod message;
pub mod search;
mod session;
pub mod types;

pub use codec::{DecodedName, decode_listed_name, decode_mailbox_name, encode_mailbox_name};
pub use config::{ConnectionConfig, ConnectionConfigBuilder, Security};
pub use connection::Connection;
pub use error::{Error, Result, SessionError};
pub use mailbox::Mailbox;
pub use message::{Message, MessageIterator};
pub use search::{Criterion, SearchExpression};
pub use session::{Session, SessionResult};
pub use types::{
    CloseFlags, MailboxDescriptor, MailboxInfo, MailboxStatus, MessageId, OverviewRecord, SeqNum,
    SessionStatus, Uid, UidSet,
};
