//! Error types for the mailbox layer.

use thiserror::Error;

/// Failures reported by a [`Session`](crate::Session) implementation.
///
/// These mirror the ways an IMAP server can refuse or abort a command.
#[derive(Debug, Error)]
pub enum SessionError {
    /// I/O error on the underlying transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// No mailbox is selected on the session.
    #[error("No mailbox selected")]
    NoMailbox,

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Errors that can occur in directory and mailbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The session handed to a connection is not live.
    #[error("Session handle is not valid")]
    InvalidSessionHandle,

    /// No mailbox with this short name exists in the directory.
    #[error("Mailbox '{name}' does not exist")]
    MailboxNotFound {
        /// Short (unprefixed) name that was looked up.
        name: String,
    },

    /// The server refused to create a mailbox.
    #[error("Can not create '{name}' mailbox at '{namespace}'")]
    MailboxCreateFailed {
        /// Short name of the mailbox.
        name: String,
        /// Namespace prefix the mailbox was created under.
        namespace: String,
        /// Failure reported by the session.
        #[source]
        source: SessionError,
    },

    /// The server refused to delete a mailbox.
    #[error("Mailbox '{mailbox}' could not be deleted")]
    MailboxDeleteFailed {
        /// Short name of the mailbox.
        mailbox: String,
        /// Failure reported by the session.
        #[source]
        source: SessionError,
    },

    /// A mailbox could not be selected before an operation that needs it.
    #[error("Mailbox '{mailbox}' could not be selected")]
    SelectFailed {
        /// Fully-qualified name of the mailbox.
        mailbox: String,
        /// Failure reported by the session.
        #[source]
        source: SessionError,
    },

    /// Any other session failure.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
