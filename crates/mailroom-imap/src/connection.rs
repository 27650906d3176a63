//! Authenticated connection and mailbox directory.
//!
//! A [`Connection`] owns one [`Session`] together with the namespace prefix of
//! the server. It lists and decodes the server's mailboxes, caches the result
//! and hands out [`Mailbox`] handles bound to fully-qualified names.
//!
//! ## Locking
//!
//! The session sits behind a mutex. Every mailbox operation takes the lock
//! once and performs "check selection, select if needed, run the command"
//! inside it, so a connection shared between threads can never run a command
//! against a mailbox another thread selected in between. The directory has
//! its own lock, always taken before the session lock when both are needed.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::codec::encode_mailbox_name;
use crate::config::ConnectionConfig;
use crate::directory::{Directory, DirectoryEntry};
use crate::mailbox::{Mailbox, ensure_selected};
use crate::session::{Session, SessionResult};
use crate::types::{CloseFlags, MailboxInfo};
use crate::{Error, Result};

/// A connection to an IMAP server that is authenticated for a user.
pub struct Connection<S> {
    config: ConnectionConfig,
    session: Mutex<S>,
    directory: Mutex<Directory>,
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<S: Session> Connection<S> {
    /// Wraps an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSessionHandle`] if the session is not alive.
    pub fn new(session: S, config: ConnectionConfig) -> Result<Self> {
        if !session.is_alive() {
            return Err(Error::InvalidSessionHandle);
        }

        Ok(Self {
            config,
            session: Mutex::new(session),
            directory: Mutex::new(Directory::NotLoaded),
        })
    }

    /// Returns the connection configuration.
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Returns the namespace prefix.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Runs `f` with exclusive access to the session.
    ///
    /// Use this to group several raw commands into one critical section.
    ///
    /// # Deadlocks
    ///
    /// `f` runs with the session lock held. Calling any method of this
    /// connection, or of a [`Mailbox`] or [`Message`](crate::Message) bound
    /// to it, from inside `f` deadlocks. Take what you need out of the
    /// closure and call them afterwards:
    ///
    /// ```
    /// use mailroom_imap::memory::MemorySession;
    /// use mailroom_imap::{Connection, ConnectionConfig, Session};
    ///
    /// # fn main() -> mailroom_imap::Result<()> {
    /// let session = MemorySession::new().with_mailbox("{mem}INBOX");
    /// let connection = Connection::new(session, ConnectionConfig::new("{mem}"))?;
    ///
    /// let status = connection.with_session(|s| s.select("{mem}INBOX"))?;
    /// assert_eq!(status.exists, 0);
    /// assert_eq!(connection.count()?, 0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_session<T>(&self, f: impl FnOnce(&mut S) -> T) -> T {
        f(&mut *lock(&self.session))
    }

    /// Number of messages in whatever mailbox is currently selected.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot report a count.
    pub fn count_messages(&self) -> Result<u32> {
        Ok(lock(&self.session).message_count()?)
    }

    /// Number of recent messages in the currently selected mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot report a count.
    pub fn count_recent(&self) -> Result<u32> {
        Ok(lock(&self.session).recent_count()?)
    }

    /// Message count reported by the session, independent of any mailbox
    /// handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot report a count.
    pub fn count(&self) -> Result<u32> {
        self.count_messages()
    }

    /// Status snapshot of the currently selected mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot report status.
    pub fn mailbox_info(&self) -> Result<MailboxInfo> {
        Ok(lock(&self.session).mailbox_info()?)
    }

    /// Status snapshot of the currently selected mailbox as key/value pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot report status.
    pub fn info(&self) -> Result<BTreeMap<String, String>> {
        self.mailbox_info().map(|info| info.to_map())
    }

    /// Fully-qualified name of the mailbox the session has selected.
    #[must_use]
    pub fn selected_mailbox(&self) -> Option<String> {
        lock(&self.session).check().ok().map(|status| status.mailbox)
    }

    /// Returns all mailboxes, in the order the server listed them.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox listing fails.
    pub fn mailboxes(&self) -> Result<Vec<Mailbox<'_, S>>> {
        self.with_directory(|directory| {
            entries(directory)
                .iter()
                .map(|entry| Mailbox::new(self, self.full_name(&entry.name), entry))
                .collect()
        })
    }

    /// Returns the decoded short names of all mailboxes.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox listing fails.
    pub fn mailbox_names(&self) -> Result<Vec<String>> {
        self.with_directory(|directory| {
            entries(directory).iter().map(|e| e.name.clone()).collect()
        })
    }

    /// Checks that a mailbox with the given short name exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the mailbox listing fails.
    pub fn has_mailbox(&self, name: &str) -> Result<bool> {
        self.with_directory(|directory| directory.find(name).is_some())
    }

    /// Gets a mailbox by its short name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxNotFound`] if no such mailbox is listed.
    pub fn mailbox(&self, name: &str) -> Result<Mailbox<'_, S>> {
        let entry = self
            .with_directory(|directory| directory.find(name).cloned())?
            .ok_or_else(|| Error::MailboxNotFound {
                name: name.to_string(),
            })?;

        Ok(Mailbox::new(self, self.full_name(name), &entry))
    }

    /// Creates a mailbox and returns a handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxCreateFailed`] if the server refuses; the
    /// cached directory is left as it was.
    pub fn create_mailbox(&self, name: &str) -> Result<Mailbox<'_, S>> {
        let wire_name = format!("{}{}", self.config.namespace, encode_mailbox_name(name));

        if let Err(source) = lock(&self.session).create(&wire_name) {
            return Err(Error::MailboxCreateFailed {
                name: name.to_string(),
                namespace: self.config.namespace.clone(),
                source,
            });
        }

        tracing::info!(mailbox = name, "Created mailbox");
        lock(&self.directory).invalidate();

        self.mailbox(name)
    }

    /// Deletes a mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MailboxDeleteFailed`] if the server refuses; the
    /// cached directory is left as it was.
    pub fn delete_mailbox(&self, mailbox: &Mailbox<'_, S>) -> Result<()> {
        if let Err(source) = lock(&self.session).delete(mailbox.wire_name()) {
            return Err(Error::MailboxDeleteFailed {
                mailbox: mailbox.name().to_string(),
                source,
            });
        }

        tracing::info!(mailbox = mailbox.name(), "Deleted mailbox");
        lock(&self.directory).invalidate();
        Ok(())
    }

    /// Drops the cached directory so the next access lists again.
    pub fn refresh(&self) {
        lock(&self.directory).invalidate();
    }

    /// Closes the session. `flags` are passed through to it unchanged.
    ///
    /// Returns whether the session closed cleanly.
    #[must_use = "a failed close is only reported through the return value"]
    pub fn close(self, flags: CloseFlags) -> bool {
        let mut session = self.session.into_inner().unwrap_or_else(PoisonError::into_inner);
        match session.close(flags) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(?e, "Failed to close session");
                false
            }
        }
    }

    /// Makes `wire_name` the selected mailbox, then runs `op` under the same
    /// lock.
    pub(crate) fn with_selected<T>(
        &self,
        wire_name: &str,
        op: impl FnOnce(&mut S) -> SessionResult<T>,
    ) -> Result<T> {
        let mut session = lock(&self.session);
        ensure_selected(&mut *session, wire_name)?;
        Ok(op(&mut *session)?)
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}{}", self.config.namespace, name)
    }

    /// Runs `f` over the loaded directory, listing the server first if the
    /// directory is not loaded.
    fn with_directory<T>(&self, f: impl FnOnce(&Directory) -> T) -> Result<T> {
        let mut directory = lock(&self.directory);

        if directory.entries().is_some() {
            return Ok(f(&directory));
        }

        tracing::debug!(
            namespace = %self.config.namespace,
            reload = matches!(*directory, Directory::Invalidated),
            "Listing mailboxes"
        );
        let listing = lock(&self.session)
            .list_mailboxes(&self.config.namespace, &self.config.list_pattern)?;
        *directory = Directory::from_listing(listing, &self.config.namespace);

        Ok(f(&directory))
    }
}

fn entries(directory: &Directory) -> &[DirectoryEntry] {
    directory.entries().unwrap_or_default()
}
