//! In-memory session.
//!
//! [`MemorySession`] keeps mailboxes and messages in process and records
//! every command it receives, so tests can check exactly what was sent.
//! Commands can be made to fail on demand.

use std::collections::HashSet;

use crate::error::SessionError;
use crate::session::{Session, SessionResult};
use crate::types::{
    CloseFlags, MailboxDescriptor, MailboxInfo, MailboxStatus, MessageId, OverviewRecord,
    SeqNum, SessionStatus, Uid, UidSet,
};

/// A command received by a [`MemorySession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LIST with reference and pattern.
    List(String, String),
    /// SELECT of a mailbox.
    Select(String),
    /// CHECK.
    Check,
    /// CREATE of a mailbox.
    Create(String),
    /// DELETE of a mailbox.
    Delete(String),
    /// Message count query.
    MessageCount,
    /// Recent count query.
    RecentCount,
    /// Status snapshot query.
    Info,
    /// UID SEARCH with its query.
    Search(String),
    /// UID FETCH of summaries.
    FetchOverview(String),
    /// FETCH of a full message.
    FetchRaw(MessageId),
    /// APPEND to a mailbox.
    Append(String),
    /// EXPUNGE.
    Expunge,
    /// Session close.
    Close(CloseFlags),
}

/// Commands that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// LIST.
    List,
    /// SELECT.
    Select,
    /// CHECK.
    Check,
    /// CREATE.
    Create,
    /// DELETE.
    Delete,
    /// UID SEARCH.
    Search,
    /// APPEND.
    Append,
    /// EXPUNGE.
    Expunge,
    /// Close.
    Close,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    uid: Uid,
    raw: Vec<u8>,
    seen: bool,
    deleted: bool,
    recent: bool,
}

#[derive(Debug, Clone)]
struct StoredMailbox {
    name: String,
    messages: Vec<StoredMessage>,
    next_uid: u32,
}

impl StoredMailbox {
    fn new(name: String) -> Self {
        Self {
            name,
            messages: Vec::new(),
            next_uid: 1,
        }
    }

    fn push(&mut self, raw: Vec<u8>) -> Option<Uid> {
        let uid = Uid::new(self.next_uid)?;
        self.next_uid += 1;
        self.messages.push(StoredMessage {
            uid,
            raw,
            seen: false,
            deleted: false,
            recent: true,
        });
        Some(uid)
    }

    fn highest_uid(&self) -> Option<Uid> {
        self.messages.last().map(|m| m.uid)
    }
}

/// An IMAP session held entirely in memory.
#[derive(Debug, Clone)]
pub struct MemorySession {
    mailboxes: Vec<StoredMailbox>,
    selected: Option<String>,
    commands: Vec<Command>,
    failing: HashSet<Operation>,
    alive: bool,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Creates a live session without mailboxes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mailboxes: Vec::new(),
            selected: None,
            commands: Vec::new(),
            failing: HashSet::new(),
            alive: true,
        }
    }

    /// Adds a mailbox by its fully-qualified wire name.
    #[must_use]
    pub fn with_mailbox(mut self, name: impl Into<String>) -> Self {
        self.add_mailbox(name);
        self
    }

    /// Adds a mailbox by its fully-qualified wire name.
    pub fn add_mailbox(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.find(&name).is_none() {
            self.mailboxes.push(StoredMailbox::new(name));
        }
    }

    /// Delivers a message without recording a command.
    ///
    /// Returns the assigned UID, or `None` if the mailbox does not exist.
    pub fn deliver(&mut self, mailbox: &str, raw: impl Into<Vec<u8>>) -> Option<Uid> {
        self.find_mut(mailbox)?.push(raw.into())
    }

    /// Sets the \Seen flag of a message.
    pub fn mark_seen(&mut self, mailbox: &str, uid: Uid) {
        if let Some(message) = self.message_mut(mailbox, uid) {
            message.seen = true;
        }
    }

    /// Sets the \Deleted flag of a message.
    pub fn mark_deleted(&mut self, mailbox: &str, uid: Uid) {
        if let Some(message) = self.message_mut(mailbox, uid) {
            message.deleted = true;
        }
    }

    /// Makes every later `operation` fail.
    pub fn fail(&mut self, operation: Operation) {
        self.failing.insert(operation);
    }

    /// Makes `operation` succeed again.
    pub fn recover(&mut self, operation: Operation) {
        self.failing.remove(&operation);
    }

    /// Marks the session as dropped by the server.
    pub fn terminate(&mut self) {
        self.alive = false;
        self.selected = None;
    }

    /// Every command received so far, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Names passed to SELECT so far, oldest first.
    #[must_use]
    pub fn selects(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Select(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Forgets the recorded commands.
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Returns true if a mailbox with this wire name exists.
    #[must_use]
    pub fn contains(&self, mailbox: &str) -> bool {
        self.find(mailbox).is_some()
    }

    /// Raw messages stored in a mailbox, in UID order.
    #[must_use]
    pub fn stored_messages(&self, mailbox: &str) -> Vec<&[u8]> {
        self.find(mailbox)
            .map(|m| m.messages.iter().map(|msg| msg.raw.as_slice()).collect())
            .unwrap_or_default()
    }

    fn find(&self, name: &str) -> Option<&StoredMailbox> {
        self.mailboxes.iter().find(|m| m.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut StoredMailbox> {
        self.mailboxes.iter_mut().find(|m| m.name == name)
    }

    fn message_mut(&mut self, mailbox: &str, uid: Uid) -> Option<&mut StoredMessage> {
        self.find_mut(mailbox)?
            .messages
            .iter_mut()
            .find(|m| m.uid == uid)
    }

    fn record(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn guard(&self, operation: Operation) -> SessionResult<()> {
        if !self.alive {
            return Err(SessionError::Bye("session closed".into()));
        }
        if self.failing.contains(&operation) {
            return Err(SessionError::No(format!("{operation:?} refused")));
        }
        Ok(())
    }

    fn selected_mut(&mut self) -> SessionResult<&mut StoredMailbox> {
        let name = self.selected.clone().ok_or(SessionError::NoMailbox)?;
        self.find_mut(&name).ok_or(SessionError::NoMailbox)
    }

    fn selected_ref(&self) -> SessionResult<&StoredMailbox> {
        let name = self.selected.as_deref().ok_or(SessionError::NoMailbox)?;
        self.find(name).ok_or(SessionError::NoMailbox)
    }
}

impl Session for MemorySession {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn list_mailboxes(
        &mut self,
        reference: &str,
        pattern: &str,
    ) -> SessionResult<Vec<MailboxDescriptor>> {
        self.record(Command::List(reference.into(), pattern.into()));
        self.guard(Operation::List)?;

        Ok(self
            .mailboxes
            .iter()
            .filter(|m| {
                m.name
                    .strip_prefix(reference)
                    .is_some_and(|rest| wildcard_match(pattern, rest))
            })
            .map(|m| MailboxDescriptor::new(m.name.clone()))
            .collect())
    }

    fn select(&mut self, mailbox: &str) -> SessionResult<MailboxStatus> {
        self.record(Command::Select(mailbox.into()));
        self.guard(Operation::Select)?;

        let Some(stored) = self.find_mut(mailbox) else {
            return Err(SessionError::No(format!("Mailbox doesn't exist: {mailbox}")));
        };
        let status = MailboxStatus {
            exists: count(stored.messages.len()),
            recent: count(stored.messages.iter().filter(|m| m.recent).count()),
            uid_next: Uid::new(stored.next_uid),
        };
        // The session that selects a mailbox sees its recent messages once.
        for message in &mut stored.messages {
            message.recent = false;
        }
        self.selected = Some(mailbox.to_string());
        Ok(status)
    }

    fn check(&mut self) -> SessionResult<SessionStatus> {
        self.record(Command::Check);
        self.guard(Operation::Check)?;

        let stored = self.selected_ref()?;
        Ok(SessionStatus {
            mailbox: stored.name.clone(),
            messages: count(stored.messages.len()),
            recent: 0,
        })
    }

    fn create(&mut self, mailbox: &str) -> SessionResult<()> {
        self.record(Command::Create(mailbox.into()));
        self.guard(Operation::Create)?;

        if self.contains(mailbox) {
            return Err(SessionError::No(format!("Mailbox already exists: {mailbox}")));
        }
        self.mailboxes.push(StoredMailbox::new(mailbox.to_string()));
        Ok(())
    }

    fn delete(&mut self, mailbox: &str) -> SessionResult<()> {
        self.record(Command::Delete(mailbox.into()));
        self.guard(Operation::Delete)?;

        let before = self.mailboxes.len();
        self.mailboxes.retain(|m| m.name != mailbox);
        if self.mailboxes.len() == before {
            return Err(SessionError::No(format!("Mailbox doesn't exist: {mailbox}")));
        }
        if self.selected.as_deref() == Some(mailbox) {
            self.selected = None;
        }
        Ok(())
    }

    fn message_count(&mut self) -> SessionResult<u32> {
        self.record(Command::MessageCount);
        self.guard(Operation::Check)?;
        Ok(count(self.selected_ref()?.messages.len()))
    }

    fn recent_count(&mut self) -> SessionResult<u32> {
        self.record(Command::RecentCount);
        self.guard(Operation::Check)?;
        let stored = self.selected_ref()?;
        Ok(count(stored.messages.iter().filter(|m| m.recent).count()))
    }

    fn mailbox_info(&mut self) -> SessionResult<MailboxInfo> {
        self.record(Command::Info);
        self.guard(Operation::Check)?;

        let stored = self.selected_ref()?;
        Ok(MailboxInfo {
            mailbox: stored.name.clone(),
            messages: count(stored.messages.len()),
            recent: count(stored.messages.iter().filter(|m| m.recent).count()),
            unread: count(stored.messages.iter().filter(|m| !m.seen).count()),
            deleted: count(stored.messages.iter().filter(|m| m.deleted).count()),
            size: stored.messages.iter().map(|m| m.raw.len() as u64).sum(),
        })
    }

    fn uid_search(&mut self, query: &str) -> SessionResult<Option<Vec<Uid>>> {
        self.record(Command::Search(query.into()));
        self.guard(Operation::Search)?;

        let filters = query
            .split_whitespace()
            .map(|key| {
                flag_filter(key)
                    .ok_or_else(|| SessionError::Bad(format!("Unsupported search key: {key}")))
            })
            .collect::<SessionResult<Vec<_>>>()?;

        let uids: Vec<Uid> = self
            .selected_ref()?
            .messages
            .iter()
            .filter(|m| filters.iter().all(|f| f(m)))
            .map(|m| m.uid)
            .collect();

        Ok((!uids.is_empty()).then_some(uids))
    }

    fn uid_fetch_overview(&mut self, uids: &UidSet) -> SessionResult<Option<Vec<OverviewRecord>>> {
        self.record(Command::FetchOverview(uids.to_string()));
        self.guard(Operation::Check)?;

        let stored = self.selected_ref()?;
        let highest = stored.highest_uid();
        let records: Vec<OverviewRecord> = stored
            .messages
            .iter()
            .enumerate()
            .filter(|(_, m)| uids.contains(m.uid, highest))
            .map(|(i, m)| OverviewRecord {
                uid: Some(m.uid),
                seq: u32::try_from(i + 1).ok().and_then(SeqNum::new),
                subject: header(&m.raw, "Subject"),
                from: header(&m.raw, "From"),
                date: header(&m.raw, "Date"),
                size: count(m.raw.len()),
                seen: m.seen,
                deleted: m.deleted,
            })
            .collect();

        Ok((!records.is_empty()).then_some(records))
    }

    fn fetch_raw(&mut self, id: MessageId) -> SessionResult<Vec<u8>> {
        self.record(Command::FetchRaw(id));
        self.guard(Operation::Check)?;

        let stored = self.selected_ref()?;
        let message = match id {
            MessageId::Seq(n) => usize::try_from(n.get() - 1)
                .ok()
                .and_then(|i| stored.messages.get(i)),
            MessageId::Uid(uid) => stored.messages.iter().find(|m| m.uid == uid),
        };
        message
            .map(|m| m.raw.clone())
            .ok_or_else(|| SessionError::No(format!("No such message: {}", id.value())))
    }

    fn append(&mut self, mailbox: &str, message: &[u8]) -> SessionResult<()> {
        self.record(Command::Append(mailbox.into()));
        self.guard(Operation::Append)?;

        let stored = self
            .find_mut(mailbox)
            .ok_or_else(|| SessionError::No(format!("[TRYCREATE] No such mailbox: {mailbox}")))?;
        stored
            .push(message.to_vec())
            .map(drop)
            .ok_or_else(|| SessionError::No("UID space exhausted".into()))
    }

    fn expunge(&mut self) -> SessionResult<()> {
        self.record(Command::Expunge);
        self.guard(Operation::Expunge)?;
        self.selected_mut()?.messages.retain(|m| !m.deleted);
        Ok(())
    }

    fn close(&mut self, flags: CloseFlags) -> SessionResult<()> {
        self.record(Command::Close(flags));
        self.guard(Operation::Close)?;

        if flags.contains(CloseFlags::EXPUNGE)
            && let Ok(stored) = self.selected_mut()
        {
            stored.messages.retain(|m| !m.deleted);
        }
        self.alive = false;
        self.selected = None;
        Ok(())
    }
}

type Filter = fn(&StoredMessage) -> bool;

fn flag_filter(key: &str) -> Option<Filter> {
    let filter: Filter = match key.to_ascii_uppercase().as_str() {
        "ALL" => |_| true,
        "SEEN" => |m| m.seen,
        "UNSEEN" => |m| !m.seen,
        "DELETED" => |m| m.deleted,
        "UNDELETED" => |m| !m.deleted,
        "RECENT" => |m| m.recent,
        _ => return None,
    };
    Some(filter)
}

/// Hierarchy separator in wire names.
const WIRE_SEPARATOR: char = ',';

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Matches a LIST pattern against a wire name: `*` matches anything, `%`
/// anything but the wire hierarchy separator `,`.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.chars().next() {
        None => name.is_empty(),
        Some(wild @ ('*' | '%')) => {
            let rest = &pattern[1..];
            let mut tail = name;
            loop {
                if wildcard_match(rest, tail) {
                    return true;
                }
                let mut chars = tail.chars();
                match chars.next() {
                    Some(c) if wild == '*' || c != WIRE_SEPARATOR => tail = chars.as_str(),
                    _ => return false,
                }
            }
        }
        Some(p) => {
            let mut chars = name.chars();
            chars.next() == Some(p) && wildcard_match(&pattern[p.len_utf8()..], chars.as_str())
        }
    }
}

/// Value of the first header named `name` in a raw message.
fn header(raw: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    text.lines()
        .take_while(|line| !line.is_empty())
        .find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim().to_string())
        })
}
