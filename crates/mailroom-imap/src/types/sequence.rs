//! UID sets for message ranges.

use std::str::FromStr;

use thiserror::Error;

use super::Uid;

/// UID-based sequence set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// Single UID.
    Single(Uid),
    /// Range of UIDs (inclusive).
    Range(Uid, Uid),
    /// Range from start to highest UID.
    RangeFrom(Uid),
    /// All messages.
    All,
    /// Multiple UID sets.
    Set(Vec<Self>),
}

impl UidSet {
    /// Creates a UID set from a single UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Creates a UID set from a range.
    #[must_use]
    pub const fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Returns true if `uid` falls inside this set.
    ///
    /// `highest` is the largest UID in the mailbox and stands in for `*`.
    #[must_use]
    pub fn contains(&self, uid: Uid, highest: Option<Uid>) -> bool {
        let star = highest.map_or(u32::MAX, Uid::get);
        let n = uid.get();
        match self {
            Self::Single(u) => u.get() == n,
            Self::Range(a, b) => {
                let (lo, hi) = ordered(a.get(), b.get());
                (lo..=hi).contains(&n)
            }
            Self::RangeFrom(a) => {
                let (lo, hi) = ordered(a.get(), star);
                (lo..=hi).contains(&n)
            }
            Self::All => true,
            Self::Set(items) => items.iter().any(|s| s.contains(uid, highest)),
        }
    }
}

// RFC 9051: "2:4" and "4:2" are equivalent.
const fn ordered(a: u32, b: u32) -> (u32, u32) {
    if a <= b { (a, b) } else { (b, a) }
}

impl From<Uid> for UidSet {
    fn from(uid: Uid) -> Self {
        Self::Single(uid)
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
    }
}

/// Error parsing a UID set string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid UID set '{input}': {reason}")]
pub struct ParseUidSetError {
    input: String,
    reason: &'static str,
}

impl ParseUidSetError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

impl FromStr for UidSet {
    type Err = ParseUidSetError;

    /// Parses the IMAP sequence-set syntax, e.g. `1:10,15,20:*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseUidSetError::new(s, "empty"));
        }

        let mut items = s
            .split(',')
            .map(|part| parse_part(part).ok_or_else(|| ParseUidSetError::new(s, "bad element")))
            .collect::<Result<Vec<_>, _>>()?;

        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Self::Set(items))
        }
    }
}

fn parse_part(part: &str) -> Option<UidSet> {
    let parse_uid = |s: &str| s.parse::<u32>().ok().and_then(Uid::new);

    match part.split_once(':') {
        None if part == "*" => Some(UidSet::All),
        None => parse_uid(part).map(UidSet::Single),
        Some(("*", "*")) => Some(UidSet::All),
        Some((start, "*") | ("*", start)) => parse_uid(start).map(UidSet::RangeFrom),
        Some((start, end)) => Some(UidSet::Range(parse_uid(start)?, parse_uid(end)?)),
    }
}
