//! Search expressions.
//!
//! A [`SearchExpression`] is a conjunction of [`Criterion`] values that
//! renders to the text of a UID SEARCH command. An empty expression renders
//! as `ALL`.

use std::fmt::{self, Write};

use chrono::NaiveDate;

use crate::types::UidSet;

/// A single SEARCH criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// All messages.
    All,
    /// Messages with \Answered flag.
    Answered,
    /// Messages with \Deleted flag.
    Deleted,
    /// Messages with \Draft flag.
    Draft,
    /// Messages with \Flagged flag.
    Flagged,
    /// Messages with \Seen flag.
    Seen,
    /// Messages without \Seen flag.
    Unseen,
    /// Messages without \Deleted flag.
    Undeleted,
    /// Messages within a UID set.
    Uid(UidSet),
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Body contains text.
    Body(String),
    /// Text in header or body.
    Text(String),
    /// Internal date on or after.
    Since(NaiveDate),
    /// Internal date before.
    Before(NaiveDate),
    /// Internal date on.
    On(NaiveDate),
    /// Larger than size in bytes.
    Larger(u32),
    /// Smaller than size in bytes.
    Smaller(u32),
    /// Header field contains value.
    Header(String, String),
    /// Either criterion matches.
    Or(Box<Self>, Box<Self>),
    /// Criterion does not match.
    Not(Box<Self>),
}

impl Criterion {
    /// Either `a` or `b`.
    #[must_use]
    pub fn or(a: Self, b: Self) -> Self {
        Self::Or(Box::new(a), Box::new(b))
    }

    /// Negation of `c`.
    #[must_use]
    pub fn not(c: Self) -> Self {
        Self::Not(Box::new(c))
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Answered => f.write_str("ANSWERED"),
            Self::Deleted => f.write_str("DELETED"),
            Self::Draft => f.write_str("DRAFT"),
            Self::Flagged => f.write_str("FLAGGED"),
            Self::Seen => f.write_str("SEEN"),
            Self::Unseen => f.write_str("UNSEEN"),
            Self::Undeleted => f.write_str("UNDELETED"),
            Self::Uid(set) => write!(f, "UID {set}"),
            Self::Subject(s) => keyed(f, "SUBJECT", s),
            Self::From(s) => keyed(f, "FROM", s),
            Self::To(s) => keyed(f, "TO", s),
            Self::Body(s) => keyed(f, "BODY", s),
            Self::Text(s) => keyed(f, "TEXT", s),
            Self::Since(date) => write!(f, "SINCE {}", imap_date(*date)),
            Self::Before(date) => write!(f, "BEFORE {}", imap_date(*date)),
            Self::On(date) => write!(f, "ON {}", imap_date(*date)),
            Self::Larger(size) => write!(f, "LARGER {size}"),
            Self::Smaller(size) => write!(f, "SMALLER {size}"),
            Self::Header(name, value) => {
                f.write_str("HEADER ")?;
                write_astring(f, name)?;
                f.write_char(' ')?;
                write_astring(f, value)
            }
            Self::Or(a, b) => write!(f, "OR {a} {b}"),
            Self::Not(c) => write!(f, "NOT {c}"),
        }
    }
}

fn keyed(f: &mut fmt::Formatter<'_>, key: &str, value: &str) -> fmt::Result {
    f.write_str(key)?;
    f.write_char(' ')?;
    write_astring(f, value)
}

/// Writes an astring (atom or quoted string).
fn write_astring(f: &mut impl Write, s: &str) -> fmt::Result {
    if !s.is_empty() && !s.bytes().any(needs_quoting) {
        return f.write_str(s);
    }
    f.write_char('"')?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char('"')
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b >= 0x7F
}

/// Formats a date as `date-day "-" date-month "-" date-year`.
fn imap_date(date: NaiveDate) -> String {
    date.format("%-d-%b-%Y").to_string()
}

/// A conjunction of search criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchExpression {
    criteria: Vec<Criterion>,
}

impl SearchExpression {
    /// Creates an empty expression, which matches every message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expression matching every message.
    #[must_use]
    pub fn all() -> Self {
        Self::new()
    }

    /// Adds a criterion all matches must also satisfy.
    #[must_use]
    pub fn and(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Adds a criterion in place.
    pub fn push(&mut self, criterion: Criterion) {
        self.criteria.push(criterion);
    }

    /// Returns the criteria.
    #[must_use]
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    /// Returns true if no criteria have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

impl From<Criterion> for SearchExpression {
    fn from(criterion: Criterion) -> Self {
        Self {
            criteria: vec![criterion],
        }
    }
}

impl FromIterator<Criterion> for SearchExpression {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for SearchExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.criteria.is_empty() {
            return f.write_str("ALL");
        }
        for (i, criterion) in self.criteria.iter().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{criterion}")?;
        }
        Ok(())
    }
}
