//! Message identifiers.
//!
//! Sequence numbers and UIDs are both non-zero 32-bit values but mean
//! different things, so they get distinct types.

use std::num::NonZeroU32;

macro_rules! nonzero_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub NonZeroU32);

        impl $name {
            /// Wraps `n`, or gives `None` for zero.
            #[must_use]
            pub fn new(n: u32) -> Option<Self> {
                NonZeroU32::new(n).map(Self)
            }

            /// The raw number.
            #[must_use]
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

nonzero_id! {
    /// Position of a message in the selected mailbox, counted from 1.
    ///
    /// Positions shift when messages before it are expunged.
    SeqNum
}

nonzero_id! {
    /// Identifier of a message that stays fixed for the life of its mailbox.
    Uid
}

/// How a [`Message`](crate::Message) handle addresses its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    /// Transient sequence number.
    Seq(SeqNum),
    /// Persistent UID.
    Uid(Uid),
}

impl MessageId {
    /// Returns the raw numeric value, whichever kind it is.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Seq(n) => n.0.get(),
            Self::Uid(uid) => uid.0.get(),
        }
    }

    /// Returns true if this identifier is a UID.
    #[must_use]
    pub const fn is_uid(self) -> bool {
        matches!(self, Self::Uid(_))
    }
}

impl From<SeqNum> for MessageId {
    fn from(n: SeqNum) -> Self {
        Self::Seq(n)
    }
}

impl From<Uid> for MessageId {
    fn from(uid: Uid) -> Self {
        Self::Uid(uid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(SeqNum::new(0).is_none());
        assert!(Uid::new(0).is_none());
    }

    #[test]
    fn display_and_ordering() {
        let a = Uid::new(100).unwrap();
        let b = Uid::new(200).unwrap();
        assert!(a < b);
        assert_eq!(a.to_string(), "100");
        assert_eq!(SeqNum::new(u32::MAX).unwrap().get(), u32::MAX);
    }

    #[test]
    fn message_id_kinds() {
        let seq: MessageId = SeqNum::new(3).unwrap().into();
        let uid: MessageId = Uid::new(42).unwrap().into();
        assert!(!seq.is_uid());
        assert!(uid.is_uid());
        assert_eq!(seq.value(), 3);
        assert_eq!(uid.value(), 42);
    }
}
