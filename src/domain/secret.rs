//! Opaque handles to secret-shared values.
//!
//! A handle names a slot inside one secure-computation session. It carries no
//! plaintext and can only be turned back into a number by the session's
//! `reveal`. Numbers and booleans are distinct types so a comparison result can
//! never be mistaken for a price.

use std::fmt;

/// Identifies one secure-computation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Secret-shared number.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretValue {
    session: SessionId,
    slot: u32,
}

/// Secret-shared boolean, the output of a secure comparison.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SecretBool {
    session: SessionId,
    slot: u32,
}

macro_rules! handle_impl {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Only runtime adapters should mint handles.
            pub fn from_parts(session: SessionId, slot: u32) -> Self {
                Self { session, slot }
            }

            pub fn session(&self) -> SessionId {
                self.session
            }

            pub fn slot(&self) -> u32 {
                self.slot
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({}/{})"), self.session.0, self.slot)
            }
        }
    };
}

handle_impl!(SecretValue, "SecretValue");
handle_impl!(SecretBool, "SecretBool");

/// One secret number per time step, aligned with the market rows.
pub type SecureSeries = Vec<SecretValue>;

/// One secret boolean per time step.
pub type SecureBoolSeries = Vec<SecretBool>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_more_than_the_slot() {
        let value = SecretValue::from_parts(SessionId(7), 42);
        assert_eq!(format!("{:?}", value), "SecretValue(7/42)");
        let bit = SecretBool::from_parts(SessionId(7), 43);
        assert_eq!(format!("{:?}", bit), "SecretBool(7/43)");
    }

    #[test]
    fn handles_compare_by_session_and_slot() {
        let a = SecretValue::from_parts(SessionId(1), 0);
        let b = SecretValue::from_parts(SessionId(2), 0);
        assert_ne!(a, b);
        assert_eq!(a, SecretValue::from_parts(SessionId(1), 0));
        assert_eq!(a.session(), SessionId(1));
        assert_eq!(b.slot(), 0);
    }
}
