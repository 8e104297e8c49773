use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Opaque key for a conversing user. Quota records and sessions are sharded by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub i64);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Identity {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl FromStr for Identity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<i64>()
            .map(Self)
            .map_err(|source| Error::InvalidIdentity {
                value: trimmed.to_string(),
                source,
            })
    }
}

/// Where replies for an inbound event go: the chat plus the message to thread under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTarget {
    pub chat_id: i64,
    /// Message the reply is attached to, when the transport supports threading.
    pub message_id: Option<i32>,
}

impl ReplyTarget {
    #[must_use]
    pub fn new(chat_id: i64, message_id: Option<i32>) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_parses_with_whitespace() {
        assert_eq!(" 377114917 ".parse::<Identity>().unwrap(), Identity(377114917));
    }

    #[test]
    fn identity_rejects_garbage() {
        let err = "alice".parse::<Identity>().unwrap_err();
        assert_eq!(err.to_string(), "invalid identity `alice`");
    }

    #[test]
    fn identity_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Identity(42)).unwrap();
        assert_eq!(json, "42");
    }
}
