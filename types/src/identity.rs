//! Subject identity and the bearer credential that carries it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The authenticated user's identifier.
///
/// Only ever produced from a validated access token; never accepted from
/// the client independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw id. Zero is not a usable subject.
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque signed bearer credential.
///
/// `Debug` never prints the token body.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} bytes>)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_a_user() {
        assert!(UserId::new(0).is_none());
        assert_eq!(UserId::new(7).map(|u| u.get()), Some(7));
    }

    #[test]
    fn access_token_debug_is_redacted() {
        let token = AccessToken::new("aaa.bbb.ccc");
        let printed = format!("{token:?}");
        assert!(!printed.contains("aaa"));
        assert!(printed.contains("11 bytes"));
    }
}
