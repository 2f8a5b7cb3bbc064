use facegate_types::Timestamp;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token signature verification failed")]
    InvalidSignature,

    #[error("token expired at {expired_at} (now {now})")]
    Expired { expired_at: Timestamp, now: Timestamp },

    #[error("token carries no usable subject identifier")]
    NoSubject,
}

impl TokenError {
    /// Stable code for diagnostics and result payloads.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "MALFORMED",
            TokenError::InvalidSignature => "INVALID_SIGNATURE",
            TokenError::Expired { .. } => "EXPIRED",
            TokenError::NoSubject => "NO_SUBJECT",
        }
    }
}
