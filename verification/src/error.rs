use thiserror::Error;

use crate::state::SessionPhase;

/// An action that the current session state does not permit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("{action} is not allowed in {phase}")]
    NotAllowed {
        action: &'static str,
        phase: SessionPhase,
    },

    #[error("no captured image to submit")]
    NoCapturedImage,

    #[error("a submission is already in flight")]
    SubmissionInFlight,

    #[error("session is closed")]
    SessionClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no token secret configured and unverified tokens were not explicitly allowed")]
    MissingTokenSecret,

    #[error("invalid quality thresholds: {0}")]
    InvalidThresholds(String),

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}
