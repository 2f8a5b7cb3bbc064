//! Selfie verification session.
//!
//! A session walks one user through a single capture-and-submit attempt:
//!
//! ```text
//! INTRO -> CAMERA_ACTIVE -> REVIEW -> SUBMITTING -> SUCCESS
//!   |          ^   |           |            |
//!   v          |   +-- retake -+            v
//! NO_TOKEN     +------- retake/reset --- FAILED
//! ```
//!
//! Any state may move to CLOSED when the user leaves.
//!
//! - [`session`]: the pure state machine.
//! - [`controller`]: runs frames through the quality gate, re-validates the
//!   token on submit, and owns the capture device.
//! - [`actor`]: puts a controller on its own task behind a handle.

pub mod actor;
pub mod config;
pub mod controller;
pub mod error;
pub mod redirect;
pub mod session;
pub mod state;

pub use actor::{SessionActor, SessionHandle, SessionSnapshot, SubmitAck};
pub use config::{FlowConfig, SecretString};
pub use controller::{EntryParams, FlowComponents, SessionController, SubmissionJob, SubmitStart};
pub use error::{ConfigError, VerificationError};
pub use redirect::Redirects;
pub use session::{
    ApplyOutcome, CaptureOutcome, SubmissionTicket, VerificationSession,
    CAMERA_UNAVAILABLE_MESSAGE, GENERIC_FAILURE_MESSAGE, INVALID_TOKEN_MESSAGE, NO_TOKEN_MESSAGE,
    USER_CANCELLED_REASON,
};
pub use state::{SessionPhase, SessionState};
