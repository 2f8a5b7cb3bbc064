//! Compliance submission.
//!
//! One approved selfie becomes two sequential backend writes:
//! 1. **Upload** the image as multipart content; the backend answers with
//!    the stored asset URL.
//! 2. **Create** the compliance record from that URL and the subject id.
//!
//! The second call consumes the first call's output, so they never run in
//! parallel. Failures are folded into a single [`SubmissionResult`]; the
//! orchestrator never retries on its own.
//!
//! [`SubmissionResult`]: facegate_types::SubmissionResult

pub mod backend;
pub mod error;
pub mod http;
pub mod orchestrator;

pub use backend::{BackendResponse, ComplianceBackend, CreateRecordRequest, IdentityDocument};
pub use error::TransportError;
pub use http::HttpComplianceBackend;
pub use orchestrator::SubmissionOrchestrator;
