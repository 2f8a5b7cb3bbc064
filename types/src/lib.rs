//! Fundamental types for the facegate selfie-KYC core.
//!
//! This crate defines the data model shared across every other crate in the
//! workspace: timestamps, subject identity, landmark frames, quality verdicts,
//! captured images, and submission results.

pub mod capture;
pub mod error;
pub mod identity;
pub mod image;
pub mod landmarks;
pub mod submission;
pub mod time;
pub mod verdict;

pub use capture::{CaptureDevice, DetachedCapture};
pub use error::{CaptureError, ImageError};
pub use identity::{AccessToken, UserId};
pub use image::ImageBlob;
pub use landmarks::{FaceLandmarkFrame, Point2D};
pub use submission::{FlowResult, FlowStatus, SubmissionOutcome, SubmissionResult};
pub use time::{Clock, SystemClock, Timestamp};
pub use verdict::{QualityReason, QualityVerdict, QUALITY_HINT};
