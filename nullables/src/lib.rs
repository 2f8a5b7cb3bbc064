//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators (clock, compliance backend, capture device)
//! are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record every call for later assertions
//! - Never touch the network or a camera
//!
//! Usage: swap real implementations for nullables in tests.

pub mod backend;
pub mod capture;
pub mod clock;

pub use backend::{NullBackend, UploadCall};
pub use capture::NullCaptureDevice;
pub use clock::NullClock;
