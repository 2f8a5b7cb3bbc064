//! Capture-device seam.
//!
//! The camera layer itself is external. The session only needs to start it
//! when the live preview is shown and release it when the preview goes away.

use crate::error::CaptureError;

pub trait CaptureDevice: Send {
    /// Acquire the device and begin streaming frames.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop streaming and release the device. Releasing an idle device is a no-op.
    fn release(&mut self);
}

/// A device for flows driven without a camera (batch input, tests).
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedCapture;

impl CaptureDevice for DetachedCapture {
    fn start(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn release(&mut self) {}
}
