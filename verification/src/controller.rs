//! Drives a [`VerificationSession`] against its collaborators.
//!
//! The session decides; the controller performs the side effects: it runs
//! frames through the quality gate, re-validates the token at submit time,
//! hands approved images to the orchestrator, and keeps the capture device
//! running exactly while the live preview is showing.

use std::sync::Arc;

use facegate_quality::FrameQualityGate;
use facegate_submission::SubmissionOrchestrator;
use facegate_token::{TokenError, TokenValidator};
use facegate_types::{
    AccessToken, CaptureDevice, FaceLandmarkFrame, FlowResult, ImageBlob, QualityVerdict,
    SubmissionResult,
};
use tracing::{debug, info, warn};

use crate::error::VerificationError;
use crate::redirect::Redirects;
use crate::session::{ApplyOutcome, CaptureOutcome, SubmissionTicket, VerificationSession};
use crate::state::SessionPhase;

/// Parameters supplied when the flow is entered.
#[derive(Clone, Debug, Default)]
pub struct EntryParams {
    pub token: Option<String>,
    pub callback_url: Option<String>,
}

impl EntryParams {
    pub fn new(token: Option<String>, callback_url: Option<String>) -> Self {
        Self {
            token,
            callback_url,
        }
    }
}

/// Shared, session-independent collaborators.
#[derive(Clone)]
pub struct FlowComponents {
    pub gate: FrameQualityGate,
    pub validator: Arc<TokenValidator>,
    pub orchestrator: SubmissionOrchestrator,
    pub default_callback_url: String,
    pub dashboard_url: String,
}

/// A committed submission, detached from the controller so it can run on
/// another task.
pub struct SubmissionJob {
    ticket: SubmissionTicket,
    token: AccessToken,
    orchestrator: SubmissionOrchestrator,
}

impl SubmissionJob {
    pub fn attempt(&self) -> u64 {
        self.ticket.attempt
    }

    /// Run both backend steps. Returns the attempt id with the result.
    pub async fn run(self) -> (u64, SubmissionResult) {
        let result = self
            .orchestrator
            .submit(&self.ticket.image, self.ticket.subject_id, &self.token)
            .await;
        (self.ticket.attempt, result)
    }
}

pub enum SubmitStart {
    Started(SubmissionJob),
    /// The token failed re-validation; the session is now `Failed`.
    TokenRejected(TokenError),
}

pub struct SessionController {
    session: VerificationSession,
    token: Option<AccessToken>,
    redirects: Redirects,
    gate: FrameQualityGate,
    validator: Arc<TokenValidator>,
    orchestrator: SubmissionOrchestrator,
    device: Box<dyn CaptureDevice>,
    device_active: bool,
}

impl SessionController {
    pub fn new(
        entry: EntryParams,
        components: FlowComponents,
        device: Box<dyn CaptureDevice>,
    ) -> Self {
        let token = entry
            .token
            .filter(|t| !t.trim().is_empty())
            .map(AccessToken::new);
        let callback_url = entry
            .callback_url
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(components.default_callback_url);

        let session = match &token {
            None => {
                warn!("flow entered without a token");
                VerificationSession::enter(false)
            }
            Some(token) => match components.validator.validate(token.as_str()) {
                Ok(validated) => {
                    debug!(subject = %validated.subject_id, "entry token accepted");
                    VerificationSession::enter(true)
                }
                Err(e) => {
                    warn!(code = e.code(), "entry token rejected: {e}");
                    VerificationSession::enter_rejected(&e)
                }
            },
        };

        Self {
            session,
            token,
            redirects: Redirects::new(callback_url, components.dashboard_url),
            gate: components.gate,
            validator: components.validator,
            orchestrator: components.orchestrator,
            device,
            device_active: false,
        }
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn redirects(&self) -> &Redirects {
        &self.redirects
    }

    pub fn flow_result(&self) -> Option<FlowResult> {
        self.session.flow_result()
    }

    pub fn begin(&mut self) -> Result<(), VerificationError> {
        self.session.begin()?;
        self.sync_device();
        Ok(())
    }

    /// Judge one frame. Returns the verdict if the session is showing the
    /// live preview; frames in any other state are ignored unevaluated.
    pub fn on_frame(&mut self, frame: &FaceLandmarkFrame) -> Option<QualityVerdict> {
        if self.session.phase() != SessionPhase::CameraActive {
            return None;
        }
        let verdict = self.gate.evaluate(frame);
        self.session.observe(verdict.clone());
        Some(verdict)
    }

    pub fn capture(&mut self, image: ImageBlob) -> Result<CaptureOutcome, VerificationError> {
        let outcome = self.session.capture(image)?;
        self.sync_device();
        Ok(outcome)
    }

    pub fn retake(&mut self) -> Result<(), VerificationError> {
        self.session.retake()?;
        self.sync_device();
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), VerificationError> {
        self.session.reset()?;
        self.sync_device();
        Ok(())
    }

    /// Re-validate the token and, if it still holds, commit to a submission.
    ///
    /// The entry-time validation is not reused: the token must still be
    /// valid at the moment of use.
    pub fn begin_submit(&mut self) -> Result<SubmitStart, VerificationError> {
        let Some(token) = self.token.clone() else {
            return Err(VerificationError::NotAllowed {
                action: "submit",
                phase: self.session.phase(),
            });
        };
        let validation = self.validator.validate(token.as_str());
        let start = match self.session.begin_submission(validation)? {
            Ok(ticket) => SubmitStart::Started(SubmissionJob {
                ticket,
                token,
                orchestrator: self.orchestrator.clone(),
            }),
            Err(e) => SubmitStart::TokenRejected(e),
        };
        self.sync_device();
        Ok(start)
    }

    pub fn finish_submit(&mut self, attempt: u64, result: SubmissionResult) -> ApplyOutcome {
        let outcome = self.session.apply_submission(attempt, result);
        self.sync_device();
        outcome
    }

    /// Submit and wait for the result in one call.
    pub async fn submit(&mut self) -> Result<SessionPhase, VerificationError> {
        match self.begin_submit()? {
            SubmitStart::Started(job) => {
                let (attempt, result) = job.run().await;
                self.finish_submit(attempt, result);
            }
            SubmitStart::TokenRejected(_) => {}
        }
        Ok(self.session.phase())
    }

    /// Close the session and release the device. Returns `true` if a
    /// submission was abandoned.
    pub fn leave(&mut self) -> bool {
        let abandoned = self.session.leave();
        self.sync_device();
        abandoned
    }

    /// Start the device when entering the live preview; release it in every
    /// other state.
    fn sync_device(&mut self) {
        let wanted = self.session.phase() == SessionPhase::CameraActive;
        if wanted && !self.device_active {
            match self.device.start() {
                Ok(()) => {
                    self.device_active = true;
                    debug!("capture device started");
                }
                Err(e) => {
                    warn!("capture device unavailable: {e}");
                    self.session.device_unavailable(e.to_string());
                }
            }
        } else if !wanted && self.device_active {
            self.device.release();
            self.device_active = false;
            debug!("capture device released");
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.device_active {
            info!("releasing capture device on drop");
            self.device.release();
        }
    }
}
