//! The verification session state machine.
//!
//! Transitions are pure: no I/O, no clock, no device handling. The
//! controller feeds in verdicts and token validation results and performs
//! the side effects each transition calls for.

use facegate_token::{TokenError, ValidatedToken};
use facegate_types::{
    FlowResult, ImageBlob, QualityReason, QualityVerdict, SubmissionOutcome, SubmissionResult,
    UserId,
};
use tracing::{debug, info, warn};

use crate::error::VerificationError;
use crate::state::{SessionPhase, SessionState};

/// Shown when the flow is entered without a token.
pub const NO_TOKEN_MESSAGE: &str =
    "Missing authentication token. Please return to the app and try again.";

/// Shown when the entry token is present but unusable.
pub const INVALID_TOKEN_MESSAGE: &str =
    "Your verification link is invalid or has expired. Please return to the app and try again.";

/// Shown for every submission failure. Details go to `failure_detail`.
pub const GENERIC_FAILURE_MESSAGE: &str = "Verification failed. Please try again.";

/// Shown when the capture device cannot be acquired.
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "Unable to access camera. Please check permissions.";

/// Flow result reason when the user leaves before finishing.
pub const USER_CANCELLED_REASON: &str = "user_cancelled";

/// Result of a capture request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Image stored; the session is now in review.
    Captured,
    /// The latest verdict was not OK; nothing changed.
    Refused(QualityReason),
}

/// A submission the session has committed to.
///
/// `attempt` must be handed back to [`VerificationSession::apply_submission`]
/// so that results from abandoned attempts can be recognized.
#[derive(Clone, Debug)]
pub struct SubmissionTicket {
    pub attempt: u64,
    pub image: ImageBlob,
    pub subject_id: UserId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(SessionPhase),
    /// The attempt no longer matches the session; the result was dropped.
    Discarded,
}

#[derive(Debug)]
pub struct VerificationSession {
    state: SessionState,
    has_token: bool,
    last_verdict: QualityVerdict,
    subject_id: Option<UserId>,
    submission_result: Option<SubmissionResult>,
    error_message: Option<String>,
    failure_detail: Option<String>,
    attempts: u64,
}

impl VerificationSession {
    /// Start a session. Without a token it goes straight to `NoToken`.
    pub fn enter(has_token: bool) -> Self {
        let (state, error_message) = if has_token {
            (SessionState::Intro, None)
        } else {
            (SessionState::NoToken, Some(NO_TOKEN_MESSAGE.to_string()))
        };
        Self {
            state,
            has_token,
            last_verdict: QualityVerdict::pending(),
            subject_id: None,
            submission_result: None,
            error_message,
            failure_detail: None,
            attempts: 0,
        }
    }

    /// Start a session whose entry token failed validation. Terminal, like
    /// a missing token, but with the rejection kept as diagnostic detail.
    pub fn enter_rejected(error: &TokenError) -> Self {
        let mut session = Self::enter(false);
        session.error_message = Some(INVALID_TOKEN_MESSAGE.to_string());
        session.failure_detail = Some(format!("token rejected: {error}"));
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    pub fn captured_image(&self) -> Option<&ImageBlob> {
        self.state.captured_image()
    }

    pub fn last_verdict(&self) -> &QualityVerdict {
        &self.last_verdict
    }

    /// Subject of the last successfully re-validated token.
    pub fn subject_id(&self) -> Option<UserId> {
        self.subject_id
    }

    pub fn submission_result(&self) -> Option<&SubmissionResult> {
        self.submission_result.as_ref()
    }

    /// User-facing message for the current problem, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Diagnostic detail behind the last failure. Never shown to the user.
    pub fn failure_detail(&self) -> Option<&str> {
        self.failure_detail.as_deref()
    }

    /// Number of submission attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Intro -> CameraActive. Without a token this routes to `NoToken`.
    pub fn begin(&mut self) -> Result<(), VerificationError> {
        if !matches!(self.state, SessionState::Intro) {
            return Err(self.not_allowed("begin"));
        }
        if !self.has_token {
            self.transition(SessionState::NoToken);
            self.error_message = Some(NO_TOKEN_MESSAGE.to_string());
            return Ok(());
        }
        self.open_camera();
        Ok(())
    }

    /// Record the verdict for the latest frame.
    ///
    /// Only meaningful while the live preview is showing; returns `false`
    /// and ignores the verdict in every other state.
    pub fn observe(&mut self, verdict: QualityVerdict) -> bool {
        if !matches!(self.state, SessionState::CameraActive) {
            return false;
        }
        self.last_verdict = verdict;
        true
    }

    /// Store `image` if the latest verdict is OK.
    ///
    /// A non-OK verdict is not an error: the request is refused and nothing
    /// changes.
    pub fn capture(&mut self, image: ImageBlob) -> Result<CaptureOutcome, VerificationError> {
        if !matches!(self.state, SessionState::CameraActive) {
            return Err(self.not_allowed("capture"));
        }
        if !self.last_verdict.ok {
            debug!(reason = %self.last_verdict.reason_code, "capture refused");
            return Ok(CaptureOutcome::Refused(self.last_verdict.reason_code));
        }
        debug!(bytes = image.len(), "image captured");
        self.transition(SessionState::Review { image });
        Ok(CaptureOutcome::Captured)
    }

    /// Review/Failed -> CameraActive, discarding the image and any error.
    pub fn retake(&mut self) -> Result<(), VerificationError> {
        match self.state {
            SessionState::Review { .. } | SessionState::Failed { .. } => {
                self.clear_errors();
                self.open_camera();
                Ok(())
            }
            _ => Err(self.not_allowed("retake")),
        }
    }

    /// Like [`retake`](Self::retake), but also forgets the last submission result.
    pub fn reset(&mut self) -> Result<(), VerificationError> {
        match self.state {
            SessionState::Review { .. } | SessionState::Failed { .. } => {
                self.clear_errors();
                self.submission_result = None;
                self.open_camera();
                Ok(())
            }
            _ => Err(self.not_allowed("reset")),
        }
    }

    /// Commit to a submission using a freshly computed token validation.
    ///
    /// Allowed from `Review` and, to resubmit the same image, from `Failed`.
    /// A rejected token moves the session to `Failed` without starting an
    /// attempt and is returned as `Ok(Err(..))`.
    pub fn begin_submission(
        &mut self,
        validation: Result<ValidatedToken, TokenError>,
    ) -> Result<Result<SubmissionTicket, TokenError>, VerificationError> {
        let image = match &self.state {
            SessionState::Review { image } | SessionState::Failed { image } => image.clone(),
            SessionState::Submitting { .. } => return Err(VerificationError::SubmissionInFlight),
            SessionState::CameraActive => return Err(VerificationError::NoCapturedImage),
            _ => return Err(self.not_allowed("submit")),
        };

        let validated = match validation {
            Ok(validated) => validated,
            Err(e) => {
                warn!(code = e.code(), "token rejected at submission: {e}");
                self.error_message = Some(GENERIC_FAILURE_MESSAGE.to_string());
                self.failure_detail = Some(format!("token rejected: {e}"));
                self.transition(SessionState::Failed { image });
                return Ok(Err(e));
            }
        };

        self.attempts += 1;
        let attempt = self.attempts;
        self.subject_id = Some(validated.subject_id);
        self.clear_errors();
        self.submission_result = None;
        self.transition(SessionState::Submitting {
            image: image.clone(),
            attempt,
        });
        info!(attempt, subject = %validated.subject_id, "submission started");

        Ok(Ok(SubmissionTicket {
            attempt,
            image,
            subject_id: validated.subject_id,
        }))
    }

    /// Apply the result of attempt `attempt`.
    ///
    /// Results for any attempt other than the one currently in flight are
    /// discarded, including everything that arrives after the user left.
    pub fn apply_submission(&mut self, attempt: u64, result: SubmissionResult) -> ApplyOutcome {
        let image = match &self.state {
            SessionState::Submitting {
                image,
                attempt: current,
            } if *current == attempt => image.clone(),
            _ => {
                warn!(
                    attempt,
                    phase = %self.phase(),
                    outcome = ?result.outcome,
                    "stale submission result discarded"
                );
                return ApplyOutcome::Discarded;
            }
        };

        if result.is_success() {
            info!(attempt, verification_id = ?result.record_id, "verification succeeded");
            self.transition(SessionState::Success);
        } else {
            let detail = result
                .error_detail
                .clone()
                .unwrap_or_else(|| outcome_label(result.outcome).to_string());
            warn!(attempt, outcome = ?result.outcome, "verification failed: {detail}");
            self.error_message = Some(GENERIC_FAILURE_MESSAGE.to_string());
            self.failure_detail = Some(detail);
            self.transition(SessionState::Failed { image });
        }
        self.submission_result = Some(result);
        ApplyOutcome::Applied(self.phase())
    }

    /// The capture device could not be started. The session stays in the
    /// live preview so the user can retry after fixing permissions.
    pub fn device_unavailable(&mut self, detail: impl Into<String>) {
        self.error_message = Some(CAMERA_UNAVAILABLE_MESSAGE.to_string());
        self.failure_detail = Some(detail.into());
    }

    /// Any state -> Closed. Returns `true` if an attempt was abandoned.
    pub fn leave(&mut self) -> bool {
        if let SessionState::Closed { .. } = self.state {
            return false;
        }
        let abandoned = matches!(self.state, SessionState::Submitting { .. });
        let final_result = match self.state {
            SessionState::Success => self.flow_result(),
            _ => Some(FlowResult::failed(self.subject_id, USER_CANCELLED_REASON)),
        };
        info!(from = %self.phase(), abandoned, "session closed");
        self.transition(SessionState::Closed { final_result });
        abandoned
    }

    /// The result reported to the flow's caller; `None` while still in progress.
    pub fn flow_result(&self) -> Option<FlowResult> {
        match &self.state {
            SessionState::Success => Some(FlowResult::succeeded(
                self.submission_result.as_ref().and_then(|r| r.record_id),
                self.subject_id,
            )),
            SessionState::Failed { .. } => Some(FlowResult::failed(
                self.subject_id,
                self.failure_detail
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string()),
            )),
            SessionState::NoToken => Some(FlowResult::failed(
                None,
                self.failure_detail
                    .clone()
                    .unwrap_or_else(|| NO_TOKEN_MESSAGE.to_string()),
            )),
            SessionState::Closed { final_result } => final_result.clone(),
            _ => None,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.phase(), to = %next.phase(), "session transition");
        self.state = next;
    }

    fn open_camera(&mut self) {
        self.last_verdict = QualityVerdict::pending();
        self.transition(SessionState::CameraActive);
    }

    fn clear_errors(&mut self) {
        self.error_message = None;
        self.failure_detail = None;
    }

    fn not_allowed(&self, action: &'static str) -> VerificationError {
        match self.state {
            SessionState::Closed { .. } => VerificationError::SessionClosed,
            _ => VerificationError::NotAllowed {
                action,
                phase: self.phase(),
            },
        }
    }
}

fn outcome_label(outcome: SubmissionOutcome) -> &'static str {
    match outcome {
        SubmissionOutcome::Success => "success",
        SubmissionOutcome::UploadFailed => "upload failed",
        SubmissionOutcome::RecordCreateFailed => "record creation failed",
        SubmissionOutcome::NetworkError => "network error",
    }
}
