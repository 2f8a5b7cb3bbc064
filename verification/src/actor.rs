//! Session actor.
//!
//! A [`SessionController`] is owned by a single task; callers talk to it
//! through a cloneable [`SessionHandle`]. Commands are applied strictly in
//! arrival order, so a frame's verdict is always in place before a capture
//! request queued after it is judged.
//!
//! Frames are offered with `try_send`: when the task falls behind, new
//! frames are dropped rather than queued. Submissions run on their own
//! task and report back tagged with their attempt id; results for attempts
//! the session has moved past are discarded.

use facegate_token::TokenError;
use facegate_types::{
    FaceLandmarkFrame, FlowResult, ImageBlob, QualityVerdict, SubmissionResult, UserId,
};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::{SessionController, SubmitStart};
use crate::error::VerificationError;
use crate::session::CaptureOutcome;
use crate::state::SessionPhase;

/// Point-in-time view of a session, published after every command.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub last_verdict: QualityVerdict,
    pub has_captured_image: bool,
    pub subject_id: Option<UserId>,
    pub error_message: Option<String>,
    pub failure_detail: Option<String>,
    pub submission_result: Option<SubmissionResult>,
    pub flow_result: Option<FlowResult>,
    /// Where to send the user once the session has succeeded or been left.
    pub redirect_url: Option<String>,
}

impl SessionSnapshot {
    pub fn of(controller: &SessionController) -> Self {
        let session = controller.session();
        let flow_result = session.flow_result();
        let redirect_url = match (session.phase(), &flow_result) {
            (SessionPhase::Success, Some(result)) => {
                Some(controller.redirects().completion_redirect(result))
            }
            (SessionPhase::Closed, Some(result)) if result.success => {
                Some(controller.redirects().completion_redirect(result))
            }
            (SessionPhase::Closed, _) => Some(controller.redirects().cancel_redirect()),
            _ => None,
        };
        Self {
            phase: session.phase(),
            last_verdict: session.last_verdict().clone(),
            has_captured_image: session.captured_image().is_some(),
            subject_id: session.subject_id(),
            error_message: session.error_message().map(str::to_string),
            failure_detail: session.failure_detail().map(str::to_string),
            submission_result: session.submission_result().cloned(),
            flow_result,
            redirect_url,
        }
    }
}

/// Immediate answer to a submit command. The outcome itself arrives later
/// through the snapshot channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitAck {
    Started { attempt: u64 },
    TokenRejected(TokenError),
}

type Reply<T> = oneshot::Sender<Result<T, VerificationError>>;

enum Command {
    Begin(Reply<()>),
    Frame(FaceLandmarkFrame),
    Capture(ImageBlob, Reply<CaptureOutcome>),
    Retake(Reply<()>),
    Reset(Reply<()>),
    Submit(Reply<SubmitAck>),
    Leave(oneshot::Sender<bool>),
}

pub struct SessionActor {
    controller: SessionController,
    commands: mpsc::Receiver<Command>,
    completions_tx: mpsc::UnboundedSender<(u64, SubmissionResult)>,
    completions: mpsc::UnboundedReceiver<(u64, SubmissionResult)>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl SessionActor {
    /// Spawn the actor on the current runtime.
    ///
    /// `frame_capacity` bounds the command queue; frames beyond it are dropped.
    pub fn spawn(
        controller: SessionController,
        frame_capacity: usize,
    ) -> (SessionHandle, JoinHandle<()>) {
        let (commands_tx, commands) = mpsc::channel(frame_capacity.max(1));
        let (completions_tx, completions) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(SessionSnapshot::of(&controller));

        let actor = Self {
            controller,
            commands,
            completions_tx,
            completions,
            snapshots,
        };
        let task = tokio::spawn(actor.run());

        let handle = SessionHandle {
            commands: commands_tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else {
                        debug!("all session handles dropped");
                        break;
                    };
                    self.handle(command);
                }
                Some((attempt, result)) = self.completions.recv() => {
                    self.controller.finish_submit(attempt, result);
                    self.publish();
                }
            }
            if self.controller.phase() == SessionPhase::Closed {
                break;
            }
        }
        if self.controller.phase() != SessionPhase::Closed {
            self.controller.leave();
            self.publish();
        }
    }

    /// Apply one command. The new snapshot is published before the reply is
    /// sent, so a caller that sees the reply also sees the state it caused.
    fn handle(&mut self, command: Command) {
        match command {
            Command::Begin(reply) => {
                let result = self.controller.begin();
                self.respond(reply, result);
            }
            Command::Frame(frame) => {
                if self.controller.on_frame(&frame).is_some() {
                    self.publish();
                }
            }
            Command::Capture(image, reply) => {
                let result = self.controller.capture(image);
                self.respond(reply, result);
            }
            Command::Retake(reply) => {
                let result = self.controller.retake();
                self.respond(reply, result);
            }
            Command::Reset(reply) => {
                let result = self.controller.reset();
                self.respond(reply, result);
            }
            Command::Submit(reply) => {
                let result = self.controller.begin_submit().map(|start| self.start(start));
                self.respond(reply, result);
            }
            Command::Leave(reply) => {
                let abandoned = self.controller.leave();
                self.publish();
                let _ = reply.send(abandoned);
            }
        }
    }

    fn respond<T>(&self, reply: Reply<T>, result: Result<T, VerificationError>) {
        self.publish();
        let _ = reply.send(result);
    }

    fn start(&self, start: SubmitStart) -> SubmitAck {
        match start {
            SubmitStart::Started(job) => {
                let attempt = job.attempt();
                let completions = self.completions_tx.clone();
                tokio::spawn(async move {
                    let (attempt, result) = job.run().await;
                    if completions.send((attempt, result)).is_err() {
                        info!(attempt, "session ended before submission finished, result discarded");
                    }
                });
                SubmitAck::Started { attempt }
            }
            SubmitStart::TokenRejected(e) => SubmitAck::TokenRejected(e),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(SessionSnapshot::of(&self.controller));
    }
}

/// Cloneable handle to a running [`SessionActor`].
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn begin(&self) -> Result<(), VerificationError> {
        self.request(Command::Begin).await
    }

    /// Offer a frame without waiting. Returns `false` if it was dropped
    /// because the session is busy or gone.
    pub fn offer_frame(&self, frame: FaceLandmarkFrame) -> bool {
        match self.commands.try_send(Command::Frame(frame)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("session busy, frame dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    pub async fn capture(&self, image: ImageBlob) -> Result<CaptureOutcome, VerificationError> {
        self.request(|reply| Command::Capture(image, reply)).await
    }

    pub async fn retake(&self) -> Result<(), VerificationError> {
        self.request(Command::Retake).await
    }

    pub async fn reset(&self) -> Result<(), VerificationError> {
        self.request(Command::Reset).await
    }

    /// Start a submission. Returns once the session has committed to it (or
    /// refused); use [`wait_for`](Self::wait_for) to observe the outcome.
    pub async fn submit(&self) -> Result<SubmitAck, VerificationError> {
        self.request(Command::Submit).await
    }

    /// Close the session. Returns `true` if a submission was abandoned.
    pub async fn leave(&self) -> Result<bool, VerificationError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Leave(tx))
            .await
            .map_err(|_| VerificationError::SessionClosed)?;
        rx.await.map_err(|_| VerificationError::SessionClosed)
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Fails with `SessionClosed` if the actor stops first without ever
    /// satisfying it.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<SessionSnapshot, VerificationError>
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| VerificationError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    /// Wait until the session leaves `Submitting`.
    pub async fn settled(&self) -> Result<SessionSnapshot, VerificationError> {
        self.wait_for(|s| s.phase != SessionPhase::Submitting).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, VerificationError> {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(make(tx)).await.is_err() {
            warn!("command sent to a closed session");
            return Err(VerificationError::SessionClosed);
        }
        rx.await.map_err(|_| VerificationError::SessionClosed)?
    }
}
