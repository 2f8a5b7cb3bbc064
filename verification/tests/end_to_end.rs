//! Whole-flow tests: actor, controller, gate, validator and orchestrator
//! wired together over nullable infrastructure.

use std::sync::Arc;
use std::time::Duration;

use facegate_nullables::{NullBackend, NullCaptureDevice, NullClock};
use facegate_quality::FrameQualityGate;
use facegate_submission::{BackendResponse, SubmissionOrchestrator};
use facegate_token::{sign_hs256, SigningSecret, TokenValidator};
use facegate_types::{FaceLandmarkFrame, ImageBlob, Point2D, SubmissionOutcome};
use facegate_verification::{
    CaptureOutcome, EntryParams, FlowComponents, SessionActor, SessionController, SessionHandle,
    SessionPhase, SubmitAck, VerificationError,
};
use serde_json::json;

const SECRET: &[u8] = b"end-to-end-secret";
const NOW_SECS: u64 = 1_700_000_000;
const CALLBACK: &str = "https://app.example.com/kyc/done";

struct Flow {
    handle: SessionHandle,
    backend: Arc<NullBackend>,
    device: NullCaptureDevice,
    task: tokio::task::JoinHandle<()>,
}

fn token() -> String {
    sign_hs256(&json!({ "user_id": 7, "exp": NOW_SECS + 3600 }), SECRET).unwrap()
}

fn start_flow(token: Option<String>, backend: NullBackend) -> Flow {
    let backend = Arc::new(backend);
    let clock = Arc::new(NullClock::new(NOW_SECS));
    let components = FlowComponents {
        gate: FrameQualityGate::default(),
        validator: Arc::new(TokenValidator::hs256(SigningSecret::new(SECRET)).with_clock(clock)),
        orchestrator: SubmissionOrchestrator::new(backend.clone()),
        default_callback_url: CALLBACK.into(),
        dashboard_url: "https://app.example.com/dashboard".into(),
    };
    let device = NullCaptureDevice::new();
    let controller = SessionController::new(
        EntryParams::new(token, None),
        components,
        Box::new(device.clone()),
    );
    let (handle, task) = SessionActor::spawn(controller, 8);
    Flow {
        handle,
        backend,
        device,
        task,
    }
}

fn good_frame() -> FaceLandmarkFrame {
    FaceLandmarkFrame {
        has_face: true,
        nose: Point2D { x: 0.5, y: 0.5 },
        left_ear: Point2D { x: 0.25, y: 0.5 },
        right_ear: Point2D { x: 0.75, y: 0.5 },
        eye_blink_left: 0.05,
        eye_blink_right: 0.05,
        average_brightness: 128.0,
    }
}

fn selfie() -> ImageBlob {
    ImageBlob::jpeg(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap()
}

/// Begin, feed frames until one is judged OK, and capture.
async fn capture_good_selfie(handle: &SessionHandle) {
    handle.begin().await.unwrap();
    for _ in 0..5 {
        assert!(handle.offer_frame(good_frame()));
    }
    handle
        .wait_for(|s| s.last_verdict.ok)
        .await
        .expect("a good frame should be judged OK");
    assert_eq!(handle.capture(selfie()).await.unwrap(), CaptureOutcome::Captured);
}

#[tokio::test]
async fn good_selfie_completes_verification() {
    let flow = start_flow(Some(token()), NullBackend::succeeding("https://x/y.jpg", 42));
    capture_good_selfie(&flow.handle).await;

    let ack = flow.handle.submit().await.unwrap();
    assert_eq!(ack, SubmitAck::Started { attempt: 1 });

    let snapshot = flow.handle.settled().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Success);
    let result = snapshot.flow_result.clone().unwrap();
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "success": true, "verificationId": 42, "userId": 7, "status": "success" })
    );
    assert_eq!(
        snapshot.redirect_url.as_deref(),
        Some("https://app.example.com/kyc/done?status=success&verification_id=42")
    );

    let uploads = flow.backend.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bytes, selfie().bytes());
    assert_eq!(uploads[0].token, token());
    assert_eq!(flow.backend.create_requests()[0].photo_url, "https://x/y.jpg");
    assert!(!flow.device.is_active());
}

#[tokio::test]
async fn missing_token_never_opens_camera() {
    let flow = start_flow(None, NullBackend::new());
    let snapshot = flow.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::NoToken);
    assert!(snapshot.error_message.is_some());
    assert!(flow.handle.begin().await.is_err());
    assert_eq!(flow.device.starts(), 0);
}

#[tokio::test]
async fn capture_refused_while_frames_are_bad() {
    let flow = start_flow(Some(token()), NullBackend::new());
    flow.handle.begin().await.unwrap();

    let mut off_center = good_frame();
    off_center.nose = Point2D { x: 0.9, y: 0.5 };
    assert!(flow.handle.offer_frame(off_center));

    // Commands are ordered, so the frame has been judged by the time the
    // capture is handled.
    let outcome = flow.handle.capture(selfie()).await.unwrap();
    assert!(matches!(outcome, CaptureOutcome::Refused(_)));
    assert_eq!(flow.handle.snapshot().phase, SessionPhase::CameraActive);
    assert!(flow.device.is_active());
}

#[tokio::test]
async fn concurrent_submits_produce_one_upload() {
    let backend = NullBackend::succeeding("https://x/y.jpg", 42);
    backend.hold_uploads();
    let flow = start_flow(Some(token()), backend);
    capture_good_selfie(&flow.handle).await;

    let (first, second) = tokio::join!(flow.handle.submit(), flow.handle.submit());
    let results = [first, second];
    let started = results
        .iter()
        .filter(|r| matches!(r, Ok(SubmitAck::Started { .. })))
        .count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(VerificationError::SubmissionInFlight)))
        .count();
    assert_eq!((started, rejected), (1, 1));

    flow.backend.release_uploads(1);
    let snapshot = flow.handle.settled().await.unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Success);
    assert_eq!(flow.backend.upload_count(), 1);
    assert_eq!(flow.backend.create_requests().len(), 1);
}

#[tokio::test]
async fn leaving_mid_submission_discards_the_result() {
    let backend = NullBackend::succeeding("https://x/y.jpg", 42);
    backend.hold_uploads();
    let flow = start_flow(Some(token()), backend);
    capture_good_selfie(&flow.handle).await;
    flow.handle.submit().await.unwrap();

    assert!(flow.handle.leave().await.unwrap());
    flow.backend.release_uploads(1);
    tokio::time::timeout(Duration::from_secs(5), flow.task)
        .await
        .expect("actor should stop after leave")
        .unwrap();

    let snapshot = flow.handle.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Closed);
    let result = snapshot.flow_result.unwrap();
    assert!(!result.success);
    assert_eq!(result.reason.as_deref(), Some("user_cancelled"));
    assert_eq!(
        snapshot.redirect_url.as_deref(),
        Some("https://app.example.com/kyc/done?status=failed&reason=user_cancelled")
    );
    assert_eq!(
        flow.handle.capture(selfie()).await,
        Err(VerificationError::SessionClosed)
    );
    assert!(!flow.device.is_active());
}

#[tokio::test]
async fn failed_upload_can_be_retaken_and_resubmitted() {
    let backend = NullBackend::succeeding("https://x/y.jpg", 43);
    backend.push_upload(Ok(BackendResponse::new(500, "storage unavailable")));
    let flow = start_flow(Some(token()), backend);
    capture_good_selfie(&flow.handle).await;

    flow.handle.submit().await.unwrap();
    let failed = flow.handle.settled().await.unwrap();
    assert_eq!(failed.phase, SessionPhase::Failed);
    assert_eq!(
        failed.error_message.as_deref(),
        Some("Verification failed. Please try again.")
    );
    assert_eq!(
        failed.submission_result.as_ref().map(|r| r.outcome),
        Some(SubmissionOutcome::UploadFailed)
    );
    assert!(failed
        .failure_detail
        .as_deref()
        .unwrap()
        .contains("HTTP 500"));

    flow.handle.retake().await.unwrap();
    assert!(flow.device.is_active());
    assert!(flow.handle.offer_frame(good_frame()));
    flow.handle.wait_for(|s| s.last_verdict.ok).await.unwrap();
    flow.handle.capture(selfie()).await.unwrap();
    assert_eq!(
        flow.handle.submit().await.unwrap(),
        SubmitAck::Started { attempt: 2 }
    );
    let done = flow.handle.settled().await.unwrap();
    assert_eq!(done.flow_result.unwrap().verification_id, Some(43));
    assert_eq!(flow.backend.upload_count(), 2);
}

#[tokio::test]
async fn dropping_every_handle_releases_the_device() {
    let flow = start_flow(Some(token()), NullBackend::new());
    flow.handle.begin().await.unwrap();
    assert!(flow.device.is_active());
    let device = flow.device.clone();
    drop(flow.handle);
    tokio::time::timeout(Duration::from_secs(5), flow.task)
        .await
        .expect("actor should stop once handles are gone")
        .unwrap();
    assert!(!device.is_active());
    assert_eq!(device.releases(), 1);
}
