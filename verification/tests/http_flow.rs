//! A session configured from TOML, submitting over real HTTP to an
//! in-process mock of the compliance API.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use facegate_token::sign_hs256;
use facegate_types::{DetachedCapture, FaceLandmarkFrame, ImageBlob, Point2D};
use facegate_verification::{EntryParams, FlowConfig, SessionController, SessionPhase};
use serde_json::{json, Value};

#[derive(Default)]
struct Seen {
    uploaded: Vec<u8>,
    created: Option<Value>,
}

async fn upload(State(seen): State<Arc<Mutex<Seen>>>, mut multipart: Multipart) -> Json<Value> {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let bytes = field.bytes().await.unwrap();
        seen.lock().unwrap().uploaded = bytes.to_vec();
    }
    Json(json!({ "photo_url": "https://cdn.example.com/selfie-1.jpg" }))
}

async fn create(
    State(seen): State<Arc<Mutex<Seen>>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    seen.lock().unwrap().created = Some(body.clone());
    let record = json!({
        "id": 314,
        "photo_url": body["photo_url"],
        "user_id": body["user_id"],
        "status": "pending"
    });
    (StatusCode::CREATED, Json(record))
}

async fn spawn_api() -> (String, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let app = Router::new()
        .route("/v1/compliance/individual-verification/photo/upload", post(upload))
        .route("/v1/compliance/individual-verification/photo/create", post(create))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

fn good_frame() -> FaceLandmarkFrame {
    FaceLandmarkFrame {
        has_face: true,
        nose: Point2D { x: 0.5, y: 0.45 },
        left_ear: Point2D { x: 0.3, y: 0.45 },
        right_ear: Point2D { x: 0.7, y: 0.45 },
        eye_blink_left: 0.0,
        eye_blink_right: 0.0,
        average_brightness: 90.0,
    }
}

#[tokio::test]
async fn configured_flow_submits_over_http() {
    let (base_url, seen) = spawn_api().await;
    let config = FlowConfig::from_toml_str(&format!(
        r#"
            api_base_url = "{base_url}"
            token_secret = "http-flow-secret"
            default_callback_url = "https://app.example.com/kyc/done"
        "#
    ))
    .unwrap();

    // Far-future expiry; the validator reads the system clock here.
    let claims = json!({ "user_id": 21, "exp": 4_000_000_000u64 });
    let token = sign_hs256(&claims, b"http-flow-secret").unwrap();
    let backend = Arc::new(config.build_backend());
    let mut controller = SessionController::new(
        EntryParams::new(Some(token), None),
        config.components(backend).unwrap(),
        Box::new(DetachedCapture),
    );

    controller.begin().unwrap();
    assert!(controller.on_frame(&good_frame()).unwrap().ok);
    let image = ImageBlob::jpeg(vec![0xFF, 0xD8, 0xFF, 0xDB]).unwrap();
    controller.capture(image).unwrap();

    assert_eq!(controller.submit().await.unwrap(), SessionPhase::Success);
    let result = controller.flow_result().unwrap();
    assert_eq!(result.verification_id, Some(314));
    assert_eq!(
        controller.redirects().completion_redirect(&result),
        "https://app.example.com/kyc/done?status=success&verification_id=314"
    );

    let seen = seen.lock().unwrap();
    assert_eq!(seen.uploaded, vec![0xFF, 0xD8, 0xFF, 0xDB]);
    let created = seen.created.clone().unwrap();
    assert_eq!(created["photo_url"], "https://cdn.example.com/selfie-1.jpg");
    assert_eq!(created["user_id"], 21);
}

#[tokio::test]
async fn forged_token_never_reaches_the_backend() {
    let (base_url, seen) = spawn_api().await;
    let config = FlowConfig {
        api_base_url: base_url,
        token_secret: Some(facegate_verification::SecretString::new("real-secret")),
        ..FlowConfig::default()
    };
    let claims = json!({ "user_id": 21, "exp": 4_000_000_000u64 });
    let forged = sign_hs256(&claims, b"wrong-secret").unwrap();
    let backend = Arc::new(config.build_backend());
    let mut controller = SessionController::new(
        EntryParams::new(Some(forged), Some("https://partner.example/cb".into())),
        config.components(backend).unwrap(),
        Box::new(DetachedCapture),
    );

    assert_eq!(controller.phase(), SessionPhase::NoToken);
    assert!(controller.begin().is_err());
    assert!(controller.submit().await.is_err());
    let result = controller.flow_result().unwrap();
    assert!(result.reason.unwrap().contains("signature"));
    assert!(seen.lock().unwrap().uploaded.is_empty());
    assert!(seen.lock().unwrap().created.is_none());
}
