//! Nullable compliance backend: scripted replies, recorded calls.

use async_trait::async_trait;
use facegate_submission::{BackendResponse, ComplianceBackend, CreateRecordRequest, TransportError};
use facegate_types::{AccessToken, ImageBlob};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::Semaphore;

type Reply = Result<BackendResponse, TransportError>;

/// What the backend saw for one upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadCall {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub token: String,
}

/// A compliance backend that never touches the network.
///
/// Replies are taken from per-endpoint scripts; once a script is exhausted
/// the backend answers with a success carrying the default asset URL or
/// record id.
pub struct NullBackend {
    upload_script: Mutex<VecDeque<Reply>>,
    create_script: Mutex<VecDeque<Reply>>,
    default_asset_url: String,
    default_record_id: i64,
    uploads: Mutex<Vec<UploadCall>>,
    creates: Mutex<Vec<CreateRecordRequest>>,
    hold_uploads: AtomicBool,
    upload_permits: Semaphore,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::succeeding("https://null.backend/selfie.jpg", 1)
    }

    /// Backend whose default replies are successes with these values.
    pub fn succeeding(asset_url: impl Into<String>, record_id: i64) -> Self {
        Self {
            upload_script: Mutex::new(VecDeque::new()),
            create_script: Mutex::new(VecDeque::new()),
            default_asset_url: asset_url.into(),
            default_record_id: record_id,
            uploads: Mutex::new(Vec::new()),
            creates: Mutex::new(Vec::new()),
            hold_uploads: AtomicBool::new(false),
            upload_permits: Semaphore::new(0),
        }
    }

    /// Queue the reply for the next upload.
    pub fn push_upload(&self, reply: Reply) {
        lock(&self.upload_script).push_back(reply);
    }

    /// Queue the reply for the next record creation.
    pub fn push_create(&self, reply: Reply) {
        lock(&self.create_script).push_back(reply);
    }

    /// Make uploads wait until [`NullBackend::release_uploads`] is called.
    /// The call is recorded before it waits.
    pub fn hold_uploads(&self) {
        self.hold_uploads.store(true, Ordering::SeqCst);
    }

    /// Let `n` held uploads proceed.
    pub fn release_uploads(&self, n: usize) {
        self.upload_permits.add_permits(n);
    }

    pub fn uploads(&self) -> Vec<UploadCall> {
        lock(&self.uploads).clone()
    }

    pub fn upload_count(&self) -> usize {
        lock(&self.uploads).len()
    }

    pub fn create_requests(&self) -> Vec<CreateRecordRequest> {
        lock(&self.creates).clone()
    }

    fn default_upload(&self) -> Reply {
        Ok(BackendResponse::new(
            200,
            format!(r#"{{"photo_url":"{}"}}"#, self.default_asset_url),
        ))
    }

    fn default_create(&self, request: &CreateRecordRequest) -> Reply {
        Ok(BackendResponse::new(
            200,
            format!(
                r#"{{"id":{},"photo_url":"{}","user_id":{},"status":"pending"}}"#,
                self.default_record_id, request.photo_url, request.user_id
            ),
        ))
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComplianceBackend for NullBackend {
    async fn upload_photo(&self, image: &ImageBlob, token: &AccessToken) -> Reply {
        lock(&self.uploads).push(UploadCall {
            bytes: image.bytes().to_vec(),
            mime_type: image.mime_type().to_string(),
            token: token.as_str().to_string(),
        });

        if self.hold_uploads.load(Ordering::SeqCst) {
            if let Ok(permit) = self.upload_permits.acquire().await {
                permit.forget();
            }
        }

        let scripted = lock(&self.upload_script).pop_front();
        scripted.unwrap_or_else(|| self.default_upload())
    }

    async fn create_photo_record(
        &self,
        request: &CreateRecordRequest,
        _token: &AccessToken,
    ) -> Reply {
        lock(&self.creates).push(request.clone());
        let scripted = lock(&self.create_script).pop_front();
        scripted.unwrap_or_else(|| self.default_create(request))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
