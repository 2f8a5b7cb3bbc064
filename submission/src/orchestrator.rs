//! Upload-then-create submission.

use facegate_types::{AccessToken, ImageBlob, SubmissionResult, UserId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::{BackendResponse, ComplianceBackend, CreateRecordRequest, IdentityDocument};

/// Longest backend body kept in an error detail.
const MAX_DETAIL_BODY_CHARS: usize = 512;

#[derive(Debug, Deserialize)]
struct UploadPhotoResponse {
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatePhotoResponse {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    user_id: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

/// Turns one approved image into a compliance record.
#[derive(Clone)]
pub struct SubmissionOrchestrator {
    backend: Arc<dyn ComplianceBackend>,
    document: Option<IdentityDocument>,
}

impl SubmissionOrchestrator {
    pub fn new(backend: Arc<dyn ComplianceBackend>) -> Self {
        Self {
            backend,
            document: None,
        }
    }

    /// Attach an identity document to every created record.
    pub fn with_document(mut self, document: IdentityDocument) -> Self {
        self.document = Some(document);
        self
    }

    /// Run both steps. Never panics, never retries; always yields exactly one
    /// result.
    pub async fn submit(
        &self,
        image: &ImageBlob,
        subject_id: UserId,
        token: &AccessToken,
    ) -> SubmissionResult {
        info!(subject = %subject_id, bytes = image.len(), "submitting selfie");

        let asset_url = match self.upload(image, token).await {
            Ok(url) => url,
            Err(result) => return result,
        };

        let mut request = CreateRecordRequest::new(asset_url.clone(), subject_id);
        if let Some(document) = &self.document {
            request = request.with_document(document);
        }

        let response = match self.backend.create_photo_record(&request, token).await {
            Ok(response) => response,
            Err(e) => {
                warn!(subject = %subject_id, "record creation transport error: {e}");
                return SubmissionResult::network_error(
                    Some(asset_url),
                    format!("record creation request failed: {e}"),
                );
            }
        };

        if !response.is_success() {
            warn!(subject = %subject_id, status = response.status, "record creation rejected");
            return SubmissionResult::record_create_failed(
                asset_url,
                http_failure("record creation", &response),
            );
        }

        let created: CreatePhotoResponse = match serde_json::from_str(&response.body) {
            Ok(created) => created,
            Err(e) => {
                return SubmissionResult::record_create_failed(
                    asset_url,
                    format!("record creation failed: unreadable response: {e}"),
                )
            }
        };
        let Some(record_id) = created.id else {
            return SubmissionResult::record_create_failed(
                asset_url,
                "record creation failed: response carried no record id",
            );
        };
        if let Some(echoed) = created.user_id {
            if echoed as u64 != subject_id.get() {
                warn!(subject = %subject_id, echoed, "backend echoed a different user id");
            }
        }

        info!(
            subject = %subject_id,
            record_id,
            status = created.status.as_deref().unwrap_or("unknown"),
            "compliance record created"
        );
        SubmissionResult::success(asset_url, record_id)
    }

    async fn upload(&self, image: &ImageBlob, token: &AccessToken) -> Result<String, SubmissionResult> {
        let response = match self.backend.upload_photo(image, token).await {
            Ok(response) => response,
            Err(e) => {
                warn!("upload transport error: {e}");
                return Err(SubmissionResult::network_error(
                    None,
                    format!("upload request failed: {e}"),
                ));
            }
        };

        if !response.is_success() {
            warn!(status = response.status, "upload rejected");
            return Err(SubmissionResult::upload_failed(http_failure("upload", &response)));
        }

        // A success status without a usable URL is still a failed upload.
        serde_json::from_str::<UploadPhotoResponse>(&response.body)
            .ok()
            .and_then(|r| r.photo_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                warn!(status = response.status, "upload response carried no asset URL");
                SubmissionResult::upload_failed("upload failed: response carried no asset URL")
            })
    }
}

fn http_failure(step: &str, response: &BackendResponse) -> String {
    let body: String = response.body.chars().take(MAX_DETAIL_BODY_CHARS).collect();
    format!("{step} failed: HTTP {} - {}", response.status, body.trim())
}
