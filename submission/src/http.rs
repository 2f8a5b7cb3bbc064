//! reqwest-backed compliance backend.

use async_trait::async_trait;
use facegate_types::{AccessToken, ImageBlob, Timestamp};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

use crate::backend::{BackendResponse, ComplianceBackend, CreateRecordRequest};
use crate::error::TransportError;

/// Default timeout for backend requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default connection timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default API version path segment.
pub const DEFAULT_API_VERSION: &str = "v1";

const UPLOAD_PATH: &str = "compliance/individual-verification/photo/upload";
const CREATE_PATH: &str = "compliance/individual-verification/photo/create";

/// Talks to the compliance API over HTTPS.
///
/// `POST {base}/{version}/compliance/individual-verification/photo/{upload,create}`.
pub struct HttpComplianceBackend {
    /// HTTP client (reusable connection pool).
    http_client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl HttpComplianceBackend {
    /// Create a backend with default timeout settings.
    pub fn new(base_url: impl Into<String>, api_version: impl Into<String>) -> Self {
        Self::with_timeouts(base_url, api_version, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a backend with custom timeouts.
    pub fn with_timeouts(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into().trim_matches('/').to_string(),
        }
    }

    pub fn upload_url(&self) -> String {
        self.endpoint(UPLOAD_PATH)
    }

    pub fn create_url(&self) -> String {
        self.endpoint(CREATE_PATH)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_version, path)
    }
}

#[async_trait]
impl ComplianceBackend for HttpComplianceBackend {
    async fn upload_photo(
        &self,
        image: &ImageBlob,
        token: &AccessToken,
    ) -> Result<BackendResponse, TransportError> {
        let file_name = image.upload_file_name(Timestamp::now().as_millis());
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(file_name)
            .mime_str(image.mime_type())?;
        let form = Form::new().part("file", part);

        let url = self.upload_url();
        debug!(%url, bytes = image.len(), "uploading selfie");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.as_str())
            .multipart(form)
            .send()
            .await?;
        read_response(response).await
    }

    async fn create_photo_record(
        &self,
        request: &CreateRecordRequest,
        token: &AccessToken,
    ) -> Result<BackendResponse, TransportError> {
        let url = self.create_url();
        debug!(%url, user_id = %request.user_id, "creating photo record");
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token.as_str())
            .json(request)
            .send()
            .await?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<BackendResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(BackendResponse { status, body })
}
