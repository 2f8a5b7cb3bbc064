//! The compliance backend seam.
//!
//! Implementations only move bytes: they report the HTTP status and body
//! and leave every interpretation to the orchestrator.

use async_trait::async_trait;
use facegate_types::{AccessToken, ImageBlob, UserId};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Status and raw body of a backend reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackendResponse {
    pub status: u16,
    pub body: String,
}

impl BackendResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Identity document attached to the record by the document-bearing
/// endpoint variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub document_type: String,
    pub document_number: String,
}

/// JSON body of the record-creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRecordRequest {
    pub photo_url: String,
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
}

impl CreateRecordRequest {
    pub fn new(photo_url: impl Into<String>, user_id: UserId) -> Self {
        Self {
            photo_url: photo_url.into(),
            user_id,
            document_type: None,
            document_number: None,
        }
    }

    pub fn with_document(mut self, document: &IdentityDocument) -> Self {
        self.document_type = Some(document.document_type.clone());
        self.document_number = Some(document.document_number.clone());
        self
    }
}

#[async_trait]
pub trait ComplianceBackend: Send + Sync {
    /// `POST .../photo/upload`: multipart field `file`, bearer auth.
    async fn upload_photo(
        &self,
        image: &ImageBlob,
        token: &AccessToken,
    ) -> Result<BackendResponse, TransportError>;

    /// `POST .../photo/create`: JSON body, bearer auth.
    async fn create_photo_record(
        &self,
        request: &CreateRecordRequest,
        token: &AccessToken,
    ) -> Result<BackendResponse, TransportError>;
}
