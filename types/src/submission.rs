//! Results of the two-phase compliance submission and of the whole flow.

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionOutcome {
    Success,
    UploadFailed,
    RecordCreateFailed,
    NetworkError,
}

/// Exactly one of these exists per submission attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub outcome: SubmissionOutcome,
    /// Set whenever the upload step succeeded, even if record creation then failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
}

impl SubmissionResult {
    pub fn success(asset_url: String, record_id: i64) -> Self {
        Self {
            outcome: SubmissionOutcome::Success,
            asset_url: Some(asset_url),
            record_id: Some(record_id),
            error_detail: None,
        }
    }

    pub fn upload_failed(detail: impl Into<String>) -> Self {
        Self {
            outcome: SubmissionOutcome::UploadFailed,
            asset_url: None,
            record_id: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn record_create_failed(asset_url: String, detail: impl Into<String>) -> Self {
        Self {
            outcome: SubmissionOutcome::RecordCreateFailed,
            asset_url: Some(asset_url),
            record_id: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn network_error(asset_url: Option<String>, detail: impl Into<String>) -> Self {
        Self {
            outcome: SubmissionOutcome::NetworkError,
            asset_url,
            record_id: None,
            error_detail: Some(detail.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SubmissionOutcome::Success
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowStatus {
    Success,
    Failed,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Success => "success",
            FlowStatus::Failed => "failed",
        }
    }
}

/// What the caller of the flow receives once a session reaches a terminal state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub status: FlowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FlowResult {
    pub fn succeeded(verification_id: Option<i64>, user_id: Option<UserId>) -> Self {
        Self {
            success: true,
            verification_id,
            user_id,
            status: FlowStatus::Success,
            reason: None,
        }
    }

    pub fn failed(user_id: Option<UserId>, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            verification_id: None,
            user_id,
            status: FlowStatus::Failed,
            reason: Some(reason.into()),
        }
    }
}
