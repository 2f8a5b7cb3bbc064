//! Where to send the user when the flow ends.
//!
//! The callback URL comes from the entry parameters, falling back to the
//! configured default. Outcome parameters are appended to whatever query the
//! callback already carries. An unparsable callback falls back to the
//! dashboard URL unchanged.

use facegate_types::{FlowResult, FlowStatus};
use reqwest::Url;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirects {
    callback_url: String,
    dashboard_url: String,
}

impl Redirects {
    pub fn new(callback_url: impl Into<String>, dashboard_url: impl Into<String>) -> Self {
        Self {
            callback_url: callback_url.into(),
            dashboard_url: dashboard_url.into(),
        }
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn dashboard_url(&self) -> &str {
        &self.dashboard_url
    }

    /// The user backed out before finishing.
    pub fn cancel_redirect(&self) -> String {
        self.with_params(&[("status", "failed"), ("reason", "user_cancelled")])
    }

    /// The flow reached a result.
    pub fn completion_redirect(&self, result: &FlowResult) -> String {
        match result.status {
            FlowStatus::Success => {
                let id = result
                    .verification_id
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                self.with_params(&[("status", "success"), ("verification_id", &id)])
            }
            FlowStatus::Failed => {
                let reason = result.reason.as_deref().unwrap_or("failed");
                self.with_params(&[("status", "failed"), ("reason", reason)])
            }
        }
    }

    fn with_params(&self, params: &[(&str, &str)]) -> String {
        match Url::parse(&self.callback_url) {
            Ok(mut url) => {
                url.query_pairs_mut().extend_pairs(params.iter().copied());
                url.into()
            }
            Err(e) => {
                warn!(callback = %self.callback_url, "unusable callback url, using dashboard: {e}");
                self.dashboard_url.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facegate_types::UserId;

    fn redirects(callback: &str) -> Redirects {
        Redirects::new(callback, "https://app.example.com/dashboard")
    }

    #[test]
    fn cancel_appends_status_and_reason() {
        let url = redirects("https://app.example.com/kyc/done").cancel_redirect();
        assert_eq!(
            url,
            "https://app.example.com/kyc/done?status=failed&reason=user_cancelled"
        );
    }

    #[test]
    fn existing_query_is_preserved() {
        let url = redirects("https://app.example.com/done?from=kyc").cancel_redirect();
        assert_eq!(
            url,
            "https://app.example.com/done?from=kyc&status=failed&reason=user_cancelled"
        );
    }

    #[test]
    fn success_carries_verification_id() {
        let result = FlowResult::succeeded(Some(42), UserId::new(7));
        let url = redirects("https://app.example.com/done").completion_redirect(&result);
        assert_eq!(
            url,
            "https://app.example.com/done?status=success&verification_id=42"
        );
    }

    #[test]
    fn failure_reason_is_encoded() {
        let result = FlowResult::failed(None, "upload failed: HTTP 500");
        let url = redirects("https://app.example.com/done").completion_redirect(&result);
        assert_eq!(
            url,
            "https://app.example.com/done?status=failed&reason=upload+failed%3A+HTTP+500"
        );
    }

    #[test]
    fn relative_callback_falls_back_to_dashboard() {
        let url = redirects("/dashboard/kyc").cancel_redirect();
        assert_eq!(url, "https://app.example.com/dashboard");
    }
}
