//! Flow configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use facegate_quality::{FrameQualityGate, QualityThresholds};
use facegate_submission::{ComplianceBackend, HttpComplianceBackend, SubmissionOrchestrator};
use facegate_token::{SigningSecret, TokenValidator};
use facegate_utils::LogFormat;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::controller::FlowComponents;
use crate::error::ConfigError;

/// A secret string that is wiped on drop and never printed.
#[derive(Clone, Default, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString(<redacted>)")
    }
}

/// Configuration for a verification flow.
///
/// Can be loaded from a TOML file via [`FlowConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Compliance API base URL, without the version segment.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Whole-request timeout for backend calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// HS256 key for token signatures. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub token_secret: Option<SecretString>,

    /// Accept tokens without a signature check when no secret is set.
    #[serde(default)]
    pub allow_unverified_tokens: bool,

    /// Where to send the user when the entry parameters name no callback.
    #[serde(default = "default_callback_url")]
    pub default_callback_url: String,

    /// Fallback destination when the callback URL is unusable.
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,

    /// Frames and commands queued per session before new frames are dropped.
    #[serde(default = "default_frame_channel_capacity")]
    pub frame_channel_capacity: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Quality gate thresholds.
    #[serde(default)]
    pub quality: QualityThresholds,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_callback_url() -> String {
    "http://localhost:3000/dashboard/kyc".to_string()
}

fn default_dashboard_url() -> String {
    "http://localhost:3000/dashboard".to_string()
}

fn default_frame_channel_capacity() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl FlowConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string. The token secret is
    /// omitted.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.quality
            .validate()
            .map_err(ConfigError::InvalidThresholds)?;
        for url in [&self.api_base_url, &self.dashboard_url] {
            reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Build the token validator.
    ///
    /// Without a secret this fails unless `allow_unverified_tokens` is set,
    /// in which case the validator only decodes.
    pub fn build_validator(&self) -> Result<TokenValidator, ConfigError> {
        match self.token_secret.as_ref().filter(|s| !s.expose().is_empty()) {
            Some(secret) => Ok(TokenValidator::hs256(SigningSecret::new(
                secret.expose().as_bytes(),
            ))),
            None if self.allow_unverified_tokens => Ok(TokenValidator::decode_only_insecure()),
            None => Err(ConfigError::MissingTokenSecret),
        }
    }

    pub fn build_backend(&self) -> HttpComplianceBackend {
        HttpComplianceBackend::with_timeouts(
            self.api_base_url.clone(),
            self.api_version.clone(),
            self.request_timeout(),
            self.connect_timeout(),
        )
    }

    /// Everything a session needs, talking to `backend`.
    pub fn components(
        &self,
        backend: Arc<dyn ComplianceBackend>,
    ) -> Result<FlowComponents, ConfigError> {
        Ok(FlowComponents {
            gate: FrameQualityGate::new(self.quality.clone()),
            validator: Arc::new(self.build_validator()?),
            orchestrator: SubmissionOrchestrator::new(backend),
            default_callback_url: self.default_callback_url.clone(),
            dashboard_url: self.dashboard_url.clone(),
        })
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            token_secret: None,
            allow_unverified_tokens: false,
            default_callback_url: default_callback_url(),
            dashboard_url: default_dashboard_url(),
            frame_channel_capacity: default_frame_channel_capacity(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            quality: QualityThresholds::default(),
        }
    }
}
