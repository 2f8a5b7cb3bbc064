//! Token validator.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use facegate_types::{Clock, SystemClock, Timestamp, UserId};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::claims::{claim_timestamp, subject_from_claims, TokenPayload};
use crate::error::TokenError;

/// base64url that tolerates both padded and unpadded segments.
const BASE64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// HMAC key for HS256 verification, wiped on drop.
#[derive(Clone)]
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/// How far a validated token can be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustLevel {
    /// Signature checked against the configured secret.
    Verified,
    /// Payload decoded without any signature check.
    DecodeOnly,
}

#[derive(Clone, Debug)]
enum Mode {
    Hs256(SigningSecret),
    DecodeOnly,
}

/// A token that passed validation, with the subject it authenticates.
#[derive(Clone, Debug)]
pub struct ValidatedToken {
    pub subject_id: UserId,
    pub payload: TokenPayload,
    pub trust: TrustLevel,
}

/// Validates bearer tokens: shape, signature, expiry, subject.
///
/// Pure apart from reading the clock; holds no per-token state.
#[derive(Clone)]
pub struct TokenValidator {
    mode: Mode,
    clock: Arc<dyn Clock>,
}

impl TokenValidator {
    /// Validator that verifies HS256 signatures against `secret`.
    pub fn hs256(secret: SigningSecret) -> Self {
        Self {
            mode: Mode::Hs256(secret),
            clock: Arc::new(SystemClock),
        }
    }

    /// Validator that decodes payloads without verifying signatures.
    ///
    /// Reduced-trust fallback for development against a backend that checks
    /// the bearer token itself. Never the default. Only the payload segment
    /// is read; the header is not inspected.
    pub fn decode_only_insecure() -> Self {
        warn!("token validator running in DECODE-ONLY mode: signatures are NOT verified");
        Self {
            mode: Mode::DecodeOnly,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the evaluation clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn trust_level(&self) -> TrustLevel {
        match self.mode {
            Mode::Hs256(_) => TrustLevel::Verified,
            Mode::DecodeOnly => TrustLevel::DecodeOnly,
        }
    }

    /// Validate against the configured clock.
    pub fn validate(&self, token: &str) -> Result<ValidatedToken, TokenError> {
        self.validate_at(token, self.clock.now())
    }

    /// Validate against an explicit evaluation instant.
    pub fn validate_at(&self, token: &str, now: Timestamp) -> Result<ValidatedToken, TokenError> {
        let result = self.check(token, now);
        match &result {
            Ok(validated) => {
                if validated.trust == TrustLevel::DecodeOnly {
                    warn!(
                        subject = %validated.subject_id,
                        "accepted token without signature verification (decode-only mode)"
                    );
                }
            }
            Err(e) => debug!(code = e.code(), "token rejected: {e}"),
        }
        result
    }

    fn check(&self, token: &str, now: Timestamp) -> Result<ValidatedToken, TokenError> {
        let token = token.trim();
        let payload_segment = split_segments(token)?;

        let claims = match &self.mode {
            Mode::Hs256(secret) => verify_hs256(token, secret)?,
            Mode::DecodeOnly => decode_payload(payload_segment)?,
        };

        if let Some(expired_at) = claim_timestamp(&claims, "exp") {
            if expired_at.is_before(now) {
                return Err(TokenError::Expired { expired_at, now });
            }
        }

        let subject_id = subject_from_claims(&claims).ok_or(TokenError::NoSubject)?;
        Ok(ValidatedToken {
            subject_id,
            payload: TokenPayload::from_claims(subject_id, claims),
            trust: self.trust_level(),
        })
    }
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator")
            .field("trust", &self.trust_level())
            .finish()
    }
}

/// Check the compact shape and return the payload segment.
fn split_segments(token: &str) -> Result<&str, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    match parts.as_slice() {
        [header, payload, signature]
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            Ok(*payload)
        }
        _ => Err(TokenError::Malformed(format!(
            "expected 3 non-empty segments, found {} segment(s)",
            parts.len()
        ))),
    }
}

/// Signature, algorithm and claim decoding via `jsonwebtoken`. Expiry and
/// subject are left to the caller so they follow the millisecond rules.
fn verify_hs256(token: &str, secret: &SigningSecret) -> Result<Map<String, Value>, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(secret.as_bytes());
    jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                TokenError::InvalidSignature
            }
            _ => TokenError::Malformed(e.to_string()),
        })
}

/// Decode-only path: base64url (padding optional) JSON object, nothing else.
fn decode_payload(segment: &str) -> Result<Map<String, Value>, TokenError> {
    let bytes = BASE64URL_LENIENT
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("payload is not base64url: {e}")))?;
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TokenError::Malformed("payload is not a JSON object".into())),
        Err(e) => Err(TokenError::Malformed(format!("payload is not valid JSON: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::sign_hs256;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    const SECRET: &[u8] = b"kyc-test-secret";
    const NOW_SECS: u64 = 1_700_000_000;

    fn now() -> Timestamp {
        Timestamp::from_secs(NOW_SECS)
    }

    fn validator() -> TokenValidator {
        TokenValidator::hs256(SigningSecret::new(SECRET))
    }

    fn unsigned(header: &str, claims: &Value) -> String {
        format!(
            "{}.{}.c2ln",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        )
    }

    #[test]
    fn valid_token_yields_subject() {
        let token = sign_hs256(&json!({"user_id": 42, "exp": NOW_SECS + 60}), SECRET).unwrap();
        let validated = validator().validate_at(&token, now()).unwrap();
        assert_eq!(validated.subject_id.get(), 42);
        assert_eq!(validated.trust, TrustLevel::Verified);
        assert_eq!(validated.payload.expires_at_unix, Some((NOW_SECS + 60) as i64));
    }

    #[test]
    fn wrong_segment_count_is_malformed() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            let err = validator().validate_at(token, now()).unwrap_err();
            assert!(matches!(err, TokenError::Malformed(_)), "{token:?} gave {err:?}");
        }
    }

    #[test]
    fn garbage_payload_is_malformed() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
        let token = format!("{header}.!!!.c2ln");
        assert!(matches!(
            TokenValidator::decode_only_insecure().validate_at(&token, now()),
            Err(TokenError::Malformed(_))
        ));

        let array_payload = unsigned(r#"{"alg":"HS256"}"#, &json!([1, 2]));
        assert!(matches!(
            TokenValidator::decode_only_insecure().validate_at(&array_payload, now()),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let token = sign_hs256(&json!({"user_id": 42}), SECRET).unwrap();
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        parts[1] = URL_SAFE_NO_PAD.encode(json!({"user_id": 43}).to_string());
        let forged = parts.join(".");
        assert_eq!(
            validator().validate_at(&forged, now()).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn wrong_secret_fails_signature() {
        let token = sign_hs256(&json!({"user_id": 42}), b"other-secret").unwrap();
        assert_eq!(
            validator().validate_at(&token, now()).unwrap_err(),
            TokenError::InvalidSignature
        );
    }

    #[test]
    fn other_algorithms_are_rejected_when_key_configured() {
        let hs384 = unsigned(r#"{"alg":"HS384"}"#, &json!({"user_id": 42}));
        assert_eq!(
            validator().validate_at(&hs384, now()).unwrap_err(),
            TokenError::InvalidSignature
        );

        // `none` is not an algorithm name the verifier recognizes at all.
        let none = unsigned(r#"{"alg":"none"}"#, &json!({"user_id": 42}));
        assert!(matches!(
            validator().validate_at(&none, now()),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn expired_one_second_ago() {
        let token = sign_hs256(&json!({"user_id": 42, "exp": NOW_SECS - 1}), SECRET).unwrap();
        let err = validator().validate_at(&token, now()).unwrap_err();
        assert!(matches!(err, TokenError::Expired { .. }));
        assert_eq!(err.code(), "EXPIRED");
    }

    #[test]
    fn expiry_compares_in_milliseconds() {
        let token = sign_hs256(&json!({"user_id": 42, "exp": NOW_SECS}), SECRET).unwrap();
        assert!(validator().validate_at(&token, now()).is_ok());
        let later = Timestamp::from_millis(now().as_millis() + 1);
        assert!(matches!(
            validator().validate_at(&token, later),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn fractional_expiry_is_not_truncated() {
        let claims = json!({"user_id": 42, "exp": NOW_SECS as f64 + 0.5});
        let token = sign_hs256(&claims, SECRET).unwrap();
        let before = Timestamp::from_millis(now().as_millis() + 200);
        assert!(validator().validate_at(&token, before).is_ok());
        let at = Timestamp::from_millis(now().as_millis() + 500);
        assert!(validator().validate_at(&token, at).is_ok());
        let after = Timestamp::from_millis(now().as_millis() + 501);
        assert!(matches!(
            validator().validate_at(&token, after),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn missing_exp_never_expires() {
        let token = sign_hs256(&json!({"user_id": 42}), SECRET).unwrap();
        let far_future = Timestamp::from_secs(NOW_SECS * 100);
        assert!(validator().validate_at(&token, far_future).is_ok());
    }

    #[test]
    fn non_numeric_exp_is_ignored() {
        let token = sign_hs256(&json!({"user_id": 42, "exp": "tomorrow"}), SECRET).unwrap();
        assert!(validator().validate_at(&token, now()).is_ok());
    }

    #[test]
    fn no_subject() {
        let token = sign_hs256(&json!({"sub": "not-a-number"}), SECRET).unwrap();
        assert_eq!(
            validator().validate_at(&token, now()).unwrap_err(),
            TokenError::NoSubject
        );
    }

    #[test]
    fn expiry_is_checked_before_subject() {
        let token = sign_hs256(&json!({"exp": NOW_SECS - 10}), SECRET).unwrap();
        assert!(matches!(
            validator().validate_at(&token, now()),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn decode_only_accepts_unsigned_tokens() {
        let token = unsigned(r#"{"alg":"none"}"#, &json!({"sub": "17"}));
        let validated = TokenValidator::decode_only_insecure()
            .validate_at(&token, now())
            .unwrap();
        assert_eq!(validated.subject_id.get(), 17);
        assert_eq!(validated.trust, TrustLevel::DecodeOnly);
    }

    #[test]
    fn decode_only_still_checks_expiry() {
        let token = unsigned(r#"{"alg":"none"}"#, &json!({"user_id": 3, "exp": NOW_SECS - 1}));
        assert!(matches!(
            TokenValidator::decode_only_insecure().validate_at(&token, now()),
            Err(TokenError::Expired { .. })
        ));
    }

    #[test]
    fn decode_only_reads_the_payload_alone() {
        let payload = URL_SAFE_NO_PAD.encode(json!({"user_id": 8}).to_string());
        for header in ["not-a-header", "e30", "bnVsbA"] {
            let token = format!("{header}.{payload}.sig");
            let validated = TokenValidator::decode_only_insecure()
                .validate_at(&token, now())
                .unwrap();
            assert_eq!(validated.subject_id.get(), 8);
        }
        let token = format!("not-a-header.{payload}.sig");
        assert!(matches!(
            validator().validate_at(&token, now()),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn padded_segments_are_accepted() {
        use base64::engine::general_purpose::URL_SAFE;
        let token = format!(
            "{}.{}.c2ln",
            URL_SAFE.encode(r#"{"alg":"none"}"#),
            URL_SAFE.encode(json!({"user_id": 5}).to_string())
        );
        assert!(TokenValidator::decode_only_insecure()
            .validate_at(&token, now())
            .is_ok());
    }

    #[test]
    fn secret_debug_is_redacted() {
        let printed = format!("{:?}", SigningSecret::new(SECRET));
        assert!(!printed.contains("kyc"));
    }
}
