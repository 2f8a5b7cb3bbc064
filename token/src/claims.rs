//! Decoded token payload.

use facegate_types::{Timestamp, UserId};
use serde_json::{Map, Value};

/// Claims of a token that passed validation.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenPayload {
    pub subject_id: UserId,
    /// `exp`, epoch seconds.
    pub expires_at_unix: Option<i64>,
    /// `iat`, epoch seconds.
    pub issued_at_unix: Option<i64>,
    pub raw_claims: Map<String, Value>,
}

impl TokenPayload {
    pub(crate) fn from_claims(subject_id: UserId, raw_claims: Map<String, Value>) -> Self {
        Self {
            subject_id,
            expires_at_unix: numeric_claim(&raw_claims, "exp"),
            issued_at_unix: numeric_claim(&raw_claims, "iat"),
            raw_claims,
        }
    }

    /// Expiry upscaled to the evaluation clock's resolution. Fractional
    /// seconds are kept.
    pub fn expires_at(&self) -> Option<Timestamp> {
        claim_timestamp(&self.raw_claims, "exp")
    }

    pub fn issued_at(&self) -> Option<Timestamp> {
        claim_timestamp(&self.raw_claims, "iat")
    }

    pub fn phone(&self) -> Option<&str> {
        self.str_claim("phone")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    pub fn callback_url(&self) -> Option<&str> {
        self.str_claim("callback_url")
    }

    pub fn audience(&self) -> Option<&str> {
        self.str_claim("aud")
    }

    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn kyc_id(&self) -> Option<i64> {
        self.raw_claims.get("kyc_id").and_then(Value::as_i64)
    }

    fn str_claim(&self, name: &str) -> Option<&str> {
        self.raw_claims.get(name).and_then(Value::as_str)
    }
}

/// Read a numeric claim, truncating fractional seconds. Non-numeric values
/// are treated as absent.
pub(crate) fn numeric_claim(claims: &Map<String, Value>, name: &str) -> Option<i64> {
    let value = claims.get(name)?;
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.floor().clamp(i64::MIN as f64, i64::MAX as f64) as i64)
    })
}

/// Read an epoch-seconds claim as milliseconds, keeping any fraction.
/// Negative values clamp to the epoch; non-numeric values are absent.
pub(crate) fn claim_timestamp(claims: &Map<String, Value>, name: &str) -> Option<Timestamp> {
    let secs = claims.get(name)?.as_f64().filter(|f| f.is_finite())?;
    // `as` saturates, so huge expiries read as the far future.
    Some(Timestamp::from_millis((secs * 1000.0).max(0.0) as u64))
}

/// Resolve the subject: `user_id` first, then `sub` if it parses as an integer.
pub(crate) fn subject_from_claims(claims: &Map<String, Value>) -> Option<UserId> {
    let primary = claims.get("user_id").and_then(positive_integer);
    primary.or_else(|| match claims.get("sub")? {
        Value::String(s) => s.parse::<u64>().ok().and_then(UserId::new),
        other => positive_integer(other),
    })
}

fn positive_integer(value: &Value) -> Option<UserId> {
    let raw = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && *f > 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })?;
    UserId::new(raw)
}
