//! HS256 token minting, for tests and local tooling.

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::Value;

use crate::error::TokenError;

/// Encode `claims` as an HS256-signed compact token.
pub fn sign_hs256(claims: &Value, secret: &[u8]) -> Result<String, TokenError> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Malformed(format!("cannot sign claims: {e}")))
}
