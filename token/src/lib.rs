//! Access-token validation.
//!
//! Tokens are three base64url segments (`header.payload.signature`). With a
//! signing secret configured the HS256 signature is checked; without one the
//! validator runs in a reduced-trust decode-only mode that must be requested
//! explicitly and warns on every use. That mode reads only the payload.
//!
//! Validation order: shape, signature, expiry, subject.

pub mod claims;
pub mod error;
pub mod signing;
pub mod validator;

pub use claims::TokenPayload;
pub use error::TokenError;
pub use signing::sign_hs256;
pub use validator::{SigningSecret, TokenValidator, TrustLevel, ValidatedToken};
