use thiserror::Error;

/// Why a bearer token was rejected. Callers outside this crate only ever see
/// "unauthorized"; the kind is kept for logs and tests.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("invalid token ttl")]
    InvalidTtl,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
}
