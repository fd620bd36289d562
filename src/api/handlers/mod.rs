pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod login;
pub use self::login::login;

pub mod protected;
pub use self::protected::protected;

pub mod types;

// common functions for the handlers
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    Json,
};
use regex::Regex;
use std::sync::OnceLock;
use types::MessageResponse;

pub(crate) const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub(crate) const SERVER_ERROR: &str = "Internal server error";

/// Usernames are 1 to 64 characters without whitespace or control characters.
pub fn valid_username(username: &str) -> bool {
    static USERNAME: OnceLock<Option<Regex>> = OnceLock::new();

    USERNAME
        .get_or_init(|| Regex::new(r"^[^\s\p{Cc}]{1,64}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(username))
}

pub fn valid_password(password: &str) -> bool {
    !password.is_empty()
}

pub(crate) fn message(status: StatusCode, message: &str) -> (StatusCode, Json<MessageResponse>) {
    (
        status,
        Json(MessageResponse {
            message: message.to_string(),
        }),
    )
}

/// Token from `Authorization: Bearer <token>`, if any.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
