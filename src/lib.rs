//! # Portier
//!
//! `portier` registers users with an Argon2id password hash, exchanges a valid
//! username/password pair for a signed, time-limited bearer token, and gates
//! protected resources on that token.
//!
//! ## Tokens
//!
//! Tokens are stateless HS256 JWTs carrying `username`, `iat` and `exp`. They
//! cannot be revoked: a token stays valid until it expires, even if the user
//! record goes away.
//!
//! ## Error disclosure
//!
//! A wrong password and an unknown username produce the same response, and so
//! do malformed, forged and expired tokens. Store failures are logged and
//! answered with a generic `500`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod credentials;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
