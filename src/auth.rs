//! Register, login and access-check flows.
//!
//! Flow overview:
//! - register: store lookup → hash (blocking pool) → insert-if-absent.
//! - authenticate: store lookup → verify (blocking pool) → issue token.
//! - authorize: verify token → username.
//!
//! Unknown usernames and wrong passwords are indistinguishable to callers, and
//! so are the different reasons a token is rejected.

use crate::{
    credentials::{CredentialManager, HashError},
    store::{InsertOutcome, StoreError, UserRecord, UserStore},
    token::{TokenError, TokenService},
};
use std::time::Duration;
use thiserror::Error;
use tokio::task::{self, JoinError};
use tracing::{debug, instrument};

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("user already exists")]
    AlreadyExists,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("password hashing task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Error)]
pub enum AuthenticateError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("password verification task failed: {0}")]
    Task(#[from] JoinError),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unauthorized")]
pub struct Unauthorized;

/// The authentication core, wired to a store, a hasher and a token service.
#[derive(Debug)]
pub struct Authenticator<S> {
    store: S,
    credentials: CredentialManager,
    tokens: TokenService,
    token_ttl: Duration,
}

impl<S: UserStore> Authenticator<S> {
    #[must_use]
    pub fn new(store: S, credentials: CredentialManager, tokens: TokenService) -> Self {
        Self {
            store,
            credentials,
            tokens,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a user. The username is matched exactly (case-sensitive).
    ///
    /// # Errors
    /// [`RegisterError::AlreadyExists`] if the username is taken, including
    /// when a concurrent registration wins the insert.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<(), RegisterError> {
        // Skip the expensive hash for names that are obviously taken.
        if self.store.find(username).await?.is_some() {
            return Err(RegisterError::AlreadyExists);
        }

        let credentials = self.credentials.clone();
        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || credentials.hash(&password)).await??;

        let record = UserRecord {
            username: username.to_string(),
            password_hash,
        };

        match self.store.insert(record).await? {
            InsertOutcome::Created => {
                debug!("user registered");
                Ok(())
            }
            InsertOutcome::Conflict => {
                debug!("lost registration race");
                Err(RegisterError::AlreadyExists)
            }
        }
    }

    /// Check a username/password pair and issue a bearer token.
    ///
    /// # Errors
    /// [`AuthenticateError::InvalidCredentials`] for an unknown user or a wrong
    /// password alike.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<String, AuthenticateError> {
        let record = self.store.find(username).await?;

        let credentials = self.credentials.clone();
        let password = password.to_string();
        let valid = task::spawn_blocking(move || match record {
            Some(record) => credentials.verify(&password, &record.password_hash),
            None => credentials.verify_decoy(&password),
        })
        .await?;

        if !valid {
            debug!("invalid credentials");
            return Err(AuthenticateError::InvalidCredentials);
        }

        Ok(self.tokens.issue(username, self.token_ttl)?)
    }

    /// Resolve a bearer token to the username it was issued for.
    ///
    /// # Errors
    /// [`Unauthorized`] for any malformed, forged or expired token.
    pub fn authorize(&self, token: &str) -> Result<String, Unauthorized> {
        self.tokens
            .verify(token)
            .map(|claims| claims.username)
            .map_err(|e| {
                debug!(reason = %e, "token rejected");
                Unauthorized
            })
    }
}
