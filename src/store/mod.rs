//! Credential store: username → password hash.
//!
//! The only concurrency guarantee the store owes its callers is that
//! [`UserStore::insert`] is insert-if-absent: two concurrent inserts for the
//! same username yield exactly one [`InsertOutcome::Created`].

mod memory;
mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use std::future::Future;
use thiserror::Error;

#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub password_hash: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password_hash", &"***")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    Conflict,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub trait UserStore: Send + Sync + 'static {
    /// Exact, case-sensitive lookup.
    fn find(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;

    /// Insert the record unless the username is already taken.
    fn insert(
        &self,
        record: UserRecord,
    ) -> impl Future<Output = Result<InsertOutcome, StoreError>> + Send;

    /// Cheap liveness check used by `/health`.
    fn ping(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store selected at startup: Postgres when a DSN is configured, memory otherwise.
#[derive(Clone, Debug)]
pub enum Store {
    Postgres(PgUserStore),
    Memory(MemoryUserStore),
}

impl Store {
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(MemoryUserStore::default())
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgresql",
            Self::Memory(_) => "memory",
        }
    }
}

impl UserStore for Store {
    async fn find(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        match self {
            Self::Postgres(store) => store.find(username).await,
            Self::Memory(store) => store.find(username).await,
        }
    }

    async fn insert(&self, record: UserRecord) -> Result<InsertOutcome, StoreError> {
        match self {
            Self::Postgres(store) => store.insert(record).await,
            Self::Memory(store) => store.insert(record).await,
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.ping().await,
            Self::Memory(store) => store.ping().await,
        }
    }
}
