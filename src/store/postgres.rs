use super::{InsertOutcome, StoreError, UserRecord, UserStore};
use sqlx::{postgres::PgPoolOptions, Connection, PgPool, Row};
use std::time::Duration;
use tracing::{info_span, Instrument};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Connect and make sure the `users` table exists.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the schema cannot be applied.
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await?;

        let store = Self::from_pool(pool);
        store.ensure_schema().await?;

        Ok(store)
    }

    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let span = info_span!("db.query", db.system = "postgresql", db.operation = "CREATE");
        sqlx::query(SCHEMA_SQL)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        Ok(())
    }
}

impl UserStore for PgUserStore {
    async fn find(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let query = "SELECT username, password_hash FROM users WHERE username = $1";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await?;

        Ok(row.map(|row| UserRecord {
            username: row.get("username"),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn insert(&self, record: UserRecord) -> Result<InsertOutcome, StoreError> {
        // The primary key makes this atomic; a concurrent duplicate affects no rows.
        let query = r"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (username) DO NOTHING
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(&record.username)
            .bind(&record.password_hash)
            .execute(&self.pool)
            .instrument(span)
            .await?;

        if result.rows_affected() == 0 {
            Ok(InsertOutcome::Conflict)
        } else {
            Ok(InsertOutcome::Created)
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self.pool.acquire().instrument(acquire_span).await?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping().instrument(ping_span).await?;

        Ok(())
    }
}
