use crate::{
    api,
    auth::Authenticator,
    credentials::{CredentialManager, HashCost},
    store::{PgUserStore, Store},
    token::TokenService,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

pub struct Args {
    pub port: u16,
    pub dsn: Option<String>,
    pub secret: SecretString,
    pub token_ttl: Duration,
    pub hash_cost: HashCost,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &self.dsn.as_deref().map(redact_dsn))
            .field("secret", &"***")
            .field("token_ttl", &self.token_ttl)
            .field("hash_cost", &self.hash_cost)
            .finish()
    }
}

/// DSN with the password masked, for logs.
fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) => {
            if url.password().is_some() && url.set_password(Some("***")).is_err() {
                return "<unparseable dsn>".to_string();
            }
            url.to_string()
        }
        Err(_) => "<unparseable dsn>".to_string(),
    }
}

async fn open_store(dsn: Option<&str>) -> Result<Store> {
    match dsn {
        Some(dsn) => {
            let store = PgUserStore::connect(dsn)
                .await
                .with_context(|| format!("Failed to connect to database: {}", redact_dsn(dsn)))?;
            info!("Using postgres store: {}", redact_dsn(dsn));
            Ok(Store::Postgres(store))
        }
        None => {
            warn!("No DSN configured, users are kept in memory and lost on restart");
            Ok(Store::memory())
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is rejected, the store is unreachable, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let tokens = TokenService::new(&args.secret).context("Invalid token signing secret")?;

    let hash_cost = args.hash_cost;
    let credentials = tokio::task::spawn_blocking(move || CredentialManager::new(hash_cost))
        .await
        .context("Password hasher initialization panicked")?
        .context("Invalid password hashing parameters")?;

    let store = open_store(args.dsn.as_deref()).await?;

    let auth = Authenticator::new(store, credentials, tokens).with_token_ttl(args.token_ttl);

    api::new(args.port, Arc::new(auth)).await
}
