//! Bearer-token gate for the `/lyrics` endpoint.
//!
//! Tokens are validated in two stages: a format check (alphanumeric, 8 to 16
//! characters) that runs in every mode, then either an equality check against
//! the configured fixed secret or an existence check against the external key
//! store. Malformed tokens never reach the store.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use regex::Regex;

use crate::error::Result;

fn token_format() -> &'static Regex {
    static TOKEN_FORMAT: OnceLock<Regex> = OnceLock::new();
    TOKEN_FORMAT.get_or_init(|| Regex::new(r"^[A-Za-z0-9]{8,16}$").unwrap())
}

/// Seam for the dynamic-token key store: anything that can answer whether a
/// key is present. Production uses redis; tests mock this.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn contains(&self, token: &str) -> Result<bool>;
}

#[async_trait]
impl TokenStore for ConnectionManager {
    async fn contains(&self, token: &str) -> Result<bool> {
        let mut conn = self.clone();
        let present: bool = conn.exists(token).await?;
        Ok(present)
    }
}

#[derive(Clone)]
enum TokenMode {
    /// Compare against a fixed secret configured at startup.
    Fixed(String),
    /// Existence check against the external key store.
    Dynamic(Arc<dyn TokenStore>),
}

#[derive(Clone)]
pub struct AccessGate {
    mode: TokenMode,
}

impl AccessGate {
    pub fn fixed(secret: impl Into<String>) -> Self {
        Self {
            mode: TokenMode::Fixed(secret.into()),
        }
    }

    /// The store handle is created once at startup and injected here; the
    /// gate never constructs its own client.
    pub fn dynamic(store: Arc<dyn TokenStore>) -> Self {
        Self {
            mode: TokenMode::Dynamic(store),
        }
    }

    /// Decide whether a request may proceed.
    ///
    /// `Ok(true)` is Allow, `Ok(false)` is Deny. A key-store failure is an
    /// error; the caller logs it and treats it as Deny.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<bool> {
        let Some(token) = extract_token(authorization) else {
            return Ok(false);
        };

        if !token_format().is_match(token) {
            tracing::debug!("Rejected token failing format check");
            return Ok(false);
        }

        match &self.mode {
            TokenMode::Fixed(secret) => Ok(token == secret),
            TokenMode::Dynamic(store) => store.contains(token).await,
        }
    }
}

/// Strip the `Bearer ` prefix and surrounding whitespace; empty tokens are
/// treated as absent.
fn extract_token(authorization: Option<&str>) -> Option<&str> {
    let raw = authorization?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() { None } else { Some(token) }
}
