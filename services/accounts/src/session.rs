//! Server-side sessions addressed by a cookie token
//!
//! A session exists in the store only while it is authenticated: logging in
//! writes the identity under a fresh token, logging out or deleting the
//! account removes it. A request whose cookie is missing, unknown or
//! expired is anonymous.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::cache::RedisPool;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::{
    config::ServerConfig,
    models::{Identity, SessionState},
};

/// Backend holding session identities by token
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the identity stored under `token`, if it has not expired
    async fn load(&self, token: &str) -> Result<Option<Identity>>;

    /// Store `identity` under `token` for `ttl_seconds`
    async fn save(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> Result<()>;

    /// Forget `token`
    async fn remove(&self, token: &str) -> Result<()>;

    /// Check that the backend is reachable
    async fn health_check(&self) -> Result<bool>;
}

/// Sessions kept in Redis as JSON with a server-side TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> Result<Option<Identity>> {
        let Some(raw) = self.redis_pool.get(&Self::key(token)).await? else {
            return Ok(None);
        };
        let identity = serde_json::from_str(&raw).context("corrupt session record")?;
        Ok(Some(identity))
    }

    async fn save(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> Result<()> {
        let raw = serde_json::to_string(identity)?;
        self.redis_pool
            .set_ex(&Self::key(token), &raw, ttl_seconds)
            .await
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.redis_pool.delete(&Self::key(token)).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        self.redis_pool.health_check().await
    }
}

/// Sessions kept in process memory, for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: Arc<Mutex<HashMap<String, (Identity, Instant)>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries.values().filter(|(_, expires)| *expires > now).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<Identity>> {
        let mut entries = self.entries.lock().await;
        match entries.get(token) {
            Some((identity, expires)) if *expires > Instant::now() => Ok(Some(identity.clone())),
            Some(_) => {
                entries.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, identity: &Identity, ttl_seconds: u64) -> Result<()> {
        let now = Instant::now();
        let expires = now
            .checked_add(Duration::from_secs(ttl_seconds))
            .with_context(|| format!("session TTL of {} seconds is out of range", ttl_seconds))?;

        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(token.to_string(), (identity.clone(), expires));
        Ok(())
    }

    async fn remove(&self, token: &str) -> Result<()> {
        self.entries.lock().await.remove(token);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Resolves, establishes and destroys the session carried by a request
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    ttl_seconds: u64,
    secure: bool,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn SessionStore>, config: &ServerConfig) -> Self {
        Self {
            store,
            cookie_name: config.session_cookie.clone(),
            ttl_seconds: config.session_ttl,
            secure: config.secure_cookies,
        }
    }

    /// Work out whether the request's cookie names a live session
    pub async fn resolve(&self, jar: &CookieJar) -> Result<SessionState> {
        let Some(cookie) = jar.get(&self.cookie_name) else {
            return Ok(SessionState::Anonymous);
        };

        let token = cookie.value();
        match self.store.load(token).await? {
            Some(identity) => Ok(SessionState::Authenticated {
                token: token.to_string(),
                identity,
            }),
            None => Ok(SessionState::Anonymous),
        }
    }

    /// Authenticate the client as `identity` under a newly issued token.
    ///
    /// Any token the client already presented is discarded first.
    pub async fn establish(&self, jar: CookieJar, identity: &Identity) -> Result<CookieJar> {
        if let Some(previous) = jar.get(&self.cookie_name) {
            self.store.remove(previous.value()).await?;
        }

        let token = Uuid::new_v4().simple().to_string();
        self.store.save(&token, identity, self.ttl_seconds).await?;
        info!("Created session for user: {}", identity.username);

        Ok(jar.add(self.cookie(token)))
    }

    /// Drop the session stored under `token` and expire the client's cookie
    pub async fn destroy(&self, jar: CookieJar, token: &str) -> Result<CookieJar> {
        self.store.remove(token).await?;
        Ok(self.expire(jar))
    }

    /// Expire the client's session cookie without touching the store
    pub fn expire(&self, jar: CookieJar) -> CookieJar {
        jar.remove(self.cookie(String::new()))
    }

    /// Check that the session backend is reachable
    pub async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }

    fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .build()
    }
}
