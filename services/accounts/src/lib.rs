//! Session-authenticated account service
//!
//! Users register, log in, view their profile, log out and delete their
//! account. Profile, logout and delete sit behind a session gate.

use std::sync::Arc;

use anyhow::Result;

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod views;

pub use routes::create_router;

use crate::{
    config::ServerConfig,
    repositories::CredentialStore,
    session::{SessionManager, SessionStore},
    views::Templates,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub sessions: SessionManager,
    pub templates: Templates,
}

impl AppState {
    /// Assemble the state from its backends
    pub fn new(
        users: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
        config: &ServerConfig,
    ) -> Result<Self> {
        Ok(Self {
            users,
            sessions: SessionManager::new(session_store, config),
            templates: Templates::new()?,
        })
    }
}
