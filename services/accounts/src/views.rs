//! HTML pages rendered with minijinja

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

const TEMPLATES: [(&str, &str); 5] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("register.html", include_str!("../templates/register.html")),
    ("profile.html", include_str!("../templates/profile.html")),
];

/// A page to render and the values it shows
#[derive(Debug, Clone, Serialize)]
pub struct View {
    #[serde(skip)]
    template: &'static str,
    title: &'static str,
    error: Option<String>,
    username: Option<String>,
}

impl View {
    fn new(template: &'static str, title: &'static str) -> Self {
        Self {
            template,
            title,
            error: None,
            username: None,
        }
    }

    pub fn home() -> Self {
        Self::new("index.html", "Accounts")
    }

    pub fn login() -> Self {
        Self::new("login.html", "Login")
    }

    pub fn register() -> Self {
        Self::new("register.html", "Register")
    }

    pub fn profile(username: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            ..Self::new("profile.html", "Profile")
        }
    }

    /// Login form shown to clients without a session on a guarded page
    pub fn access_denied() -> Self {
        Self::new("login.html", "Access denied")
    }

    /// Show `message` above the page content
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

/// Compiled template set, cheap to clone
#[derive(Clone)]
pub struct Templates {
    env: Arc<Environment<'static>>,
}

impl Templates {
    /// Compile the embedded templates
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env: Arc::new(env) })
    }

    /// Render `view` to HTML
    pub fn render(&self, view: &View) -> Result<String> {
        let html = self.env.get_template(view.template)?.render(view)?;
        Ok(html)
    }

    /// Render `view` as a response with `status`, falling back to a bare 500
    pub fn page(&self, status: StatusCode, view: View) -> Response {
        match self.render(&view) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!("Failed to render {}: {:#}", view.template, e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}
