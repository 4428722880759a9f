//! Session model and related functionality

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Who a session belongs to.
///
/// The user id and name are stored together or not at all, so a session
/// can never be half authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: i64,
    pub username: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            uid: user.id,
            username: user.name.clone(),
        }
    }
}

/// Authentication status of the session presented with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated { token: String, identity: Identity },
}

impl SessionState {
    /// The identity, if the session is authenticated
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated { identity, .. } => Some(identity),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}
