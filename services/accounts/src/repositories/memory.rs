//! In-process user repository for tests and local runs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::Mutex;

use super::CredentialStore;
use crate::models::{NewUser, User};

#[derive(Debug, Default)]
struct Table {
    next_id: i64,
    rows: HashMap<String, User>,
}

/// User repository holding rows in memory, keyed by name
#[derive(Debug, Clone, Default)]
pub struct MemoryUserRepository {
    table: Arc<Mutex<Table>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.table.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryUserRepository {
    async fn find_by_name(&self, name: &str) -> DatabaseResult<Option<User>> {
        Ok(self.table.lock().await.rows.get(name).cloned())
    }

    async fn insert(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut table = self.table.lock().await;
        if table.rows.contains_key(&new_user.name) {
            return Err(DatabaseError::Duplicate("users_name_key".to_string()));
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            name: new_user.name.clone(),
            password_hash: new_user.password_hash.clone(),
        };
        table.rows.insert(user.name.clone(), user.clone());

        Ok(user)
    }

    async fn delete(&self, id: i64, name: &str) -> DatabaseResult<u64> {
        let mut table = self.table.lock().await;
        match table.rows.get(name) {
            Some(user) if user.id == id => {
                table.rows.remove(name);
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        Ok(true)
    }
}
