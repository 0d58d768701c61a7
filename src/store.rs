//! Permission store: the authoritative role -> permission-set source.
//!
//! `get_role` distinguishes three outcomes:
//! - `Ok(Some(role))`: the role exists (possibly with zero permissions)
//! - `Ok(None)`: no such role
//! - `Err(_)`: the store could not answer
//!
//! Implementations must be safe to call concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{RolegateError, Result};
use crate::permission::Role;

#[async_trait]
pub trait PermissionStore: Send + Sync {
    async fn get_role(&self, name: &str) -> Result<Option<Role>>;

    /// Every role the store knows. Used for bulk cache loads; stores that
    /// cannot enumerate keep the default.
    async fn list_roles(&self) -> Result<Vec<Role>> {
        Err(RolegateError::Store("role listing not supported".into()))
    }
}

#[async_trait]
impl<S: PermissionStore + ?Sized> PermissionStore for Arc<S> {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        (**self).get_role(name).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        (**self).list_roles().await
    }
}

/// Static role table held in memory.
///
/// Reads run concurrently; `insert`/`remove` take the write lock.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    roles: RwLock<HashMap<String, Role>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from roles; a later role with the same name replaces an earlier one.
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let roles: HashMap<String, Role> = roles.into_iter().map(|r| (r.name().to_string(), r)).collect();
        Self { roles: RwLock::new(roles) }
    }

    /// Add or replace a role. Returns the previous definition.
    pub async fn insert(&self, role: Role) -> Option<Role> {
        self.roles.write().await.insert(role.name().to_string(), role)
    }

    pub async fn remove(&self, name: &str) -> Option<Role> {
        self.roles.write().await.remove(name)
    }

    pub async fn len(&self) -> usize {
        self.roles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.roles.read().await.is_empty()
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        Ok(self.roles.read().await.get(name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let mut roles: Vec<Role> = self.roles.read().await.values().cloned().collect();
        roles.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(roles)
    }
}
