//! TOML configuration.
//!
//! ```toml
//! role_claim = "role"
//! cache_window_secs = 30
//!
//! [[roles]]
//! name = "Estate"
//! permissions = [
//!     { section = "Merchant", function = "View" },
//!     { section = "Merchant", function = "Create" },
//! ]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{DEFAULT_CACHE_WINDOW_SECS, ROLE_CLAIM};
use crate::error::{RolegateError, Result};
use crate::permission::{Permission, Role};
use crate::store::InMemoryPermissionStore;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolegateConfig {
    /// Claim type holding the role name
    pub role_claim: String,
    /// Consistency window for `CachedPermissionStore`
    pub cache_window_secs: u64,
    /// Static role table for the in-memory store
    pub roles: Vec<RoleConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleConfig {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Default for RolegateConfig {
    fn default() -> Self {
        Self {
            role_claim: ROLE_CLAIM.to_string(),
            cache_window_secs: DEFAULT_CACHE_WINDOW_SECS,
            roles: Vec::new(),
        }
    }
}

impl RolegateConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), roles = config.roles.len(), "loaded permission config");
        Ok(config)
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_window_secs)
    }

    /// Validated roles from the static table.
    pub fn build_roles(&self) -> Result<Vec<Role>> {
        self.roles
            .iter()
            .map(|r| Role::new(r.name.clone(), r.permissions.iter().cloned()))
            .collect()
    }

    pub fn build_store(&self) -> Result<InMemoryPermissionStore> {
        Ok(InMemoryPermissionStore::from_roles(self.build_roles()?))
    }

    fn validate(&self) -> Result<()> {
        if self.role_claim.trim().is_empty() {
            return Err(RolegateError::Config("role_claim cannot be empty".into()));
        }
        let mut seen = HashSet::new();
        for role in &self.roles {
            if !seen.insert(role.name.as_str()) {
                return Err(RolegateError::Config(format!("duplicate role '{}'", role.name)));
            }
        }
        self.build_roles()?;
        Ok(())
    }
}
