//! Permission evaluation for the current principal.
//!
//! Every call resolves the principal and queries the store afresh; the
//! service holds no cache of its own (inject a `CachedPermissionStore` for
//! that). Decisions fail closed:
//! - `check_*` / `try_*` return `Err` for collaborator failures and a
//!   `Denied` value for ordinary denials
//! - `has_*` / `user_*` map every error to deny / empty and log it

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::caps::{Function, Section};
use crate::constants::ROLE_CLAIM;
use crate::error::{RolegateError, Result};
use crate::permission::{Permission, Role};
use crate::principal::IdentityProvider;
use crate::store::PermissionStore;

/// Why access was not granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "role", rename_all = "snake_case")]
pub enum Denial {
    Unauthenticated,
    NoRoleClaim,
    /// The claimed role does not resolve in the store
    RoleNotFound(String),
    /// The role exists but lacks the permission
    NotGranted,
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::Unauthenticated => f.write_str("unauthenticated"),
            Denial::NoRoleClaim => f.write_str("no role claim"),
            Denial::RoleNotFound(role) => write!(f, "role '{}' not found", role),
            Denial::NotGranted => f.write_str("not granted"),
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "access", rename_all = "snake_case")]
pub enum Access {
    Granted,
    Denied(Denial),
}

impl Access {
    #[inline]
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Access::Granted => None,
            Access::Denied(d) => Some(d),
        }
    }
}

// Result of resolving principal -> role
enum Resolved {
    Role(Role),
    Denied(Denial),
}

pub struct PermissionService {
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn PermissionStore>,
    role_claim: String,
}

impl PermissionService {
    pub fn new(identity: Arc<dyn IdentityProvider>, store: Arc<dyn PermissionStore>) -> Self {
        Self { identity, store, role_claim: ROLE_CLAIM.to_string() }
    }

    /// Read the role from a different claim type.
    pub fn with_role_claim(mut self, kind: impl Into<String>) -> Self {
        self.role_claim = kind.into();
        self
    }

    pub fn role_claim(&self) -> &str {
        &self.role_claim
    }

    // ------------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------------

    async fn claimed_role(&self) -> Result<std::result::Result<String, Denial>> {
        let principal = self.identity.current_principal().await?;
        if !principal.is_authenticated() {
            return Ok(Err(Denial::Unauthenticated));
        }
        Ok(principal.claim(&self.role_claim).map(str::to_string).ok_or(Denial::NoRoleClaim))
    }

    async fn resolve(&self) -> Result<Resolved> {
        let name = match self.claimed_role().await? {
            Ok(name) => name,
            Err(denial) => return Ok(Resolved::Denied(denial)),
        };
        match self.store.get_role(&name).await? {
            Some(role) => Ok(Resolved::Role(role)),
            None => Ok(Resolved::Denied(Denial::RoleNotFound(name))),
        }
    }

    async fn evaluate<F>(&self, requested: &str, test: F) -> Result<Access>
    where
        F: FnOnce(&Role) -> bool,
    {
        let access = match self.resolve().await? {
            Resolved::Role(role) => {
                if test(&role) {
                    tracing::trace!(role = role.name(), requested, "access granted");
                    Access::Granted
                } else {
                    tracing::debug!(role = role.name(), requested, reason = %Denial::NotGranted, "access denied");
                    Access::Denied(Denial::NotGranted)
                }
            }
            Resolved::Denied(denial) => {
                tracing::debug!(requested, reason = %denial, "access denied");
                Access::Denied(denial)
            }
        };
        Ok(access)
    }

    // ------------------------------------------------------------------------
    // Decisions with reasons
    // ------------------------------------------------------------------------

    /// Check a (section, function) pair, surfacing collaborator failures.
    pub async fn check_permission(&self, section: &Section, function: &Function) -> Result<Access> {
        let requested = format!("{}.{}", section, function);
        self.evaluate(&requested, |role| role.has_permission(section, function)).await
    }

    /// Check access to any function in `section`.
    pub async fn check_section_access(&self, section: &Section) -> Result<Access> {
        self.evaluate(section.as_str(), |role| role.has_section_access(section)).await
    }

    /// Guard form: `Ok(())` if granted, `Forbidden` if denied, the
    /// collaborator error if one failed.
    pub async fn require_permission(&self, section: &Section, function: &Function) -> Result<()> {
        match self.check_permission(section, function).await? {
            Access::Granted => Ok(()),
            Access::Denied(reason) => Err(RolegateError::Forbidden {
                permission: Permission::new(section.clone(), function.clone()).to_string(),
                reason,
            }),
        }
    }

    /// Guard form of `check_section_access`.
    pub async fn require_section_access(&self, section: &Section) -> Result<()> {
        match self.check_section_access(section).await? {
            Access::Granted => Ok(()),
            Access::Denied(reason) => Err(RolegateError::Forbidden { permission: section.to_string(), reason }),
        }
    }

    // ------------------------------------------------------------------------
    // Fail-closed decisions
    // ------------------------------------------------------------------------

    pub async fn has_permission(&self, section: &Section, function: &Function) -> bool {
        fail_closed(self.check_permission(section, function).await, "has_permission")
    }

    pub async fn has_section_access(&self, section: &Section) -> bool {
        fail_closed(self.check_section_access(section).await, "has_section_access")
    }

    // ------------------------------------------------------------------------
    // Enumeration
    // ------------------------------------------------------------------------

    /// All permissions of the current role, in (section, function) order.
    /// Empty when unauthenticated, role-less or the role is unknown.
    pub async fn try_user_permissions(&self) -> Result<Vec<Permission>> {
        match self.resolve().await? {
            Resolved::Role(role) => Ok(role.into_permissions()),
            Resolved::Denied(denial) => {
                tracing::debug!(reason = %denial, "no permissions");
                Ok(Vec::new())
            }
        }
    }

    pub async fn user_permissions(&self) -> Vec<Permission> {
        self.try_user_permissions().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "permission listing failed, returning none");
            Vec::new()
        })
    }

    /// Functions granted in `section` (menu visibility).
    pub async fn section_functions(&self, section: &Section) -> Vec<Function> {
        match self.resolve().await {
            Ok(Resolved::Role(role)) => role.functions_in(section),
            Ok(Resolved::Denied(_)) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, section = %section, "section lookup failed, returning none");
                Vec::new()
            }
        }
    }

    /// The claimed role name, verbatim. Does not consult the store, so a
    /// claimed role may still be unknown to it.
    pub async fn try_user_role(&self) -> Result<Option<String>> {
        Ok(self.claimed_role().await?.ok())
    }

    pub async fn user_role(&self) -> Option<String> {
        self.try_user_role().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "role lookup failed");
            None
        })
    }
}

fn fail_closed(result: Result<Access>, op: &str) -> bool {
    match result {
        Ok(access) => access.is_granted(),
        Err(e) => {
            tracing::warn!(error = %e, op, "permission check failed, denying");
            false
        }
    }
}
