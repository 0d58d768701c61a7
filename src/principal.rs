//! Principal identity model and the identity provider seam.
//!
//! The permission service reads exactly one claim from a principal: the role
//! name. Everything else about the identity stays with the provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::constants::ROLE_CLAIM;
use crate::error::Result;

/// A single (type, value) claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Claim {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self { kind: kind.into(), value: value.into() }
    }

    pub fn role(value: impl Into<String>) -> Self {
        Self::new(ROLE_CLAIM, value)
    }
}

/// An authenticated or anonymous identity plus its claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    authenticated: bool,
    claims: Vec<Claim>,
}

impl Principal {
    /// An unauthenticated principal with no claims.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(claims: impl IntoIterator<Item = Claim>) -> Self {
        Self {
            authenticated: true,
            claims: claims.into_iter().collect(),
        }
    }

    /// Authenticated principal carrying a single role claim.
    pub fn with_role(role: impl Into<String>) -> Self {
        Self::authenticated([Claim::role(role)])
    }

    #[inline]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First non-empty value of the given claim type. Anonymous principals
    /// report no claims at all.
    pub fn claim(&self, kind: &str) -> Option<&str> {
        if !self.authenticated {
            return None;
        }
        self.claims
            .iter()
            .find(|c| c.kind == kind && !c.value.trim().is_empty())
            .map(|c| c.value.as_str())
    }

    /// The claimed role name, read from the `role` claim.
    #[inline]
    pub fn role_name(&self) -> Option<&str> {
        self.claim(ROLE_CLAIM)
    }
}

/// Supplies the current principal on demand.
///
/// Returning `Ok(Principal::anonymous())` means "nobody is signed in";
/// `Err` means the provider itself failed. The service treats both as deny.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_principal(&self) -> Result<Principal>;
}

#[async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for std::sync::Arc<T> {
    async fn current_principal(&self) -> Result<Principal> {
        (**self).current_principal().await
    }
}

/// In-process provider holding one swappable principal.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    principal: RwLock<Principal>,
}

impl StaticIdentityProvider {
    pub fn new(principal: Principal) -> Self {
        Self { principal: RwLock::new(principal) }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Replace the principal (sign in / sign out / role change).
    pub async fn set_principal(&self, principal: Principal) {
        *self.principal.write().await = principal;
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_principal(&self) -> Result<Principal> {
        Ok(self.principal.read().await.clone())
    }
}
