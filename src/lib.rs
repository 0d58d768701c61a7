//! Rolegate - role-based permission evaluation
//!
//! Answers, for the current principal: may it perform (section, function),
//! may it enter a section, which permissions does it hold, and which role
//! does it claim. Decisions fail closed.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rolegate::{functions, sections, InMemoryPermissionStore, Permission, PermissionService,
//!     Principal, Role, StaticIdentityProvider};
//!
//! # async fn demo() -> rolegate::Result<()> {
//! let store = InMemoryPermissionStore::from_roles([Role::new(
//!     "Estate",
//!     [Permission::new(sections::MERCHANT, functions::VIEW)],
//! )?]);
//! let identity = StaticIdentityProvider::new(Principal::with_role("Estate"));
//! let service = PermissionService::new(Arc::new(identity), Arc::new(store));
//!
//! assert!(service.has_permission(&sections::MERCHANT, &functions::VIEW).await);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod caps;
pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod permission;
pub mod principal;
pub mod service;
pub mod store;

pub use cache::CachedPermissionStore;
pub use caps::{functions, sections, Function, Section};
pub use config::{RoleConfig, RolegateConfig};
pub use error::{RolegateError, Result};
pub use keys::PermissionKeyProvider;
pub use permission::{Permission, Role};
pub use principal::{Claim, IdentityProvider, Principal, StaticIdentityProvider};
pub use service::{Access, Denial, PermissionService};
pub use store::{InMemoryPermissionStore, PermissionStore};
