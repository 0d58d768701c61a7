//! Shared fixtures: fake collaborators and the Estate role table.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use rolegate::{
    functions, sections, IdentityProvider, InMemoryPermissionStore, Permission, PermissionService,
    PermissionStore, Principal, Result, Role, RolegateError, StaticIdentityProvider,
};

/// Estate = {Merchant.View, Merchant.Create}, Viewer = {} (exists, grants nothing)
pub fn estate_roles() -> Vec<Role> {
    vec![
        Role::new(
            "Estate",
            [
                Permission::new(sections::MERCHANT, functions::VIEW),
                Permission::new(sections::MERCHANT, functions::CREATE),
            ],
        )
        .unwrap(),
        Role::empty("Viewer").unwrap(),
    ]
}

pub fn estate_store() -> InMemoryPermissionStore {
    InMemoryPermissionStore::from_roles(estate_roles())
}

pub fn service_for(principal: Principal) -> PermissionService {
    PermissionService::new(Arc::new(StaticIdentityProvider::new(principal)), Arc::new(estate_store()))
}

/// Store that counts lookups and delegates to an in-memory table.
#[derive(Default)]
pub struct CountingStore {
    pub inner: InMemoryPermissionStore,
    pub gets: AtomicUsize,
    pub lists: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryPermissionStore) -> Self {
        Self { inner, ..Self::default() }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionStore for CountingStore {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get_role(name).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_roles().await
    }
}

/// Store that is always unavailable.
pub struct FailingStore;

#[async_trait]
impl PermissionStore for FailingStore {
    async fn get_role(&self, _name: &str) -> Result<Option<Role>> {
        Err(RolegateError::Store("connection refused".into()))
    }
}

/// Identity provider that always fails.
pub struct FailingIdentity;

#[async_trait]
impl IdentityProvider for FailingIdentity {
    async fn current_principal(&self) -> Result<Principal> {
        Err(RolegateError::Identity("token endpoint unreachable".into()))
    }
}

/// Store that fails on the first `failures` lookups, then answers.
pub struct FlakyStore {
    pub inner: InMemoryPermissionStore,
    pub failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: InMemoryPermissionStore, failures: usize) -> Self {
        Self { inner, failures: AtomicUsize::new(failures) }
    }
}

#[async_trait]
impl PermissionStore for FlakyStore {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        let left = self.failures.load(Ordering::SeqCst);
        if left > 0 {
            self.failures.store(left - 1, Ordering::SeqCst);
            return Err(RolegateError::Store("timeout".into()));
        }
        self.inner.get_role(name).await
    }
}

/// Store that answers, then holds its first answer until released.
///
/// The answer is read before the hold, so it reflects the table as it was
/// when the fetch started.
pub struct GatedStore {
    pub inner: InMemoryPermissionStore,
    pub gets: AtomicUsize,
    pub entered: Notify,
    pub release: Notify,
    armed: AtomicBool,
}

impl GatedStore {
    pub fn new(inner: InMemoryPermissionStore) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
            armed: AtomicBool::new(true),
        }
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[async_trait]
impl PermissionStore for GatedStore {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let role = self.inner.get_role(name).await;
        self.hold().await;
        role
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = self.inner.list_roles().await;
        self.hold().await;
        roles
    }
}
