//! Cached permission store with an explicit load/refresh lifecycle.
//!
//! Wraps any `PermissionStore` and is itself a `PermissionStore`, so it is
//! injected into the service instead of living inside it.
//!
//! Consistency window:
//! - an entry is served at most `window` after it was fetched
//! - an entry is never served once the permission key it was stamped with
//!   has been rotated, whoever rotated it
//!
//! "Never loaded" and "loaded but empty" are distinct states: `is_loaded()`
//! reports whether a bulk `load()` has completed under the current key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::keys::PermissionKeyProvider;
use crate::permission::Role;
use crate::store::PermissionStore;

#[derive(Debug, Clone)]
struct Entry {
    // None = store said the role does not exist
    role: Option<Role>,
    fetched_at: Instant,
}

impl Entry {
    fn is_fresh(&self, window: Duration) -> bool {
        self.fetched_at.elapsed() < window
    }
}

#[derive(Debug, Default)]
struct CacheState {
    // Key the entries were fetched under
    key: String,
    // Set by a completed bulk load under `key`
    loaded_at: Option<Instant>,
    // Bumped on every reset; fetches started under an older epoch are not cached
    epoch: u64,
    entries: HashMap<String, Entry>,
}

impl CacheState {
    fn reset(&mut self, key: String) {
        self.key = key;
        self.epoch = self.epoch.wrapping_add(1);
        self.loaded_at = None;
        self.entries.clear();
    }
}

enum Lookup {
    Hit(Option<Role>),
    // A fetch may only be cached if the state is still at this epoch
    Miss { epoch: u64 },
}

pub struct CachedPermissionStore<S> {
    inner: S,
    keys: Arc<PermissionKeyProvider>,
    window: Duration,
    state: RwLock<CacheState>,
}

impl<S: PermissionStore> CachedPermissionStore<S> {
    pub fn new(inner: S, keys: Arc<PermissionKeyProvider>, window: Duration) -> Self {
        let state = CacheState { key: keys.get_key(), ..CacheState::default() };
        Self { inner, keys, window, state: RwLock::new(state) }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn key_provider(&self) -> &Arc<PermissionKeyProvider> {
        &self.keys
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fetch every role from the backing store and replace the cache
    /// contents with them. Returns the number of roles fetched.
    ///
    /// A listing overtaken by `invalidate()`, `refresh()` or a key rotation
    /// is discarded and the cache stays unloaded.
    pub async fn load(&self) -> Result<usize> {
        let key = self.keys.get_key();
        let epoch = self.state.read().await.epoch;
        let roles = self.inner.list_roles().await?;
        let now = Instant::now();
        let count = roles.len();

        let mut state = self.state.write().await;
        if state.epoch != epoch || self.keys.get_key() != key {
            tracing::debug!(roles = count, "permission cache load overtaken, discarding");
            return Ok(count);
        }
        state.reset(key);
        state.loaded_at = Some(now);
        for role in roles {
            state.entries.insert(role.name().to_string(), Entry { role: Some(role), fetched_at: now });
        }
        tracing::info!(roles = count, generation = self.keys.generation(), "permission cache loaded");
        Ok(count)
    }

    /// Rotate the permission key and drop every entry. Anything else caching
    /// under the old key sees the rotation too.
    pub async fn refresh(&self) -> String {
        let mut state = self.state.write().await;
        let key = self.keys.refresh_key();
        state.reset(key.clone());
        tracing::info!(generation = self.keys.generation(), "permission cache refreshed");
        key
    }

    /// Drop every entry without rotating the key.
    pub async fn invalidate(&self) {
        let key = self.keys.get_key();
        self.state.write().await.reset(key);
    }

    /// True once `load()` has completed under the current key and within
    /// the consistency window.
    pub async fn is_loaded(&self) -> bool {
        let key = self.keys.get_key();
        let state = self.state.read().await;
        state.key == key && state.loaded_at.map(|t| t.elapsed() < self.window).unwrap_or(false)
    }

    /// Number of cached entries, including negative ones.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    async fn cached(&self, name: &str, key: &str) -> Lookup {
        let state = self.state.read().await;
        let hit = if state.key == key {
            state.entries.get(name).filter(|e| e.is_fresh(self.window)).map(|e| e.role.clone())
        } else {
            None
        };
        match hit {
            Some(role) => Lookup::Hit(role),
            None => Lookup::Miss { epoch: state.epoch },
        }
    }
}

#[async_trait]
impl<S: PermissionStore> PermissionStore for CachedPermissionStore<S> {
    async fn get_role(&self, name: &str) -> Result<Option<Role>> {
        let key = self.keys.get_key();
        let epoch = match self.cached(name, &key).await {
            Lookup::Hit(role) => {
                tracing::trace!(role = name, "permission cache hit");
                return Ok(role);
            }
            Lookup::Miss { epoch } => epoch,
        };

        // Errors pass through uncached
        let role = self.inner.get_role(name).await?;

        let mut state = self.state.write().await;
        if state.epoch != epoch || self.keys.get_key() != key {
            // Invalidated or rotated while fetching: answer, but don't cache
            return Ok(role);
        }
        if state.key != key {
            // Entries are stamped with a key rotated before this call began
            state.reset(key);
        }
        state.entries.insert(name.to_string(), Entry { role: role.clone(), fetched_at: Instant::now() });
        Ok(role)
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        self.inner.list_roles().await
    }
}
