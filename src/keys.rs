//! Rotatable permission invalidation key.
//!
//! Callers that cache permission decisions remember the key they cached
//! under; when `get_key()` stops returning that value the cached decisions
//! are stale. The key is advisory: it says something changed, not what.
//!
//! Key format: `[generation: 16 hex digits].[24 base64url chars]`
//! - The generation counter makes every key issued by one provider distinct
//! - The random part makes keys from different providers/processes distinct
//!
//! The key is a cache-busting token, not a credential.

use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use crate::constants::{KEY_ENTROPY_BYTES, KEY_SEPARATOR};

struct KeyState {
    generation: u64,
    key: String,
}

/// Holds the current invalidation key for the life of the process.
///
/// `get_key` is an atomic read of the whole key; `refresh_key` does its
/// read-modify-write under one write guard, so concurrent refreshes are
/// serialized and none of them can be lost or reissued.
pub struct PermissionKeyProvider {
    state: RwLock<KeyState>,
}

impl PermissionKeyProvider {
    /// Create a provider with a freshly generated initial key.
    pub fn new() -> Self {
        let state = KeyState { generation: 0, key: String::new() };
        let provider = Self { state: RwLock::new(state) };
        {
            let mut state = provider.write_state();
            state.key = generate_key(0, &provider);
        }
        provider
    }

    /// The current key. Identical across calls until the next refresh.
    pub fn get_key(&self) -> String {
        self.read_state().key.clone()
    }

    /// Number of refreshes so far (0 for the initial key).
    pub fn generation(&self) -> u64 {
        self.read_state().generation
    }

    /// Replace the current key with a new one and return it.
    pub fn refresh_key(&self) -> String {
        let mut state = self.write_state();
        let generation = state.generation.wrapping_add(1);
        let key = generate_key(generation, self);
        state.generation = generation;
        state.key = key.clone();
        tracing::info!(generation, "permission key rotated");
        key
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, KeyState> {
        self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, KeyState> {
        self.state.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl std::fmt::Debug for PermissionKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionKeyProvider")
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl Default for PermissionKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_key(generation: u64, provider: &PermissionKeyProvider) -> String {
    let mut bytes = [0u8; KEY_ENTROPY_BYTES];
    if let Err(e) = getrandom::getrandom(&mut bytes) {
        tracing::warn!(error = %e, "OS randomness unavailable, deriving permission key from a digest");
        bytes = fallback_entropy(generation, provider);
    }
    format!("{:016x}{}{}", generation, KEY_SEPARATOR, base64url_encode(&bytes))
}

/// Digest of generation, wall clock and provider address.
fn fallback_entropy(generation: u64, provider: &PermissionKeyProvider) -> [u8; KEY_ENTROPY_BYTES] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut hasher = Sha256::new();
    hasher.update(generation.to_be_bytes());
    hasher.update(nanos.to_be_bytes());
    hasher.update((provider as *const PermissionKeyProvider as usize).to_be_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; KEY_ENTROPY_BYTES];
    out.copy_from_slice(&digest[..KEY_ENTROPY_BYTES]);
    out
}

/// Base64url encode without padding
fn base64url_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut result = String::with_capacity((data.len() * 4 + 2) / 3);
    for chunk in data.chunks(3) {
        let n = match chunk.len() {
            3 => ((chunk[0] as u32) << 16) | ((chunk[1] as u32) << 8) | (chunk[2] as u32),
            2 => ((chunk[0] as u32) << 16) | ((chunk[1] as u32) << 8),
            _ => (chunk[0] as u32) << 16,
        };
        result.push(ALPHABET[((n >> 18) & 0x3F) as usize] as char);
        result.push(ALPHABET[((n >> 12) & 0x3F) as usize] as char);
        if chunk.len() > 1 { result.push(ALPHABET[((n >> 6) & 0x3F) as usize] as char); }
        if chunk.len() > 2 { result.push(ALPHABET[(n & 0x3F) as usize] as char); }
    }
    result
}

// ============================================================================
// Tests
// ============================================================================
