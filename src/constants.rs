//! Claim names, key sizing and configuration defaults

// Claim type read from the principal when no override is configured
pub const ROLE_CLAIM: &str = "role";

// Separator in the `Section.Function` text form of a permission
pub const PERMISSION_SEPARATOR: char = '.';

// Random bytes per invalidation key (18 bytes = 24 base64url chars, no padding)
pub const KEY_ENTROPY_BYTES: usize = 18;

// Separator between the generation counter and the random part of a key
pub const KEY_SEPARATOR: char = '.';

// How long a cached role may be served before it is fetched again
pub const DEFAULT_CACHE_WINDOW_SECS: u64 = 30;

// Longest accepted role, section or function name
pub const MAX_NAME_LEN: usize = 255;
