//! API Key generation
//!
//! Keys are a fixed prefix followed by 32 random bytes encoded as
//! URL-safe base64 without padding.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Prefix carried by every issued key
pub const DEFAULT_KEY_PREFIX: &str = "key_";

/// Number of random bytes behind the prefix
const KEY_BYTES: usize = 32;

/// Characters of a key that may appear in logs
const VISIBLE: usize = 12;

/// Generator for secure API keys
#[derive(Debug, Clone)]
pub struct ApiKeyGenerator {
    prefix: String,
}

impl ApiKeyGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a new API key from the OS-seeded thread RNG
    pub fn generate(&self) -> String {
        let mut random_bytes = [0u8; KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(random_bytes))
    }
}

impl Default for ApiKeyGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Stable, non-reversible stand-in for a key in counter names
pub fn fingerprint_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Shorten a key for logs
pub fn redact_key(key: &str) -> String {
    match key.char_indices().nth(VISIBLE) {
        Some((idx, _)) => format!("{}...", &key[..idx]),
        None => key.to_string(),
    }
}

/// Shorten the part after the namespace of `apikey:{key}` style names
pub fn redact_namespaced(name: &str) -> String {
    match name.split_once(':') {
        Some((namespace, rest)) => format!("{}:{}", namespace, redact_key(rest)),
        None => redact_key(name),
    }
}
