// canvas-core/src/keys.rs
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::TokenError;

/// A single HMAC signing key, identified by the `kid` carried in token
/// headers.
#[derive(Clone)]
pub struct KeyMaterial {
    id: String,
    secret: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

// Key material must never reach logs or response bodies, so Debug only
// exposes the id.
impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Immutable snapshot of the key set: at most one active key (used for new
/// signatures) plus retired keys that stay valid for verification until
/// explicitly revoked.
#[derive(Debug, Default)]
struct KeySet {
    active: Option<Arc<KeyMaterial>>,
    retired: HashMap<String, Arc<KeyMaterial>>,
}

/// Process-wide key store.
///
/// Rotation swaps in a freshly built immutable snapshot, so in-flight
/// verifications holding the previous `Arc` never observe a half-updated
/// set. Lookups take a short read lock to clone the current snapshot.
#[derive(Debug)]
pub struct KeyStore {
    inner: RwLock<Arc<KeySet>>,
}

impl KeyStore {
    /// Create a store with the given active signing key.
    pub fn new(active: KeyMaterial) -> Self {
        Self {
            inner: RwLock::new(Arc::new(KeySet {
                active: Some(Arc::new(active)),
                retired: HashMap::new(),
            })),
        }
    }

    /// Create a store with an active key plus already-retired keys, as loaded
    /// from configuration after a past rotation.
    pub fn from_parts(active: KeyMaterial, retired: Vec<KeyMaterial>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(KeySet {
                active: Some(Arc::new(active)),
                retired: retired
                    .into_iter()
                    .map(|k| (k.id().to_string(), Arc::new(k)))
                    .collect(),
            })),
        }
    }

    /// Create a store with no key material configured. Every signing attempt
    /// will fail with `ConfigurationError`; exists so startup validation has
    /// a single failure path rather than a default secret.
    pub fn unconfigured() -> Self {
        Self {
            inner: RwLock::new(Arc::new(KeySet::default())),
        }
    }

    fn snapshot(&self) -> Result<Arc<KeySet>, TokenError> {
        self.inner
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| TokenError::KeyStoreUnavailable)
    }

    /// The key used to sign new tokens. Fails with `ConfigurationError` if
    /// none has been configured; there is no default fallback.
    pub fn active_key(&self) -> Result<Arc<KeyMaterial>, TokenError> {
        self.snapshot()?
            .active
            .clone()
            .ok_or_else(|| TokenError::ConfigurationError("no active signing key".to_string()))
    }

    /// Look up a key valid for verification by the id embedded in a token
    /// header. Fully revoked keys resolve to `KeyNotFound`.
    pub fn verification_key(&self, key_id: &str) -> Result<Arc<KeyMaterial>, TokenError> {
        let set = self.snapshot()?;
        if let Some(active) = &set.active {
            if active.id() == key_id {
                return Ok(Arc::clone(active));
            }
        }
        set.retired
            .get(key_id)
            .cloned()
            .ok_or_else(|| TokenError::KeyNotFound(key_id.to_string()))
    }

    /// Make `new_key` the active signing key. The previous active key is
    /// retained in the retired set so not-yet-expired tokens keep verifying.
    pub fn rotate(&self, new_key: KeyMaterial) -> Result<(), TokenError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| TokenError::KeyStoreUnavailable)?;

        let mut retired = guard.retired.clone();
        if let Some(previous) = &guard.active {
            retired.insert(previous.id().to_string(), Arc::clone(previous));
        }

        tracing::info!(key_id = %new_key.id(), "rotated active signing key");
        *guard = Arc::new(KeySet {
            active: Some(Arc::new(new_key)),
            retired,
        });
        Ok(())
    }

    /// Drop a retired key from the verification set. Returns false if the id
    /// was not present. The active key cannot be revoked, only rotated away.
    pub fn revoke(&self, key_id: &str) -> Result<bool, TokenError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| TokenError::KeyStoreUnavailable)?;

        if !guard.retired.contains_key(key_id) {
            return Ok(false);
        }

        let mut retired = guard.retired.clone();
        retired.remove(key_id);
        tracing::info!(key_id = %key_id, "revoked verification key");
        *guard = Arc::new(KeySet {
            active: guard.active.clone(),
            retired,
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_store_has_no_active_key() {
        let store = KeyStore::unconfigured();
        assert_eq!(
            store.active_key().unwrap_err(),
            TokenError::ConfigurationError("no active signing key".to_string())
        );
    }

    #[test]
    fn rotation_keeps_previous_key_for_verification() {
        let store = KeyStore::new(KeyMaterial::new("k1", b"first secret".to_vec()));
        store
            .rotate(KeyMaterial::new("k2", b"second secret".to_vec()))
            .unwrap();

        assert_eq!(store.active_key().unwrap().id(), "k2");
        assert_eq!(store.verification_key("k1").unwrap().id(), "k1");
    }

    #[test]
    fn revoked_key_is_no_longer_found() {
        let store = KeyStore::new(KeyMaterial::new("k1", b"first secret".to_vec()));
        store
            .rotate(KeyMaterial::new("k2", b"second secret".to_vec()))
            .unwrap();

        assert!(store.revoke("k1").unwrap());
        assert_eq!(
            store.verification_key("k1").unwrap_err(),
            TokenError::KeyNotFound("k1".to_string())
        );
        // Revoking again is a no-op
        assert!(!store.revoke("k1").unwrap());
    }

    #[test]
    fn debug_output_redacts_secret() {
        let key = KeyMaterial::new("k1", b"super secret".to_vec());
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("k1"));
        assert!(!rendered.contains("super secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
