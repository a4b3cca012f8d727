use std::sync::{Arc, RwLock};

use super::credentials::Credentials;
use super::error::AuthError;
use super::store::CredentialStore;

/// Sole owner of persisted credentials.
///
/// Keeps an in-memory copy in front of a [`CredentialStore`]. Every write
/// (login, refresh, purge) goes through the vault; the session store and the
/// request layer only read from it. When the in-memory copy is absent,
/// reads fall back to the persisted store so a freshly constructed client
/// can authenticate before rehydration has been awaited.
pub struct CredentialVault {
    store: Arc<dyn CredentialStore>,
    cached: RwLock<Option<Credentials>>,
}

impl CredentialVault {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// Load persisted credentials into memory. Called once at client start.
    pub fn rehydrate(&self) -> Result<Option<Credentials>, AuthError> {
        let loaded = self.store.load()?;
        *self.write_cache() = loaded.clone();
        Ok(loaded)
    }

    pub fn credentials(&self) -> Result<Option<Credentials>, AuthError> {
        if let Some(cached) = self.read_cache() {
            return Ok(Some(cached));
        }
        let loaded = self.store.load()?;
        if let Some(creds) = &loaded {
            *self.write_cache() = Some(creds.clone());
        }
        Ok(loaded)
    }

    pub fn access_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self.credentials()?.map(|creds| creds.access_token))
    }

    pub fn refresh_token(&self) -> Result<Option<String>, AuthError> {
        Ok(self
            .credentials()?
            .filter(Credentials::has_refresh_token)
            .and_then(|creds| creds.refresh_token))
    }

    /// Whether an access token is available, treating storage errors as "no".
    pub fn has_access_token(&self) -> bool {
        matches!(self.access_token(), Ok(Some(_)))
    }

    /// Replace both tokens (login).
    pub fn store(&self, credentials: Credentials) -> Result<(), AuthError> {
        self.store.save(&credentials)?;
        *self.write_cache() = Some(credentials);
        Ok(())
    }

    /// Install a refreshed access token, keeping the current refresh token
    /// unless the server rotated it.
    pub fn rotate(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Credentials, AuthError> {
        let refresh_token = match refresh_token {
            Some(rotated) => Some(rotated),
            None => self.refresh_token()?,
        };
        let credentials = Credentials::new(access_token, refresh_token);
        self.store(credentials.clone())?;
        Ok(credentials)
    }

    /// Drop both tokens from memory and from persistent storage.
    pub fn purge(&self) -> Result<(), AuthError> {
        *self.write_cache() = None;
        self.store.clear()
    }

    fn read_cache(&self) -> Option<Credentials> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, Option<Credentials>> {
        self.cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::MemoryCredentialStore;

    fn seeded(refresh: Option<&str>) -> (Arc<MemoryCredentialStore>, CredentialVault) {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
            "access-1",
            refresh.map(str::to_string),
        )));
        let vault = CredentialVault::new(store.clone());
        (store, vault)
    }

    #[test]
    fn reads_fall_back_to_persisted_store_before_rehydration() {
        let (_store, vault) = seeded(Some("refresh-1"));
        assert_eq!(vault.access_token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(vault.refresh_token().unwrap().as_deref(), Some("refresh-1"));
    }

    #[test]
    fn rotate_keeps_refresh_token_unless_replaced() {
        let (store, vault) = seeded(Some("refresh-1"));
        vault.rehydrate().unwrap();

        vault.rotate("access-2".to_string(), None).unwrap();
        let persisted = store.snapshot().unwrap();
        assert_eq!(persisted.access_token, "access-2");
        assert_eq!(persisted.refresh_token.as_deref(), Some("refresh-1"));

        vault
            .rotate("access-3".to_string(), Some("refresh-2".to_string()))
            .unwrap();
        assert_eq!(
            store.snapshot().unwrap().refresh_token.as_deref(),
            Some("refresh-2")
        );
    }

    #[test]
    fn purge_clears_memory_and_storage() {
        let (store, vault) = seeded(None);
        vault.rehydrate().unwrap();
        vault.purge().unwrap();
        vault.purge().unwrap();

        assert!(store.snapshot().is_none());
        assert!(!vault.has_access_token());
        assert!(vault.refresh_token().unwrap().is_none());
    }
}
