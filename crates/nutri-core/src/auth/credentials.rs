use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;
use tokio::sync::watch;
use tracing::{debug, warn};

const SERVICE_NAME: &str = "nutri-client";

/// Keyring account (and storage key) holding the bearer token.
const TOKEN_KEY: &str = "nutri_token";

/// Persistent slot for the bearer token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Token slot that lives only as long as the process.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Token slot in the OS keychain.
pub struct KeyringTokenStore {
    entry: Entry,
}

impl KeyringTokenStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn remove(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// The API client's view of the credential: an in-memory copy of the
/// persisted token plus a presence signal for observers.
///
/// Storage failures are logged, never propagated: the in-memory copy is
/// authoritative for the running process.
pub(crate) struct CredentialSlot {
    token: Mutex<Option<String>>,
    store: Box<dyn TokenStore>,
    present: watch::Sender<bool>,
}

impl CredentialSlot {
    pub(crate) fn new(store: Box<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to load stored credential");
                None
            }
        };
        debug!(present = token.is_some(), "Credential slot initialised");
        let (present, _) = watch::channel(token.is_some());
        Self {
            token: Mutex::new(token),
            store,
            present,
        }
    }

    pub(crate) fn get(&self) -> Option<String> {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub(crate) fn is_present(&self) -> bool {
        self.token.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    pub(crate) fn set(&self, token: &str) {
        {
            let mut slot = self.token.lock().unwrap_or_else(|e| e.into_inner());
            *slot = Some(token.to_string());
            if let Err(e) = self.store.save(token) {
                warn!(error = %e, "Failed to persist credential");
            }
        }
        self.present.send_replace(true);
    }

    /// Drop the credential. Returns `true` only for the call that actually
    /// removed a present token; later calls are no-ops.
    pub(crate) fn clear(&self) -> bool {
        let had_token = {
            let mut slot = self.token.lock().unwrap_or_else(|e| e.into_inner());
            let had_token = slot.take().is_some();
            if let Err(e) = self.store.remove() {
                warn!(error = %e, "Failed to remove persisted credential");
            }
            had_token
        };
        if had_token {
            self.present.send_replace(false);
        }
        had_token
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<bool> {
        self.present.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_slot_loads_persisted_token() {
        let slot = CredentialSlot::new(Box::new(MemoryTokenStore::with_token("persisted")));
        assert_eq!(slot.get().as_deref(), Some("persisted"));
        assert!(*slot.subscribe().borrow());
    }

    #[test]
    fn test_slot_ignores_empty_persisted_token() {
        let slot = CredentialSlot::new(Box::new(MemoryTokenStore::with_token("")));
        assert!(!slot.is_present());
    }

    #[test]
    fn test_slot_clear_reports_first_clear_only() {
        let slot = CredentialSlot::new(Box::new(MemoryTokenStore::with_token("t")));
        let mut presence = slot.subscribe();
        assert!(slot.clear());
        assert!(!slot.clear());
        assert!(slot.get().is_none());
        assert!(presence.has_changed().unwrap());
        assert!(!*presence.borrow_and_update());
    }

    #[test]
    fn test_slot_set_publishes_presence() {
        let slot = CredentialSlot::new(Box::new(MemoryTokenStore::new()));
        let presence = slot.subscribe();
        assert!(!*presence.borrow());
        slot.set("fresh");
        assert!(*presence.borrow());
        assert_eq!(slot.get().as_deref(), Some("fresh"));
    }
}
