//! Durable token storage with change notification.
//!
//! The store has no in-memory mirror: every read goes to the backing
//! [`KeyValueStorage`], so independent call sites never observe a stale
//! pair. All writes go through [`TokenStore::set`], which is the single
//! place that raises [`TokensChanged`].

use std::fmt;
use std::sync::Arc;

use agenda_domain::{SessionState, TokenPair};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::ports::{KeyValueStorage, StorageError};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "gc.accessToken";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "gc.refreshToken";

/// Buffered notifications per subscriber before the oldest is dropped.
const EVENT_CAPACITY: usize = 16;

/// Raised whenever a write changes the stored pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokensChanged {
    /// The pair as stored after the write.
    pub tokens: TokenPair,
}

/// Shared handle to the persisted access/refresh token pair.
///
/// Cloning is cheap; clones share storage, subscribers and the write lock.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
    events: broadcast::Sender<TokensChanged>,
    write_lock: Arc<Mutex<()>>,
}

impl TokenStore {
    /// Creates a store backed by durable storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_storage(Some(storage))
    }

    /// Creates a store for contexts without durable storage.
    ///
    /// Reads always yield an empty pair and writes are ignored.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::with_storage(None)
    }

    fn with_storage(storage: Option<Arc<dyn KeyValueStorage>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            storage,
            events,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Returns true if a durable backend is attached.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Reads the current pair from storage.
    #[must_use]
    pub fn get(&self) -> TokenPair {
        self.storage
            .as_deref()
            .map_or_else(TokenPair::default, read_pair)
    }

    /// Returns the session state implied by the stored pair.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.get().state()
    }

    /// Updates the stored tokens.
    ///
    /// For each argument: `None` leaves the entry untouched, an empty string
    /// removes it, anything else overwrites it. Subscribers are notified
    /// only if the stored pair actually changed.
    ///
    /// Returns whether a notification was sent.
    ///
    /// # Errors
    ///
    /// Returns the first storage write error. Entries written before the
    /// failure stay written, and a change they caused is still notified.
    pub fn set(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<bool, StorageError> {
        let Some(storage) = self.storage.as_deref() else {
            return Ok(false);
        };

        let _guard = self.write_lock.lock();
        let before = read_pair(storage);

        let written = apply(storage, ACCESS_TOKEN_KEY, access_token)
            .and_then(|()| apply(storage, REFRESH_TOKEN_KEY, refresh_token));

        let after = read_pair(storage);
        let changed = before != after;
        if changed {
            debug!(state = ?after.state(), "session tokens changed");
            // No subscribers is fine.
            let _ = self.events.send(TokensChanged { tokens: after });
        }

        written.map(|()| changed)
    }

    /// Stores both tokens of `pair`, clearing absent ones.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn replace(&self, pair: &TokenPair) -> Result<bool, StorageError> {
        self.set(
            Some(pair.access_token.as_deref().unwrap_or_default()),
            Some(pair.refresh_token.as_deref().unwrap_or_default()),
        )
    }

    /// Removes both tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<bool, StorageError> {
        self.set(Some(""), Some(""))
    }

    /// Subscribes to change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TokensChanged> {
        self.events.subscribe()
    }
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("available", &self.is_available())
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

fn apply(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: Option<&str>,
) -> Result<(), StorageError> {
    match value {
        None => Ok(()),
        Some("") => storage.remove(key),
        Some(value) => storage.set(key, value),
    }
}

fn read_pair(storage: &dyn KeyValueStorage) -> TokenPair {
    TokenPair {
        access_token: read_key(storage, ACCESS_TOKEN_KEY),
        refresh_token: read_key(storage, REFRESH_TOKEN_KEY),
    }
}

fn read_key(storage: &dyn KeyValueStorage, key: &str) -> Option<String> {
    match storage.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(error) => {
            warn!(key, %error, "failed to read token from storage");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::MemoryStorage;
    use crate::test_support::FailingStorage;
    use pretty_assertions::assert_eq;
    use tokio::sync::broadcast::error::TryRecvError;

    fn store() -> TokenStore {
        TokenStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_set_and_get() {
        let store = store();
        store.set(Some("access"), Some("refresh")).unwrap();
        assert_eq!(store.get(), TokenPair::new("access", "refresh"));
        assert_eq!(store.state(), SessionState::Active);
    }

    #[test]
    fn test_partial_write_is_kept_and_notified() {
        let storage = FailingStorage::new();
        let store = TokenStore::new(storage.clone());
        store.set(Some("a1"), Some("r1")).unwrap();
        let mut events = store.subscribe();
        storage.fail_writes_to(REFRESH_TOKEN_KEY);

        let result = store.set(Some("a2"), Some("r2"));

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(store.get(), TokenPair::new("a2", "r1"));
        assert_eq!(events.try_recv().unwrap().tokens, TokenPair::new("a2", "r1"));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_failed_write_without_change_is_silent() {
        let storage = FailingStorage::new();
        let store = TokenStore::new(storage.clone());
        let mut events = store.subscribe();
        storage.fail_writes_to(ACCESS_TOKEN_KEY);

        assert!(store.set(Some("a1"), Some("r1")).is_err());
        assert_eq!(store.get(), TokenPair::default());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_identical_set_notifies_once() {
        let store = store();
        let mut events = store.subscribe();

        assert!(store.set(Some("a"), Some("r")).unwrap());
        assert!(!store.set(Some("a"), Some("r")).unwrap());

        assert_eq!(
            events.try_recv().unwrap(),
            TokensChanged {
                tokens: TokenPair::new("a", "r")
            }
        );
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_none_keeps_and_empty_removes() {
        let store = store();
        store.set(Some("a"), Some("r")).unwrap();

        store.set(Some("a2"), None).unwrap();
        assert_eq!(store.get(), TokenPair::new("a2", "r"));

        store.set(Some(""), None).unwrap();
        assert_eq!(store.get().access_token, None);
        assert_eq!(store.state(), SessionState::Degraded);

        store.clear().unwrap();
        assert!(store.get().is_empty());
    }

    #[test]
    fn test_clear_on_empty_store_is_silent() {
        let store = store();
        let mut events = store.subscribe();
        assert!(!store.clear().unwrap());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_unavailable_store() {
        let store = TokenStore::unavailable();
        let mut events = store.subscribe();

        assert!(!store.set(Some("a"), Some("r")).unwrap());
        assert!(store.get().is_empty());
        assert!(!store.is_available());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_clones_share_notifications() {
        let store = store();
        let clone = store.clone();
        let mut events = store.subscribe();

        clone.replace(&TokenPair::new("x", "y")).unwrap();
        assert_eq!(events.try_recv().unwrap().tokens, TokenPair::new("x", "y"));
        assert_eq!(store.get(), TokenPair::new("x", "y"));
    }
}
