//! Durable session store.
//!
//! DESIGN
//! ======
//! The store holds at most one `Session`, persisted as a single JSON blob
//! in durable client-side storage so it survives a full page reload.
//! Rehydration happens synchronously at construction, before any view
//! renders. `set` and `clear` are the only mutators; both are idempotent
//! and notify subscribers synchronously, after persisting, so the next
//! outgoing request always sees the id that is on disk.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::net::types::User;

/// localStorage key holding the persisted session JSON.
pub const STORAGE_KEY: &str = "authweb_session";

/// How the current session was established.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstablishedVia {
    Credentials,
    PersistentCookie,
}

/// Server-issued credential identifying an authenticated user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user: User,
    pub established_via: EstablishedVia,
    /// Milliseconds since the Unix epoch.
    pub created_at: f64,
}

/// Current time in epoch milliseconds; 0 outside the browser.
#[must_use]
pub fn now_ms() -> f64 {
    #[cfg(feature = "hydrate")]
    {
        js_sys::Date::now()
    }
    #[cfg(not(feature = "hydrate"))]
    {
        0.0
    }
}

/// Durable string storage behind the session store.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

impl<T: StorageBackend + ?Sized> StorageBackend for Rc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }

    fn remove(&self, key: &str) {
        (**self).remove(key);
    }
}

/// Browser localStorage backend.
#[cfg(feature = "hydrate")]
pub struct LocalStorage;

#[cfg(feature = "hydrate")]
impl StorageBackend for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        let window = web_sys::window()?;
        let storage = window.local_storage().ok()??;
        storage.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(window) = web_sys::window() {
            if let Ok(Some(storage)) = window.local_storage() {
                let _ = storage.set_item(key, value);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(window) = web_sys::window() {
            if let Ok(Some(storage)) = window.local_storage() {
                let _ = storage.remove_item(key);
            }
        }
    }
}

/// In-memory backend for tests and server-side rendering.
#[derive(Default)]
pub struct MemoryStorage {
    map: RefCell<HashMap<String, String>>,
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }
}

type Listener = Box<dyn Fn(Option<&Session>)>;

struct Inner {
    session: Option<Session>,
    backend: Box<dyn StorageBackend>,
}

/// Tab-wide holder of the current session. Cheap to clone; all clones
/// share the same state and subscriber list.
#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<RefCell<Inner>>,
    listeners: Rc<RefCell<Vec<Listener>>>,
}

impl SessionStore {
    /// Rehydrates synchronously from the backend.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        let session = backend
            .get(STORAGE_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok());
        Self {
            inner: Rc::new(RefCell::new(Inner { session, backend })),
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Store backed by browser localStorage.
    #[cfg(feature = "hydrate")]
    #[must_use]
    pub fn browser() -> Self {
        Self::new(Box::new(LocalStorage))
    }

    /// Store backed by in-memory storage.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    #[must_use]
    pub fn get(&self) -> Option<Session> {
        self.inner.borrow().session.clone()
    }

    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.inner
            .borrow()
            .session
            .as_ref()
            .map(|s| s.session_id.clone())
    }

    /// Adopt a session. Idempotent: re-setting an equal session neither
    /// rewrites storage nor re-notifies.
    pub fn set(&self, session: Session) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.session.as_ref() == Some(&session) {
                return;
            }
            // Persist before notifying: the next outgoing request must see
            // the same id that is in storage.
            if let Ok(raw) = serde_json::to_string(&session) {
                inner.backend.set(STORAGE_KEY, &raw);
            }
            inner.session = Some(session);
        }
        self.notify();
    }

    /// Drop the session. Idempotent: clearing an empty store is a no-op.
    pub fn clear(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.session.is_none() {
                return;
            }
            inner.backend.remove(STORAGE_KEY);
            inner.session = None;
        }
        self.notify();
    }

    /// Register a listener invoked synchronously on every transition.
    /// Listeners must not subscribe from within a callback.
    pub fn subscribe(&self, listener: impl Fn(Option<&Session>) + 'static) {
        self.listeners.borrow_mut().push(Box::new(listener));
    }

    /// Drop the session and all listeners. Test hook.
    pub fn reset(&self) {
        self.listeners.borrow_mut().clear();
        self.clear();
    }

    fn notify(&self) {
        let session = self.get();
        for listener in self.listeners.borrow().iter() {
            listener(session.as_ref());
        }
    }
}
