use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};

use crate::error::StoreError;

/// Typed handle naming one slot of a [`ContextStore`].
///
/// Declaring keys as constants ties each slot name to the type stored
/// under it, so a producer and its consumers cannot disagree on the type.
pub struct ContextKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ContextKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ContextKey<T> {}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ContextKey").field(&self.name).finish()
    }
}

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Per-event scratchpad shared by decorators and writers.
///
/// Values are written once and read any number of times. Writing goes
/// through a shared reference so a decorator holding only the event's
/// context can publish into it.
pub struct ContextStore {
    name: String,
    entries: RwLock<HashMap<&'static str, Entry>>,
}

impl ContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the store for one event, named `EventStore#<event>`.
    #[must_use]
    pub fn for_event(event: usize) -> Self {
        Self::new(format!("EventStore#{event}"))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes a value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is already present.
    pub fn add<T: Any + Send + Sync>(&self, key: ContextKey<T>, value: T) -> Result<(), StoreError> {
        self.add_shared(key, Arc::new(value))
    }

    /// Publishes an already shared value under `key` without copying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is already present.
    pub fn add_shared<T: Any + Send + Sync>(&self, key: ContextKey<T>, value: Arc<T>) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned(self.name.clone()))?;
        if entries.contains_key(key.name()) {
            return Err(StoreError::DuplicateKey {
                store: self.name.clone(),
                key: key.name().to_owned(),
            });
        }
        entries.insert(
            key.name(),
            Entry {
                value,
                type_name: std::any::type_name::<T>(),
            },
        );
        Ok(())
    }

    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is absent or holds a different type.
    pub fn get<T: Any + Send + Sync>(&self, key: ContextKey<T>) -> Result<Arc<T>, StoreError> {
        self.find(key)?.ok_or_else(|| StoreError::MissingKey {
            store: self.name.clone(),
            key: key.name().to_owned(),
        })
    }

    /// Reads the value stored under `key`, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the key holds a different type.
    pub fn find<T: Any + Send + Sync>(&self, key: ContextKey<T>) -> Result<Option<Arc<T>>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned(self.name.clone()))?;
        let Some(entry) = entries.get(key.name()) else {
            return Ok(None);
        };
        Arc::clone(&entry.value)
            .downcast::<T>()
            .map(Some)
            .map_err(|_| StoreError::TypeMismatch {
                store: self.name.clone(),
                key: key.name().to_owned(),
                actual: entry.type_name,
                requested: std::any::type_name::<T>(),
            })
    }

    /// Returns the written key names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self
            .entries
            .read()
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }
}

impl fmt::Debug for ContextStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextStore")
            .field("name", &self.name)
            .field("keys", &self.keys())
            .finish()
    }
}
