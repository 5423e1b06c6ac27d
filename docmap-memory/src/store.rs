//! In-memory storage implementation for document stores.
//!
//! This module provides a simple in-memory backend that keeps every
//! collection as an [`InMemoryCollection`] behind a shared read-write lock.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use docmap_core::{
    backend::{Collection, StoreBackend, StoreBackendBuilder},
    error::{DocumentStoreError, DocumentStoreResult},
};

use crate::collection::InMemoryCollection;

type CollectionMap = HashMap<String, Arc<InMemoryCollection>>;

/// Thread-safe in-memory collection store.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state.
/// Clones share the same collections. Each collection guards its own records,
/// so writers to different collections do not contend.
///
/// # Performance
///
/// Filters scan every record of a collection; there are no indexes.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let users = store.collection("users")?;
/// let id = users.store(doc! { "name": "Alice", "age": 30 })?;
/// assert_eq!(id, 0);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection name -> collection
    collections: Arc<RwLock<CollectionMap>>,
}

impl InMemoryStore {
    /// Creates a new store with no collections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore` with initial collections.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docmap_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder().with_collection("users").build()?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DocumentStoreError {
    DocumentStoreError::Backend("in-memory store lock is poisoned".to_string())
}

impl StoreBackend for InMemoryStore {
    fn collection(&self, name: &str) -> DocumentStoreResult<Arc<dyn Collection>> {
        let mut collections = self.collections.write().map_err(poisoned)?;
        let collection = collections
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(collection = name, "opened new collection");
                Arc::new(InMemoryCollection::new(name))
            })
            .clone();

        collection.create()?;
        Ok(collection)
    }

    fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        let collections = self.collections.read().map_err(poisoned)?;
        let mut names = collections
            .iter()
            .filter(|(_, collection)| matches!(collection.exists(), Ok(true)))
            .map(|(name, _)| name.clone())
            .collect::<Vec<_>>();

        names.sort();
        Ok(names)
    }

    fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let collections = self.collections.read().map_err(poisoned)?;
        match collections.get(name) {
            Some(collection) if collection.exists()? => {
                collection.remove()?;
                Ok(())
            }
            _ => Err(DocumentStoreError::CollectionNotFound(name.to_string())),
        }
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmap_memory::InMemoryStore;
/// use docmap::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder()
///     .with_collection("users")
///     .with_collection("orders")
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    collections: Vec<String>,
}

impl InMemoryStoreBuilder {
    /// Creates the named collection when the store is built.
    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.push(name.into());
        self
    }
}

impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    fn build(self) -> DocumentStoreResult<Self::Backend> {
        let store = InMemoryStore::new();
        for name in &self.collections {
            store.collection(name)?;
        }
        Ok(store)
    }
}
