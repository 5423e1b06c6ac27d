//! Database handle: the entry point that binds document types to collections.
//!
//! A [`Database`] wraps a [`StoreBackend`] and owns the registry of which
//! schema each collection is bound to. It is cheap to clone; clones share
//! the backend and the registry.
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use docmap::memory::InMemoryStore;
//!
//! let db = Database::new(InMemoryStore::new());
//! let users = Model::<User>::define_with(MetaConfig::new().with_db(db.clone()))?;
//! assert_eq!(db.bound_schema("users")?, Some("User"));
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::{debug, warn};

use crate::{
    backend::{Collection, StoreBackend},
    document::Document,
    error::{DocumentStoreError, DocumentStoreResult},
    model::Model,
};

type Bindings = HashMap<String, &'static str>;

/// A shared handle on a store backend and its collection bindings.
#[derive(Debug, Clone)]
pub struct Database {
    backend: Arc<dyn StoreBackend>,
    bindings: Arc<RwLock<Bindings>>,
}

impl Database {
    /// Creates a database over the given backend with no bound collections.
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    /// Creates a database over an already shared backend.
    pub fn from_shared(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend, bindings: Arc::new(RwLock::new(Bindings::new())) }
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    /// Opens the named collection, creating it when missing.
    pub fn collection(&self, name: &str) -> DocumentStoreResult<Arc<dyn Collection>> {
        self.backend.collection(name)
    }

    /// Lists all collections in the store.
    pub fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections()
    }

    /// Drops a collection and all of its records. Its binding is kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist.
    pub fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name)
    }

    /// Returns the schema bound to the named collection, if any.
    pub fn bound_schema(&self, name: &str) -> DocumentStoreResult<Option<&'static str>> {
        let bindings = self.bindings.read().map_err(poisoned)?;
        Ok(bindings.get(name).copied())
    }

    /// Binds a model to the collection named by its metadata.
    ///
    /// The collection is opened (and created when missing), receives an
    /// advisory description of the schema, and becomes the model's target for
    /// every subsequent operation. Registering the same schema under the same
    /// collection again is a no-op apart from rebinding the model.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::SchemaConflict`] when the collection is
    /// already bound to a different schema, or any error raised by the store
    /// while opening the collection.
    pub fn register<D: Document>(&self, model: &mut Model<D>) -> DocumentStoreResult<()> {
        let name = model.meta().name().to_string();
        let mut bindings = self.bindings.write().map_err(poisoned)?;

        if let Some(bound) = bindings.get(&name).copied() {
            if bound != D::schema_name() {
                warn!(collection = %name, bound, requested = D::schema_name(), "rejected schema rebinding");
                return Err(DocumentStoreError::SchemaConflict {
                    collection: name,
                    bound: bound.to_string(),
                    requested: D::schema_name().to_string(),
                });
            }
        }

        let collection = self.backend.collection(&name)?;
        collection.set_schema(model.schema().describe(model.meta().by_alias()))?;
        bindings.insert(name.clone(), D::schema_name());
        drop(bindings);

        model.bind(self.clone(), collection);
        debug!(collection = %name, schema = D::schema_name(), "bound document to collection");
        Ok(())
    }
}

fn poisoned<T>(_: PoisonError<T>) -> DocumentStoreError {
    DocumentStoreError::Backend("collection binding registry is poisoned".to_string())
}
