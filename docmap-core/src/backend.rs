//! Storage backend abstraction for the mapping layer.
//!
//! The mapping layer never touches storage directly. It talks to two traits:
//!
//! - [`Collection`]: one homogeneous set of native records addressed by integer id
//! - [`StoreBackend`]: opens, lists and drops collections
//!
//! plus [`StoreBackendBuilder`], the factory used to configure a backend.
//!
//! All calls are synchronous and blocking. Implementations must be `Send +
//! Sync`; whether concurrent writers are serialized is up to the backend and
//! should be documented by it.
//!
//! # Examples
//!
//! ```ignore
//! use docmap::backend::StoreBackend;
//! use bson::doc;
//!
//! let users = backend.collection("users")?;
//! let id = users.store(doc! { "name": "Alice", "age": 30 })?;
//! assert_eq!(users.fetch(id)?.unwrap().get_str("name")?, "Alice");
//! ```

use std::{fmt::Debug, sync::Arc};

use bson::Document;
use chrono::{DateTime, Utc};

use crate::error::DocumentStoreResult;

/// Primary key of a stored record.
pub type RecordId = i64;

/// A record predicate, evaluated once per stored record during a scan.
pub type Predicate<'a> = &'a dyn Fn(&Document) -> bool;

/// A named collection of native records inside a store.
///
/// # Error Handling
///
/// Absent records are reported as `Ok(None)` or `Ok(false)`, never as errors.
/// Errors are reserved for store failures, and for [`Collection::last_record_id`]
/// on an empty collection.
pub trait Collection: Send + Sync + Debug {
    /// Returns the name of this collection.
    fn name(&self) -> &str;

    /// Creates the backing collection. Idempotent; returns `true` once it exists.
    fn create(&self) -> DocumentStoreResult<bool>;

    /// Drops the backing collection and every record in it. Idempotent.
    ///
    /// Named `remove` so calls through `Arc<dyn Collection>` do not resolve
    /// to `Drop::drop`.
    fn remove(&self) -> DocumentStoreResult<bool>;

    /// Returns whether the backing collection exists.
    fn exists(&self) -> DocumentStoreResult<bool>;

    /// Persists one record and returns the id the store assigned to it.
    fn store(&self, record: Document) -> DocumentStoreResult<RecordId>;

    /// Fetches one record by id, `None` when no such id exists.
    fn fetch(&self, id: RecordId) -> DocumentStoreResult<Option<Document>>;

    /// Overwrites the record stored under `id`. Returns `false` when there is none.
    fn update(&self, id: RecordId, record: Document) -> DocumentStoreResult<bool>;

    /// Removes the record stored under `id`. Returns `false` when there is none.
    fn delete(&self, id: RecordId) -> DocumentStoreResult<bool>;

    /// Returns every record for which `predicate` holds, in store iteration order.
    fn filter(&self, predicate: Predicate<'_>) -> DocumentStoreResult<Vec<Document>>;

    /// Returns every record, in store iteration order.
    fn all(&self) -> DocumentStoreResult<Vec<Document>>;

    /// Returns the number of stored records.
    fn len(&self) -> DocumentStoreResult<usize>;

    /// Returns whether the collection holds no records.
    fn is_empty(&self) -> DocumentStoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Stores advisory schema metadata. The store does not enforce it.
    fn set_schema(&self, schema: Document) -> DocumentStoreResult<bool>;

    /// Returns the advisory schema metadata, empty when none was set.
    fn get_schema(&self) -> DocumentStoreResult<Document>;

    /// Returns the highest assigned record id.
    ///
    /// # Errors
    ///
    /// Fails when the collection holds no records; callers treat that as
    /// "no records yet".
    fn last_record_id(&self) -> DocumentStoreResult<RecordId>;

    /// Returns when the collection was created, if the store tracks it.
    fn creation_date(&self) -> DocumentStoreResult<Option<DateTime<Utc>>>;
}

/// Abstract interface for collection-oriented stores.
pub trait StoreBackend: Send + Sync + Debug {
    /// Opens the named collection, creating it when it does not exist.
    fn collection(&self, name: &str) -> DocumentStoreResult<Arc<dyn Collection>>;

    /// Lists the names of all existing collections.
    fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Drops a collection and all its records.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// when no collection has that name.
    fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
}

/// Factory trait for configuring and creating backend instances.
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    fn build(self) -> DocumentStoreResult<Self::Backend>;
}
