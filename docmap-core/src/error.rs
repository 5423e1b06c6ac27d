//! Error types and result types for document mapping operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`].
//! A missing record is never an error: lookups return `Ok(None)` instead.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the mapping layer and by stores.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Conversion between typed documents and native records (BSON, JSON) failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The document or record has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The document type has no collection bound to it.
    #[error("Document {0} is not bound to a collection")]
    Unbound(String),
    /// An expression was built or merged from operands that cannot form one.
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),
    /// A field path names an attribute the schema does not declare.
    #[error("Unknown field {field} on schema {schema}")]
    UnknownField {
        /// The schema that was searched.
        schema: String,
        /// The attribute that was requested.
        field: String,
    },
    /// A collection is already bound to a different schema.
    #[error("Collection {collection} is bound to {bound}, cannot bind {requested}")]
    SchemaConflict {
        /// The collection name.
        collection: String,
        /// The schema currently bound to the collection.
        bound: String,
        /// The schema that attempted the binding.
        requested: String,
    },
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The collection holds no records, so it has no last record id.
    #[error("Collection {0} is empty")]
    EmptyCollection(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document mapping operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
