//! Convenient re-exports of commonly used types from docmap.
//!
//! ```ignore
//! use docmap::prelude::*;
//! ```
//!
//! This provides access to:
//! - Schema and document traits
//! - Models, metadata and the database handle
//! - Expression construction
//! - Store backend traits and error types

pub use docmap_core::{
    backend::{Collection, RecordId, StoreBackend, StoreBackendBuilder},
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    expression::{Expression, Operand, Operator},
    field::FieldPath,
    meta::MetaConfig,
    model::Model,
    schema::{FieldDef, FieldKind, Schema, SchemaRef},
    store::Database,
};
