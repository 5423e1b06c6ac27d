//! A document-mapping and query-expression layer over embedded collection stores.
//!
//! This crate is the core of the docmap project and provides:
//!
//! - **Schemas and documents** ([`schema`], [`document`]) - Traits for declaring typed documents and their fields
//! - **Field paths** ([`field`]) - Handles on declared attributes, nested ones included
//! - **Query expressions** ([`expression`]) - Expression trees built from field paths and evaluated against records
//! - **Models** ([`model`]) - Collection-level operations of a document type
//! - **Metadata** ([`meta`]) - Layered per-document configuration
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing collection stores
//! - **Database handle** ([`store`]) - Binds document types to collections
//! - **Evaluation** ([`eval`]) - Operator semantics over native values
//! - **Mapping helpers** ([`dict`]) - Dotted-path access and deep merge over records
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(default)]
//!     pub id: i64,
//!     pub name: String,
//!     pub age: i64,
//! }
//!
//! impl Schema for User {
//!     const PRIMARY_KEY: Option<&'static str> = Some("id");
//!     fn schema_name() -> &'static str { "User" }
//!     fn fields() -> Vec<FieldDef> {
//!         vec![FieldDef::new("name", FieldKind::String), FieldDef::new("age", FieldKind::Int)]
//!     }
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> RecordId { self.id }
//!     fn set_id(&mut self, id: RecordId) { self.id = id; }
//! }
//!
//! let users = Model::<User>::define_with(MetaConfig::new().with_db(db))?;
//! let adults = users.find_all(&[User::field("age")?.gte(18)])?;
//! ```

pub mod backend;
pub mod dict;
pub mod document;
pub mod error;
pub mod eval;
pub mod expression;
pub mod field;
pub mod meta;
pub mod model;
pub mod schema;
pub mod store;
