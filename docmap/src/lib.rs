//! Main docmap crate: typed documents over embedded collection stores.
//!
//! This crate is the primary entry point for users of docmap. It re-exports
//! the core types from `docmap-core` and provides access to the bundled
//! storage backends.
//!
//! # Features
//!
//! - **Typed documents** - Declare records as serde types with queryable fields
//! - **Query expressions** - Build filters from field paths, nested ones included
//! - **Layered metadata** - Per-document database, collection name and alias settings
//! - **Pluggable stores** - Any `StoreBackend` implementation can hold the records
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::{prelude::*, memory::InMemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct UserInfo {
//!     pub money: f64,
//! }
//!
//! impl Schema for UserInfo {
//!     fn schema_name() -> &'static str { "UserInfo" }
//!     fn fields() -> Vec<FieldDef> { vec![FieldDef::new("money", FieldKind::Float)] }
//! }
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(default)]
//!     pub id: i64,
//!     pub name: String,
//!     pub age: i64,
//!     pub info: UserInfo,
//! }
//!
//! impl Schema for User {
//!     const PRIMARY_KEY: Option<&'static str> = Some("id");
//!     fn schema_name() -> &'static str { "User" }
//!     fn fields() -> Vec<FieldDef> {
//!         vec![
//!             FieldDef::new("name", FieldKind::String),
//!             FieldDef::new("age", FieldKind::Int),
//!             FieldDef::embedded::<UserInfo>("info"),
//!         ]
//!     }
//! }
//!
//! impl Document for User {
//!     fn id(&self) -> RecordId { self.id }
//!     fn set_id(&mut self, id: RecordId) { self.id = id; }
//!     fn meta() -> Option<MetaConfig> { Some(MetaConfig::new().with_name("user")) }
//! }
//!
//! fn main() -> DocumentStoreResult<()> {
//!     let db = Database::new(InMemoryStore::builder().build()?);
//!     let users = Model::<User>::define_with(MetaConfig::new().with_db(db))?;
//!
//!     let mut user = User { id: 0, name: "Ax".into(), age: 15, info: UserInfo { money: 200.0 } };
//!     users.insert(&mut user)?;
//!
//!     let mut other = User { id: 0, name: "Az".into(), age: 20, info: UserInfo { money: 50.0 } };
//!     users.prepare(&mut other);
//!     users.save(&mut other)?;
//!
//!     let rich = users.find_all(&[User::path("info.money")?.gt(100)])?;
//!     let ax = users.find_one(&[User::field("name")?.starts_with("Ax")])?;
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing

pub mod prelude;

pub use docmap_core::{backend, dict, document, error, eval, expression, field, meta, model, schema, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmap_memory::{InMemoryCollection, InMemoryStore, InMemoryStoreBuilder};
}
