//! In-memory collection store for docmap.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreBackend` and `Collection` traits. It is intended for development,
//! testing, and small embedded deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Per-collection `std::sync::RwLock`
//! - **Ordered records** - Records iterate in id order
//! - **Atomic id allocation** - Ids are assigned under the collection's write lock
//!
//! # Quick Start
//!
//! ```ignore
//! use docmap::prelude::*;
//! use docmap::memory::InMemoryStore;
//!
//! let backend = InMemoryStore::builder().build()?;
//! let db = Database::new(backend);
//! let users = Model::<User>::define_with(MetaConfig::new().with_db(db))?;
//!
//! let mut alice = User { id: 0, name: "Alice".to_string(), age: 30 };
//! users.insert(&mut alice)?;
//! ```

pub mod collection;
pub mod store;

pub use collection::InMemoryCollection;
pub use store::{InMemoryStore, InMemoryStoreBuilder};
