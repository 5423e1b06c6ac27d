//! A single in-memory collection.

use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock},
};

use bson::Document;
use chrono::{DateTime, Utc};
use tracing::debug;

use docmap_core::{
    backend::{Collection, Predicate, RecordId},
    error::{DocumentStoreError, DocumentStoreResult},
    schema::RESERVED_ID_KEY,
};

#[derive(Debug)]
struct State {
    records: BTreeMap<RecordId, Document>,
    next_id: RecordId,
    schema: Document,
    created_at: DateTime<Utc>,
}

impl State {
    fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 0,
            schema: Document::new(),
            created_at: Utc::now(),
        }
    }
}

/// A collection whose records live in a [`BTreeMap`] keyed by id.
///
/// Ids are allocated from a counter starting at 0 while the write lock is
/// held, so concurrent stores never receive the same id. Iteration follows id
/// order. A removed collection rejects every record operation with
/// [`DocumentStoreError::CollectionNotFound`] until it is created again.
#[derive(Debug)]
pub struct InMemoryCollection {
    name: String,
    state: RwLock<Option<State>>,
}

impl InMemoryCollection {
    /// Creates an empty, existing collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: RwLock::new(Some(State::new())) }
    }

    fn poisoned<T>(&self, _: PoisonError<T>) -> DocumentStoreError {
        DocumentStoreError::Backend(format!("collection {} lock is poisoned", self.name))
    }

    fn missing(&self) -> DocumentStoreError {
        DocumentStoreError::CollectionNotFound(self.name.clone())
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> DocumentStoreResult<T> {
        let state = self.state.read().map_err(|err| self.poisoned(err))?;
        state.as_ref().map(f).ok_or_else(|| self.missing())
    }

    fn write<T>(&self, f: impl FnOnce(&mut State) -> T) -> DocumentStoreResult<T> {
        let mut state = self.state.write().map_err(|err| self.poisoned(err))?;
        state.as_mut().map(f).ok_or_else(|| self.missing())
    }
}

impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> DocumentStoreResult<bool> {
        let mut state = self.state.write().map_err(|err| self.poisoned(err))?;
        if state.is_none() {
            *state = Some(State::new());
            debug!(collection = %self.name, "created collection");
        }
        Ok(true)
    }

    fn remove(&self) -> DocumentStoreResult<bool> {
        let mut state = self.state.write().map_err(|err| self.poisoned(err))?;
        if state.take().is_some() {
            debug!(collection = %self.name, "dropped collection");
        }
        Ok(true)
    }

    fn exists(&self) -> DocumentStoreResult<bool> {
        let state = self.state.read().map_err(|err| self.poisoned(err))?;
        Ok(state.is_some())
    }

    fn store(&self, mut record: Document) -> DocumentStoreResult<RecordId> {
        self.write(|state| {
            let id = state.next_id;
            state.next_id += 1;
            record.insert(RESERVED_ID_KEY, id);
            state.records.insert(id, record);
            id
        })
    }

    fn fetch(&self, id: RecordId) -> DocumentStoreResult<Option<Document>> {
        self.read(|state| state.records.get(&id).cloned())
    }

    fn update(&self, id: RecordId, mut record: Document) -> DocumentStoreResult<bool> {
        self.write(|state| match state.records.get_mut(&id) {
            Some(slot) => {
                record.insert(RESERVED_ID_KEY, id);
                *slot = record;
                true
            }
            None => false,
        })
    }

    fn delete(&self, id: RecordId) -> DocumentStoreResult<bool> {
        self.write(|state| state.records.remove(&id).is_some())
    }

    fn filter(&self, predicate: Predicate<'_>) -> DocumentStoreResult<Vec<Document>> {
        self.read(|state| {
            state
                .records
                .values()
                .filter(|record| predicate(*record))
                .cloned()
                .collect()
        })
    }

    fn all(&self) -> DocumentStoreResult<Vec<Document>> {
        self.read(|state| state.records.values().cloned().collect())
    }

    fn len(&self) -> DocumentStoreResult<usize> {
        self.read(|state| state.records.len())
    }

    fn set_schema(&self, schema: Document) -> DocumentStoreResult<bool> {
        self.write(|state| {
            state.schema = schema;
            true
        })
    }

    fn get_schema(&self) -> DocumentStoreResult<Document> {
        self.read(|state| state.schema.clone())
    }

    fn last_record_id(&self) -> DocumentStoreResult<RecordId> {
        self.read(|state| state.records.keys().next_back().copied())?
            .ok_or_else(|| DocumentStoreError::EmptyCollection(self.name.clone()))
    }

    fn creation_date(&self) -> DocumentStoreResult<Option<DateTime<Utc>>> {
        self.read(|state| Some(state.created_at))
    }
}
