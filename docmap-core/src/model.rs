//! Typed access to the collection a document type is bound to.
//!
//! A [`Model<D>`] carries the resolved metadata and the bound collection of
//! document type `D`, and implements every class-level operation on it:
//! inserting and updating instances, lookups by id, expression queries, and
//! bulk import and export.
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//!
//! let users = Model::<User>::define_with(MetaConfig::new().with_db(db))?;
//!
//! let mut alice = User::new("Alice", 30);
//! users.prepare(&mut alice);
//! users.save(&mut alice)?;
//!
//! let adults = users.find_all(&[User::field("age")?.gte(18)])?;
//! let rich = users.find_one(&[User::path("info.money")?.gt(100)])?;
//! ```

use std::{borrow::Cow, fmt, marker::PhantomData, sync::Arc};

use bson::{Bson, Document as Record, ser::serialize_to_bson};
use serde_json::Value;
use tracing::debug;

use crate::{
    backend::{Collection, RecordId},
    dict,
    document::{Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    expression::{Expression, Operator},
    field::FieldPath,
    meta::{self, MetaConfig},
    schema::{FieldKind, RESERVED_ID_KEY, SchemaRef, resolve_path},
    store::Database,
};

/// The collection-level operations of document type `D`.
pub struct Model<D: Document> {
    meta: MetaConfig,
    schema: SchemaRef,
    collection: Option<Arc<dyn Collection>>,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document> Model<D> {
    /// Defines the model with the document's own metadata.
    ///
    /// See [`Model::define_with`].
    pub fn define() -> DocumentStoreResult<Self> {
        Self::define_with(MetaConfig::default())
    }

    /// Defines the model, resolving metadata with `overrides` on top.
    ///
    /// When the resolved metadata names a database the model is registered
    /// with it right away; otherwise it stays unbound until
    /// [`Database::register`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidDocument`] when `D` declares no
    /// primary key, and any error raised while registering.
    pub fn define_with(overrides: MetaConfig) -> DocumentStoreResult<Self> {
        if D::PRIMARY_KEY.is_none() {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "{} declares no primary key",
                D::schema_name()
            )));
        }

        let mut model = Self {
            meta: meta::resolve::<D>(overrides),
            schema: SchemaRef::of::<D>(),
            collection: None,
            _marker: PhantomData,
        };

        if let Some(db) = model.meta.db().cloned() {
            db.register(&mut model)?;
        }

        Ok(model)
    }

    pub(crate) fn bind(&mut self, db: Database, collection: Arc<dyn Collection>) {
        self.meta.set_db(db);
        self.collection = Some(collection);
    }

    pub fn meta(&self) -> &MetaConfig {
        &self.meta
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn is_bound(&self) -> bool {
        self.collection.is_some()
    }

    /// The bound collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::Unbound`] when the model has no collection.
    pub fn collection(&self) -> DocumentStoreResult<&Arc<dyn Collection>> {
        self.collection
            .as_ref()
            .ok_or_else(|| DocumentStoreError::Unbound(D::schema_name().to_string()))
    }

    /// Resolves a top-level attribute of `D` for use in expressions.
    pub fn field(&self, name: &str) -> DocumentStoreResult<FieldPath> {
        D::field(name)
    }

    /// Resolves a dotted attribute path of `D` for use in expressions.
    pub fn path(&self, dotted: &str) -> DocumentStoreResult<FieldPath> {
        D::path(dotted)
    }

    /// Stamps a hand-built instance with [`Model::generate_id`].
    ///
    /// Instances constructed outside [`Model::from_mapping`] carry whatever id
    /// they were built with, usually 0. Preparing them first keeps
    /// [`Model::save`] from treating them as the stored record with that id.
    pub fn prepare(&self, doc: &mut D) {
        doc.set_id(self.generate_id());
    }

    /// Stores `doc` as a new record and writes the assigned id back into it.
    pub fn insert(&self, doc: &mut D) -> DocumentStoreResult<()> {
        let collection = self.collection()?;
        let id = collection.store(self.to_record(doc)?)?;
        doc.set_id(id);

        debug!(collection = collection.name(), id, "inserted record");
        Ok(())
    }

    /// Applies assignments to `doc` and persists it under its id.
    ///
    /// `fields` assigns values at attribute paths of the instance, nested
    /// ones included. `overrides` replaces top-level attributes. The result
    /// is validated by rebuilding the instance before it is written.
    ///
    /// # Returns
    ///
    /// The store's success flag: `false` when no record has the id.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownField`] when an override names an
    /// attribute `D` does not declare.
    pub fn update<I>(&self, doc: &mut D, fields: I, overrides: Record) -> DocumentStoreResult<bool>
    where
        I: IntoIterator<Item = (FieldPath, Bson)>,
    {
        let mut mapping = doc.to_mapping()?;
        for (path, value) in fields {
            dict::set_path(&mut mapping, &path.attribute_path(), value)?;
        }
        for (key, value) in overrides {
            self.schema.resolve(&key)?;
            mapping.insert(key, value);
        }

        self.persist(doc, mapping)
    }

    /// Rebuilds `doc` from `mapping` and overwrites its stored record.
    fn persist(&self, doc: &mut D, mapping: Record) -> DocumentStoreResult<bool> {
        let collection = self.collection()?;
        let updated = D::from_mapping(mapping)?;
        let id = updated.id();
        let found = collection.update(id, self.to_record(&updated)?)?;
        *doc = updated;

        debug!(collection = collection.name(), id, found, "updated record");
        Ok(found)
    }

    /// Updates the stored record of `doc` when one exists, inserts it otherwise.
    pub fn save(&self, doc: &mut D) -> DocumentStoreResult<bool> {
        if self.collection()?.fetch(doc.id())?.is_some() {
            self.update(doc, Vec::new(), Record::new())
        } else {
            self.insert(doc).map(|_| true)
        }
    }

    /// Saves every document in turn. Returns whether all of them were stored.
    pub fn save_all(&self, docs: &mut [D]) -> DocumentStoreResult<bool> {
        let mut saved = !docs.is_empty();
        for doc in docs.iter_mut() {
            saved &= self.save(doc)?;
        }
        Ok(saved)
    }

    pub fn delete(&self, doc: &D) -> DocumentStoreResult<bool> {
        self.delete_by_id(doc.id())
    }

    /// Removes the record with the given id. Returns `false` when there is none.
    pub fn delete_by_id(&self, id: RecordId) -> DocumentStoreResult<bool> {
        let collection = self.collection()?;
        let found = collection.delete(id)?;

        debug!(collection = collection.name(), id, found, "deleted record");
        Ok(found)
    }

    pub fn get_by_id(&self, id: RecordId) -> DocumentStoreResult<Option<D>> {
        self.collection()?
            .fetch(id)?
            .map(|record| self.from_record(record))
            .transpose()
    }

    /// Every stored instance, in store order.
    pub fn all(&self) -> DocumentStoreResult<Vec<D>> {
        self.collection()?
            .all()?
            .into_iter()
            .map(|record| self.from_record(record))
            .collect()
    }

    pub fn count(&self) -> DocumentStoreResult<usize> {
        self.collection()?.len()
    }

    /// Drops every record, recreating the empty collection when `recreate` is set.
    pub fn clear(&self, recreate: bool) -> DocumentStoreResult<()> {
        let collection = self.collection()?;
        collection.remove()?;
        if recreate {
            collection.create()?;
        }

        debug!(collection = collection.name(), recreate, "cleared collection");
        Ok(())
    }

    /// Instances matching every filter.
    ///
    /// Filters are combined with a logical AND; no filters returns
    /// [`Model::all`].
    pub fn find_all(&self, filters: &[Expression]) -> DocumentStoreResult<Vec<D>> {
        if filters.is_empty() {
            return self.all();
        }

        let collection = self.collection()?;
        let expression = Expression::merge(filters.iter().cloned(), Operator::And)?;
        let records = collection.filter(&|record: &Record| expression.matches(&self.plain_record(record)))?;

        debug!(collection = collection.name(), filter = %expression, matches = records.len(), "filtered records");
        records.into_iter().map(|record| self.from_record(record)).collect()
    }

    /// The first instance matching every filter.
    ///
    /// With no filters this is the record with id 0.
    pub fn find_one(&self, filters: &[Expression]) -> DocumentStoreResult<Option<D>> {
        if filters.is_empty() {
            return self.get_by_id(0);
        }
        Ok(self.find_all(filters)?.into_iter().next())
    }

    /// Returns the first match, or inserts a new instance built from the
    /// filters' equalities merged with `defaults`.
    ///
    /// `defaults` may use dotted keys such as `"info.money"`.
    pub fn get_or_create(&self, filters: &[Expression], defaults: Record) -> DocumentStoreResult<D> {
        self.check_defaults(&defaults)?;
        if let Some(found) = self.find_one(filters)? {
            return Ok(found);
        }
        self.create(filters, &defaults)
    }

    /// Updates the first match with `defaults`, or inserts a new instance
    /// built from the filters' equalities merged with `defaults`.
    pub fn update_or_create(&self, filters: &[Expression], defaults: Record) -> DocumentStoreResult<D> {
        self.check_defaults(&defaults)?;
        let Some(mut found) = self.find_one(filters)? else {
            return self.create(filters, &defaults);
        };

        let mapping = dict::merge(&found.to_mapping()?, &dict::expand_all(&defaults));
        self.persist(&mut found, mapping)?;
        Ok(found)
    }

    /// Every default key, dotted or not, must name a declared attribute.
    fn check_defaults(&self, defaults: &Record) -> DocumentStoreResult<()> {
        defaults.keys().try_for_each(|key| {
            resolve_path(&self.schema, &key.split('.').collect::<Vec<_>>()).map(|_| ())
        })
    }

    fn create(&self, filters: &[Expression], defaults: &Record) -> DocumentStoreResult<D> {
        let seeded = if filters.is_empty() {
            Record::new()
        } else {
            Expression::merge(filters.iter().cloned(), Operator::And)?.to_mapping()
        };

        let mut created = self.from_mapping(dict::merge(&seeded, &dict::expand_all(defaults)))?;
        self.insert(&mut created)?;
        Ok(created)
    }

    /// Every stored instance as JSON, keyed by alias when the model stores by alias.
    pub fn export_all(&self) -> DocumentStoreResult<Vec<Value>> {
        self.all()?
            .iter()
            .map(|doc| {
                let mapping = doc.to_mapping()?;
                let mapping = if self.meta.by_alias() {
                    rename_keys(&self.schema, mapping, true)
                } else {
                    mapping
                };
                Ok(serde_json::to_value(&mapping)?)
            })
            .collect()
    }

    /// Saves every JSON object as an instance, in the shape produced by
    /// [`Model::export_all`].
    pub fn bulk_save_from_json(&self, values: Vec<Value>) -> DocumentStoreResult<Vec<D>> {
        values
            .into_iter()
            .map(|value| {
                let Bson::Document(mapping) = serialize_to_bson(&value)? else {
                    return Err(DocumentStoreError::InvalidDocument(format!(
                        "expected a JSON object for {}",
                        D::schema_name()
                    )));
                };
                let mapping = if self.meta.by_alias() {
                    rename_keys(&self.schema, mapping, false)
                } else {
                    mapping
                };

                let mut doc = self.from_mapping(mapping)?;
                self.save(&mut doc)?;
                Ok(doc)
            })
            .collect()
    }

    /// Builds an instance from a mapping of attribute names.
    ///
    /// When the primary key is absent it is filled with [`Model::generate_id`].
    pub fn from_mapping(&self, mut mapping: Record) -> DocumentStoreResult<D> {
        let primary_key = self.primary_key();
        if !mapping.contains_key(primary_key) {
            mapping.insert(primary_key, self.generate_id());
        }
        D::from_mapping(mapping)
    }

    /// The highest id stored in the collection.
    ///
    /// # Errors
    ///
    /// Fails when the model is unbound or the collection is empty.
    pub fn last_id(&self) -> DocumentStoreResult<RecordId> {
        self.collection()?.last_record_id()
    }

    /// A best-effort next id: one past [`Model::last_id`], or 0 when that fails.
    ///
    /// The store assigns the real id on insert; this value only fills
    /// instances built before they are stored.
    pub fn generate_id(&self) -> RecordId {
        self.last_id().map_or(0, |id| id + 1)
    }

    /// Translates an instance into the native record stored in the collection.
    pub fn to_record(&self, doc: &D) -> DocumentStoreResult<Record> {
        let mut record = doc.to_mapping()?;
        if let Some(id) = record.remove(self.primary_key()) {
            record.insert(RESERVED_ID_KEY, id);
        }

        Ok(if self.meta.by_alias() {
            rename_keys(&self.schema, record, true)
        } else {
            record
        })
    }

    /// Rebuilds an instance from a native record.
    pub fn from_record(&self, record: Record) -> DocumentStoreResult<D> {
        let mut mapping = self.plain_record(&record).into_owned();
        if let Some(id) = mapping.remove(RESERVED_ID_KEY) {
            mapping.insert(self.primary_key(), id);
        }
        D::from_mapping(mapping)
    }

    /// The record with declared attribute names in place of aliases.
    fn plain_record<'a>(&self, record: &'a Record) -> Cow<'a, Record> {
        if self.meta.by_alias() {
            Cow::Owned(rename_keys(&self.schema, record.clone(), false))
        } else {
            Cow::Borrowed(record)
        }
    }

    fn primary_key(&self) -> &'static str {
        self.schema.primary_key().unwrap_or(RESERVED_ID_KEY)
    }
}

impl<D: Document> fmt::Debug for Model<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("schema", &self.schema.name())
            .field("meta", &self.meta)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Renames declared attributes to their aliases, or back, through embedded schemas.
///
/// Keys the schema does not declare are kept as they are.
fn rename_keys(schema: &SchemaRef, record: Record, to_alias: bool) -> Record {
    let fields = schema.fields();

    record
        .into_iter()
        .map(|(key, value)| {
            let Some(field) = fields.iter().find(|field| {
                let source = if to_alias { field.name() } else { field.record_key(true) };
                !field.is_primary_key() && source == key
            }) else {
                return (key, value);
            };

            let value = match (field.kind(), value) {
                (FieldKind::Embedded(nested), Bson::Document(inner)) => {
                    Bson::Document(rename_keys(nested, inner, to_alias))
                }
                (_, value) => value,
            };
            let target = if to_alias { field.record_key(true) } else { field.name() };
            (target.to_string(), value)
        })
        .collect()
}
