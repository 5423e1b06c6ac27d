//! Core traits for documents and their conversion to native records.
//!
//! A document is a [`Schema`] with an integer primary key that is stored as a
//! record in a collection. Embedded documents implement only [`Schema`] and
//! are stored inline in their parent's record.

use bson::{Bson, Document as Record, de::deserialize_from_bson, ser::serialize_to_bson};
use serde_json::{Value, from_value, to_value};

use crate::{
    backend::RecordId,
    error::{DocumentStoreError, DocumentStoreResult},
    meta::MetaConfig,
    schema::Schema,
};

/// A schema stored as a record of its own collection.
///
/// # Example
///
/// ```ignore
/// use docmap::prelude::*;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(default)]
///     pub id: i64,
///     pub name: String,
/// }
///
/// impl Schema for User {
///     const PRIMARY_KEY: Option<&'static str> = Some("id");
///     fn schema_name() -> &'static str { "User" }
///     fn fields() -> Vec<FieldDef> { vec![FieldDef::new("name", FieldKind::String)] }
/// }
///
/// impl Document for User {
///     fn id(&self) -> RecordId { self.id }
///     fn set_id(&mut self, id: RecordId) { self.id = id; }
///     fn meta() -> Option<MetaConfig> { Some(MetaConfig::new().with_name("users")) }
/// }
/// ```
pub trait Document: Schema {
    /// Returns the primary key of this instance.
    fn id(&self) -> RecordId;

    /// Overwrites the primary key of this instance.
    fn set_id(&mut self, id: RecordId);

    /// The document's own metadata layer.
    fn meta() -> Option<MetaConfig> {
        None
    }

    /// Metadata layers inherited from base documents, nearest first.
    fn bases() -> Vec<MetaConfig> {
        Vec::new()
    }
}

/// Conversion utilities between schema instances, plain mappings and JSON.
///
/// Automatically implemented for every [`Schema`]. Mappings use declared
/// attribute names; record-level concerns such as the reserved id key and
/// aliases are handled by [`Model`](crate::model::Model).
pub trait DocumentExt: Schema {
    /// Serializes this instance into a mapping of attribute names to values.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or does not produce a mapping.
    fn to_mapping(&self) -> DocumentStoreResult<Record>;

    /// Builds an instance from a mapping, validating it through serde.
    fn from_mapping(mapping: Record) -> DocumentStoreResult<Self>;

    fn to_json(&self) -> DocumentStoreResult<Value>;

    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<S: Schema> DocumentExt for S {
    fn to_mapping(&self) -> DocumentStoreResult<Record> {
        match serialize_to_bson(self)? {
            Bson::Document(mapping) => Ok(mapping),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "{} serialized to {:?}, expected a mapping",
                S::schema_name(),
                other.element_type()
            ))),
        }
    }

    fn from_mapping(mapping: Record) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(mapping))?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use serde_json::json;

    use super::*;
    use crate::schema::tests::{Account, Address, Profile};

    fn account() -> Account {
        Account {
            id: 3,
            name: "Ax".to_string(),
            age: 20,
            profile: Profile {
                money: 300.0,
                address: Address { city: "Oslo".to_string(), zip: "0150".to_string() },
            },
        }
    }

    #[test]
    fn test_to_mapping_uses_attribute_names() {
        let mapping = account().to_mapping().unwrap();
        assert_eq!(mapping.get_i64("id").unwrap(), 3);
        assert_eq!(mapping.get_document("profile").unwrap().get_f64("money").unwrap(), 300.0);
    }

    #[test]
    fn test_from_mapping_validates() {
        let result = Account::from_mapping(doc! { "name": "Ax", "age": "old" });
        assert!(matches!(result, Err(DocumentStoreError::Serialization(_))));
    }

    #[test]
    fn test_mapping_and_json_agree() {
        let original = account();
        let from_mapping = Account::from_mapping(original.to_mapping().unwrap()).unwrap();
        let from_json = Account::from_json(original.to_json().unwrap()).unwrap();
        assert_eq!(from_mapping, original);
        assert_eq!(from_json, original);
    }

    #[test]
    fn test_from_json_defaults_missing_id() {
        let account = Account::from_json(json!({
            "name": "By",
            "age": 12,
            "profile": { "money": 0.0, "address": { "city": "Rome", "zip": "00100" } }
        }))
        .unwrap();
        assert_eq!(account.id, 0);
    }
}
