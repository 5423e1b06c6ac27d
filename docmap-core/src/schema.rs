//! Schema declarations for documents and embedded documents.
//!
//! A schema is a serde type that lists its fields through the [`Schema`]
//! trait. The field list is what query expressions are resolved against: a
//! dotted attribute path is turned into a [`FieldPath`] by walking the field
//! declarations, descending into embedded schemas as it goes.
//!
//! # Example
//!
//! ```ignore
//! use docmap::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct UserInfo {
//!     pub money: f64,
//! }
//!
//! impl Schema for UserInfo {
//!     fn schema_name() -> &'static str { "UserInfo" }
//!     fn fields() -> Vec<FieldDef> {
//!         vec![FieldDef::new("money", FieldKind::Float)]
//!     }
//! }
//!
//! let money = UserInfo::field("money")?;
//! ```

use std::hash::{Hash, Hasher};

use bson::{Document, doc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    field::FieldPath,
};

/// The record key under which a document's primary key is stored.
pub const RESERVED_ID_KEY: &str = "__id";

/// The kind of value a declared field holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    DateTime,
    Array,
    Map,
    Any,
    /// A nested schema; attribute access descends into its fields.
    Embedded(SchemaRef),
}

impl FieldKind {
    fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Bool => "boolean",
            FieldKind::Int => "integer",
            FieldKind::Float => "number",
            FieldKind::String => "string",
            FieldKind::DateTime => "datetime",
            FieldKind::Array => "array",
            FieldKind::Map | FieldKind::Embedded(_) => "object",
            FieldKind::Any => "any",
        }
    }
}

/// A single declared attribute of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDef {
    name: &'static str,
    kind: FieldKind,
    alias: Option<&'static str>,
    primary_key: bool,
}

impl FieldDef {
    /// Declares a field with the given attribute name and kind.
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, alias: None, primary_key: false }
    }

    /// Declares a field holding the embedded schema `S`.
    pub fn embedded<S: Schema>(name: &'static str) -> Self {
        Self::new(name, FieldKind::Embedded(SchemaRef::of::<S>()))
    }

    /// Declares the primary-key attribute of a document.
    pub fn primary_key(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Int, alias: None, primary_key: true }
    }

    /// Sets the name this field is stored under when a model stores by alias.
    pub fn with_alias(mut self, alias: &'static str) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn alias(&self) -> Option<&'static str> {
        self.alias
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// The key this field takes in a native record.
    ///
    /// The primary key always maps to [`RESERVED_ID_KEY`]; other fields use
    /// their alias when `by_alias` is set and one is declared.
    pub fn record_key(&self, by_alias: bool) -> &'static str {
        if self.primary_key {
            RESERVED_ID_KEY
        } else if by_alias {
            self.alias.unwrap_or(self.name)
        } else {
            self.name
        }
    }
}

/// A handle on a schema type, usable without naming the type parameter.
///
/// Equality and hashing go by schema name.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRef {
    name: &'static str,
    fields: fn() -> Vec<FieldDef>,
    primary_key: Option<&'static str>,
}

impl SchemaRef {
    /// Returns the handle for schema `S`.
    pub fn of<S: Schema>() -> Self {
        Self { name: S::schema_name(), fields: S::fields, primary_key: S::PRIMARY_KEY }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn primary_key(&self) -> Option<&'static str> {
        self.primary_key
    }

    /// All fields of the schema, including the primary key of a document.
    pub fn fields(&self) -> Vec<FieldDef> {
        let mut fields = (self.fields)();
        if let Some(primary_key) = self.primary_key {
            if !fields.iter().any(|field| field.name == primary_key) {
                fields.push(FieldDef::primary_key(primary_key));
            }
        }
        fields
    }

    /// Looks up a declared field by attribute name.
    pub fn field_def(&self, name: &str) -> Option<FieldDef> {
        self.primary_key
            .filter(|primary_key| *primary_key == name)
            .map(FieldDef::primary_key)
            .or_else(|| {
                (self.fields)()
                    .into_iter()
                    .find(|field| field.name == name)
            })
    }

    /// Resolves a top-level attribute to a field path with no ancestors.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownField`] when the attribute is not declared.
    pub fn resolve(&self, name: &str) -> DocumentStoreResult<FieldPath> {
        self.field_def(name)
            .map(|field| FieldPath::new(field, self.name))
            .ok_or_else(|| DocumentStoreError::UnknownField {
                schema: self.name.to_string(),
                field: name.to_string(),
            })
    }

    /// Describes the schema as an advisory document for the store.
    ///
    /// An embedded schema already being described further up the chain is
    /// written as `{"$ref": <name>}` instead of being expanded again.
    pub fn describe(&self, by_alias: bool) -> Document {
        doc! {
            "title": self.name,
            "type": "object",
            "properties": self.properties(by_alias, &mut vec![self.name]),
        }
    }

    fn properties(&self, by_alias: bool, visiting: &mut Vec<&'static str>) -> Document {
        let mut properties = Document::new();
        for field in self.fields() {
            let mut property = doc! { "type": field.kind.type_name() };
            if let FieldKind::Embedded(nested) = &field.kind {
                if visiting.contains(&nested.name) {
                    property.insert("$ref", nested.name);
                } else {
                    visiting.push(nested.name);
                    property.insert("title", nested.name);
                    property.insert("properties", nested.properties(by_alias, visiting));
                    visiting.pop();
                }
            }
            properties.insert(field.record_key(by_alias), property);
        }
        properties
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for SchemaRef {}

impl Hash for SchemaRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A serde type with declared, queryable fields.
///
/// Embedded documents implement only this trait. Documents also implement
/// [`Document`](crate::document::Document) and set [`Schema::PRIMARY_KEY`].
pub trait Schema: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The attribute holding the primary key, for documents.
    const PRIMARY_KEY: Option<&'static str> = None;

    /// The name of the schema type.
    fn schema_name() -> &'static str;

    /// The declared fields, excluding the primary key.
    fn fields() -> Vec<FieldDef>;

    /// Resolves a top-level attribute of this schema.
    fn field(name: &str) -> DocumentStoreResult<FieldPath> {
        SchemaRef::of::<Self>().resolve(name)
    }

    /// Resolves a dotted attribute path such as `"info.money"`.
    fn path(dotted: &str) -> DocumentStoreResult<FieldPath> {
        let segments = dotted.split('.').collect::<Vec<_>>();
        resolve_path(&SchemaRef::of::<Self>(), &segments)
    }
}

/// Resolves an attribute path against a schema, descending into embedded schemas.
///
/// # Errors
///
/// Returns [`DocumentStoreError::UnknownField`] when a segment is not declared
/// or descends into a field that is not an embedded schema, and
/// [`DocumentStoreError::MalformedExpression`] when `segments` is empty.
pub fn resolve_path<S: AsRef<str>>(schema: &SchemaRef, segments: &[S]) -> DocumentStoreResult<FieldPath> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(DocumentStoreError::MalformedExpression(format!(
            "empty attribute path on schema {}",
            schema.name
        )));
    };

    rest.iter().try_fold(schema.resolve(first.as_ref())?, |path, segment| {
        path.child(segment.as_ref())
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub(crate) struct Address {
        pub city: String,
        pub zip: String,
    }

    impl Schema for Address {
        fn schema_name() -> &'static str {
            "Address"
        }

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new("city", FieldKind::String),
                FieldDef::new("zip", FieldKind::String).with_alias("postalCode"),
            ]
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub(crate) struct Profile {
        pub money: f64,
        pub address: Address,
    }

    impl Schema for Profile {
        fn schema_name() -> &'static str {
            "Profile"
        }

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new("money", FieldKind::Float),
                FieldDef::embedded::<Address>("address").with_alias("addr"),
            ]
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    pub(crate) struct Account {
        #[serde(default)]
        pub id: i64,
        pub name: String,
        pub age: i64,
        pub profile: Profile,
    }

    impl Schema for Account {
        const PRIMARY_KEY: Option<&'static str> = Some("id");

        fn schema_name() -> &'static str {
            "Account"
        }

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new("name", FieldKind::String).with_alias("fullName"),
                FieldDef::new("age", FieldKind::Int),
                FieldDef::embedded::<Profile>("profile"),
            ]
        }
    }

    #[test]
    fn test_resolve_top_level_field() {
        let path = Account::field("name").unwrap();
        assert_eq!(path.to_string(), "name");
        assert!(path.ancestors().is_empty());
    }

    #[test]
    fn test_resolve_primary_key_renders_reserved_name() {
        let path = Account::field("id").unwrap();
        assert!(path.field().is_primary_key());
        assert_eq!(path.to_string(), RESERVED_ID_KEY);
        assert_eq!(path.attribute_path(), vec!["id"]);
    }

    #[test]
    fn test_resolve_nested_path() {
        let path = Account::path("profile.address.city").unwrap();
        assert_eq!(path.to_string(), "profile.address.city");
        assert_eq!(path.owner(), "Address");
        assert_eq!(path.ancestors().len(), 2);
    }

    #[test]
    fn test_resolve_unknown_field() {
        let result = Account::path("profile.missing");
        assert!(matches!(
            result,
            Err(DocumentStoreError::UnknownField { ref schema, ref field }) if schema == "Profile" && field == "missing"
        ));
    }

    #[test]
    fn test_resolve_through_scalar_field_fails() {
        assert!(matches!(Account::path("name.first"), Err(DocumentStoreError::UnknownField { .. })));
    }

    #[test]
    fn test_resolve_empty_path_fails() {
        let result = resolve_path::<&str>(&SchemaRef::of::<Account>(), &[]);
        assert!(matches!(result, Err(DocumentStoreError::MalformedExpression(_))));
    }

    #[test]
    fn test_schema_fields_include_primary_key() {
        let fields = SchemaRef::of::<Account>().fields();
        assert_eq!(fields.len(), 4);
        assert!(fields.last().unwrap().is_primary_key());
        assert_eq!(SchemaRef::of::<Profile>().fields().len(), 2);
    }

    #[test]
    fn test_describe_uses_record_keys() {
        let described = SchemaRef::of::<Account>().describe(true);
        let properties = described.get_document("properties").unwrap();
        assert!(properties.contains_key("fullName"));
        assert!(properties.contains_key(RESERVED_ID_KEY));
        let profile = properties.get_document("profile").unwrap();
        assert_eq!(profile.get_str("title").unwrap(), "Profile");
        assert!(profile.get_document("properties").unwrap().contains_key("addr"));
    }

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Node {
        value: i64,
        next: Option<Box<Node>>,
    }

    impl Schema for Node {
        fn schema_name() -> &'static str {
            "Node"
        }

        fn fields() -> Vec<FieldDef> {
            vec![
                FieldDef::new("value", FieldKind::Int),
                FieldDef::embedded::<Node>("next"),
            ]
        }
    }

    #[test]
    fn test_describe_self_referential_schema() {
        let described = SchemaRef::of::<Node>().describe(false);
        let next = described
            .get_document("properties")
            .unwrap()
            .get_document("next")
            .unwrap();
        assert_eq!(next.get_str("$ref").unwrap(), "Node");
        assert!(!next.contains_key("properties"));
    }

    #[test]
    fn test_describe_repeated_sibling_schema_expands_each() {
        let described = SchemaRef::of::<Account>().describe(false);
        let profile = described
            .get_document("properties")
            .unwrap()
            .get_document("profile")
            .unwrap();
        let address = profile.get_document("properties").unwrap().get_document("address").unwrap();
        assert_eq!(address.get_str("title").unwrap(), "Address");
        assert!(!address.contains_key("$ref"));
    }
}
