//! Field paths: handles on declared attributes used to build query expressions.
//!
//! A [`FieldPath`] names one declared field together with the chain of
//! embedded attributes that leads to it. Builder methods such as
//! [`FieldPath::eq`] or [`FieldPath::starts_with`] turn it into an
//! [`Expression`](crate::expression::Expression).

use std::fmt;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    schema::{FieldDef, FieldKind},
};

/// One traversal step recorded on a nested field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ancestor {
    attribute: &'static str,
    owner: &'static str,
}

impl Ancestor {
    /// The attribute that was traversed.
    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    /// The schema declaring the traversed attribute.
    pub fn owner(&self) -> &'static str {
        self.owner
    }
}

/// A declared attribute of a schema, possibly reached through embedded schemas.
///
/// Equality and hashing are structural over the field declaration, its owning
/// schema and the ancestor chain, so field paths work as map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    field: FieldDef,
    owner: &'static str,
    ancestors: Vec<Ancestor>,
}

impl FieldPath {
    pub(crate) fn new(field: FieldDef, owner: &'static str) -> Self {
        Self { field, owner, ancestors: Vec::new() }
    }

    /// The declaration of the leaf field.
    pub fn field(&self) -> &FieldDef {
        &self.field
    }

    /// The schema declaring the leaf field.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// The traversal steps from the root schema down to the leaf's owner.
    pub fn ancestors(&self) -> &[Ancestor] {
        &self.ancestors
    }

    /// Resolves an attribute of the embedded schema this field holds.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::UnknownField`] when this field does not
    /// hold an embedded schema or the schema does not declare `name`.
    pub fn child(&self, name: &str) -> DocumentStoreResult<FieldPath> {
        let FieldKind::Embedded(nested) = self.field.kind() else {
            return Err(DocumentStoreError::UnknownField {
                schema: self.owner.to_string(),
                field: format!("{}.{}", self.field.name(), name),
            });
        };

        let mut target = nested.resolve(name)?;
        target.descend_from(self);
        Ok(target)
    }

    /// Records `parent` as the path leading to this field.
    ///
    /// The parent's own step is appended and its unrecorded ancestors are
    /// prepended; entries already present are never duplicated.
    fn descend_from(&mut self, parent: &FieldPath) {
        let step = Ancestor { attribute: parent.field.name(), owner: parent.owner };
        if !self.ancestors.contains(&step) {
            self.ancestors.push(step);
        }

        let mut ancestors = parent
            .ancestors
            .iter()
            .filter(|ancestor| !self.ancestors.contains(ancestor))
            .cloned()
            .collect::<Vec<_>>();
        ancestors.append(&mut self.ancestors);
        self.ancestors = ancestors;
    }

    /// Declared attribute names from the root to the leaf.
    ///
    /// Unlike [`fmt::Display`], the primary key keeps its declared name. This is
    /// the path used to address the typed instance rather than its record.
    pub fn attribute_path(&self) -> Vec<&'static str> {
        self.ancestors
            .iter()
            .map(Ancestor::attribute)
            .chain(std::iter::once(self.field.name()))
            .collect()
    }

    /// [`FieldPath::attribute_path`] joined with dots.
    pub fn attribute_key(&self) -> String {
        self.attribute_path().join(".")
    }

    /// Keys leading to this field inside a native record.
    pub fn record_segments(&self) -> Vec<&'static str> {
        self.ancestors
            .iter()
            .map(Ancestor::attribute)
            .chain(std::iter::once(self.field.record_key(false)))
            .collect()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.record_segments().join("."))
    }
}
