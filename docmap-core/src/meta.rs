//! Per-document metadata: which database a document lives in, under which
//! collection name, and whether records are stored by alias.
//!
//! Metadata is layered. A document's resolved configuration takes each
//! attribute from the explicit overrides first, then from the document's own
//! [`Document::meta`], then from its inherited [`Document::bases`]. The
//! collection name is never inherited: it defaults to the schema name.

use crate::{document::Document, store::Database};

/// Metadata attached to a document type. Unset attributes fall through to the
/// next layer when configurations are composed.
#[derive(Debug, Clone, Default)]
pub struct MetaConfig {
    db: Option<Database>,
    name: Option<String>,
    by_alias: Option<bool>,
}

impl MetaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the database the document binds to on definition.
    pub fn with_db(mut self, db: Database) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the collection name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets whether records are stored under field aliases.
    pub fn with_by_alias(mut self, by_alias: bool) -> Self {
        self.by_alias = Some(by_alias);
        self
    }

    pub fn db(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    /// The collection name, empty when unset.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn by_alias(&self) -> bool {
        self.by_alias.unwrap_or(false)
    }

    pub(crate) fn set_db(&mut self, db: Database) {
        self.db = Some(db);
    }

    /// Fills every attribute unset on `self` from `fallback`.
    fn or(self, fallback: &MetaConfig) -> MetaConfig {
        MetaConfig {
            db: self.db.or_else(|| fallback.db.clone()),
            name: self.name.or_else(|| fallback.name.clone()),
            by_alias: self.by_alias.or(fallback.by_alias),
        }
    }

    /// Composes one layer of metadata.
    ///
    /// Each attribute is taken from `overrides`, then `own`, then `parent`.
    /// Without an own configuration the parent is the only fallback.
    pub fn compose(own: Option<&MetaConfig>, parent: &MetaConfig, overrides: MetaConfig) -> MetaConfig {
        match own {
            Some(own) => overrides.or(own).or(parent),
            None => overrides.or(parent),
        }
    }

    /// Merges base configurations, the first declared base taking precedence.
    pub fn inherit(bases: &[MetaConfig]) -> MetaConfig {
        bases.iter().rev().fold(MetaConfig::default(), |parent, base| {
            MetaConfig::compose(Some(base), &parent, MetaConfig::default())
        })
    }
}

/// Resolves the effective metadata of document type `D`.
pub fn resolve<D: Document>(overrides: MetaConfig) -> MetaConfig {
    let mut parent = MetaConfig::inherit(&D::bases());
    parent.name = Some(D::schema_name().to_string());

    MetaConfig::compose(D::meta().as_ref(), &parent, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_prefers_overrides_then_own() {
        let own = MetaConfig::new().with_name("people").with_by_alias(true);
        let parent = MetaConfig::new().with_name("users").with_by_alias(false);

        let resolved = MetaConfig::compose(Some(&own), &parent, MetaConfig::new());
        assert_eq!(resolved.name(), "people");
        assert!(resolved.by_alias());

        let resolved = MetaConfig::compose(Some(&own), &parent, MetaConfig::new().with_name("accounts"));
        assert_eq!(resolved.name(), "accounts");
        assert!(resolved.by_alias());
    }

    #[test]
    fn test_compose_without_own_uses_parent() {
        let parent = MetaConfig::new().with_by_alias(true);
        let resolved = MetaConfig::compose(None, &parent, MetaConfig::new());
        assert!(resolved.by_alias());
        assert_eq!(resolved.name(), "");
        assert!(resolved.db().is_none());
    }

    #[test]
    fn test_inherit_nearest_base_wins() {
        let near = MetaConfig::new().with_name("near");
        let far = MetaConfig::new().with_name("far").with_by_alias(true);

        let inherited = MetaConfig::inherit(&[near, far]);
        assert_eq!(inherited.name(), "near");
        assert!(inherited.by_alias());
    }

    #[test]
    fn test_inherit_no_bases_is_default() {
        let inherited = MetaConfig::inherit(&[]);
        assert_eq!(inherited.name(), "");
        assert!(!inherited.by_alias());
    }
}
