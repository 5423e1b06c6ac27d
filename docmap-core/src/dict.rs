//! Nested mapping helpers over native records.
//!
//! These functions treat a [`bson::Document`] as a tree of nested mappings
//! addressed by dotted paths (`"info.money"`). They are pure: every function
//! returns a new document or walks a borrowed one.

use bson::{Bson, Document};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Right-biased recursive merge of two documents.
///
/// Keys present in both whose values are both documents are merged
/// recursively. Otherwise the value from `b` wins when `b` has the key, and the
/// value from `a` is kept when it does not.
pub fn merge(a: &Document, b: &Document) -> Document {
    let mut result = Document::new();

    for (key, left) in a {
        let value = match (left, b.get(key)) {
            (Bson::Document(left), Some(Bson::Document(right))) => Bson::Document(merge(left, right)),
            (_, Some(right)) => right.clone(),
            (_, None) => left.clone(),
        };
        result.insert(key.clone(), value);
    }

    for (key, right) in b {
        if !a.contains_key(key) {
            result.insert(key.clone(), right.clone());
        }
    }

    result
}

/// Builds the nested document for a single dotted assignment.
///
/// `expand("a.b.c", 1)` yields `{a: {b: {c: 1}}}`.
pub fn expand(flat_key: &str, value: impl Into<Bson>) -> Document {
    let mut segments = flat_key.rsplit('.');
    let mut current = Document::new();

    match segments.next() {
        Some(leaf) => current.insert(leaf, value.into()),
        None => current.insert(flat_key, value.into()),
    };

    for segment in segments {
        let mut parent = Document::new();
        parent.insert(segment, current);
        current = parent;
    }

    current
}

/// Expands every key of `flat` and merges the results into one document.
///
/// Keys may be plain or dotted. When two keys assign the same leaf, the first
/// one wins.
pub fn expand_all(flat: &Document) -> Document {
    flat.iter().fold(Document::new(), |result, (key, value)| {
        merge(&expand(key, value.clone()), &result)
    })
}

/// Looks up a nested value by its path segments.
///
/// Returns `None` when a key is missing or an intermediate value is not a
/// document.
pub fn get_path<'a, S: AsRef<str>>(doc: &'a Document, segments: &[S]) -> Option<&'a Bson> {
    let (first, rest) = segments.split_first()?;
    let mut current = doc.get(first.as_ref())?;

    for segment in rest {
        current = current.as_document()?.get(segment.as_ref())?;
    }

    Some(current)
}

/// Assigns `value` at a nested path, creating missing intermediate documents.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] when the path is empty or an
/// intermediate value exists but is not a document.
pub fn set_path<S: AsRef<str>>(doc: &mut Document, segments: &[S], value: Bson) -> DocumentStoreResult<()> {
    let Some((leaf, parents)) = segments.split_last() else {
        return Err(DocumentStoreError::InvalidDocument("cannot assign to an empty path".to_string()));
    };

    let mut current = doc;
    for segment in parents {
        let key = segment.as_ref();
        if !current.contains_key(key) {
            current.insert(key, Document::new());
        }
        current = match current.get_mut(key) {
            Some(Bson::Document(inner)) => inner,
            _ => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "cannot assign below {key}: value is not a document"
                )));
            }
        };
    }

    current.insert(leaf.as_ref(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use proptest::prelude::*;

    #[test]
    fn test_merge_nested_documents() {
        let merged = merge(&doc! { "a": { "x": 1 } }, &doc! { "a": { "y": 2 } });
        assert_eq!(merged, doc! { "a": { "x": 1, "y": 2 } });
    }

    #[test]
    fn test_merge_is_right_biased() {
        assert_eq!(merge(&doc! { "a": 1 }, &doc! { "a": 2 }), doc! { "a": 2 });
        assert_eq!(merge(&doc! { "a": { "x": 1 } }, &doc! { "a": 2 }), doc! { "a": 2 });
        assert_eq!(merge(&doc! { "a": 1 }, &doc! { "a": { "x": 1 } }), doc! { "a": { "x": 1 } });
    }

    #[test]
    fn test_merge_keeps_disjoint_keys() {
        let merged = merge(&doc! { "a": 1 }, &doc! { "b": 2 });
        assert_eq!(merged, doc! { "a": 1, "b": 2 });
    }

    #[test]
    fn test_expand_dotted_key() {
        assert_eq!(expand("info.money", 300), doc! { "info": { "money": 300 } });
        assert_eq!(expand("name", "Ax"), doc! { "name": "Ax" });
    }

    #[test]
    fn test_expand_all_merges_assignments() {
        let expanded = expand_all(&doc! {
            "info.money": 300,
            "info.birthday": "2020-01-01",
            "name": "Ax",
        });
        assert_eq!(
            expanded,
            doc! { "info": { "money": 300, "birthday": "2020-01-01" }, "name": "Ax" }
        );
    }

    #[test]
    fn test_expand_all_first_assignment_wins() {
        let expanded = expand_all(&doc! { "info": { "money": 1 }, "info.money": 2 });
        assert_eq!(expanded, doc! { "info": { "money": 1 } });
    }

    #[test]
    fn test_get_path() {
        let record = doc! { "age": 18, "info": { "money": 300 } };
        assert_eq!(get_path(&record, &["info", "money"]), Some(&Bson::Int32(300)));
        assert_eq!(get_path(&record, &["info", "missing"]), None);
        assert_eq!(get_path(&record, &["age", "money"]), None);
        assert_eq!(get_path::<&str>(&record, &[]), None);
    }

    #[test]
    fn test_set_path_creates_parents() {
        let mut record = doc! { "name": "Ax" };
        set_path(&mut record, &["info", "money"], Bson::Int32(5)).unwrap();
        assert_eq!(record, doc! { "name": "Ax", "info": { "money": 5 } });
    }

    #[test]
    fn test_set_path_rejects_scalar_parent() {
        let mut record = doc! { "name": "Ax" };
        let result = set_path(&mut record, &["name", "first"], Bson::Int32(5));
        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }

    fn flat_document() -> impl Strategy<Value = Document> {
        prop::collection::btree_map("[a-d]", any::<i32>(), 0..5).prop_map(|entries| {
            entries.into_iter().fold(Document::new(), |mut doc, (key, value)| {
                doc.insert(key, value);
                doc
            })
        })
    }

    proptest! {
        #[test]
        fn prop_merge_with_empty_is_identity(doc in flat_document()) {
            prop_assert_eq!(merge(&doc, &Document::new()), doc.clone());
            prop_assert_eq!(merge(&Document::new(), &doc), doc);
        }

        #[test]
        fn prop_merge_prefers_right(left in flat_document(), right in flat_document()) {
            let merged = merge(&left, &right);
            for (key, value) in &right {
                prop_assert_eq!(merged.get(key), Some(value));
            }
            for (key, value) in &left {
                if !right.contains_key(key) {
                    prop_assert_eq!(merged.get(key), Some(value));
                }
            }
        }

        #[test]
        fn prop_expand_then_get_path(segments in prop::collection::vec("[a-z]{1,4}", 1..4), value in any::<i32>()) {
            let expanded = expand(&segments.join("."), value);
            prop_assert_eq!(get_path(&expanded, &segments), Some(&Bson::Int32(value)));
        }
    }
}
