//! Field selection and exclusion
//!
//! The primary key survives both: a selection always carries it and an
//! exclusion never removes it.

use crate::document::{resolve_owned, set_path, without_path, Document};
use crate::query::{QueryError, QueryResult, SelectEntry, SelectField};

/// Applies `fieldsToSelect` and `fieldsToExclude`
pub struct Projector<'a> {
    primary_key: &'a str,
}

impl<'a> Projector<'a> {
    pub fn new(primary_key: &'a str) -> Self {
        Self { primary_key }
    }

    /// Builds a fresh document per row from the primary key and each
    /// selected path. Dotted aliases become nested objects; entries sharing
    /// a prefix merge into one object.
    pub fn select(&self, documents: Vec<Document>, entries: &[SelectEntry]) -> QueryResult<Vec<Document>> {
        if entries.is_empty() {
            return Ok(documents);
        }
        documents
            .into_iter()
            .map(|document| -> QueryResult<Document> {
                let mut selected = Document::new();
                if let Some(key) = document.get(self.primary_key) {
                    selected.insert(self.primary_key.to_string(), key.clone());
                }
                for entry in entries {
                    let SelectField::Path(source) = &entry.field else {
                        return Err(QueryError::invalid_argument(
                            "If select is used an array containing strings with fieldNames has to be given",
                        ));
                    };
                    let value = resolve_owned(&document, source)?;
                    set_path(&mut selected, entry.output_name(), value)?;
                }
                Ok(selected)
            })
            .collect()
    }

    /// Removes each path's leaf, keeping siblings
    pub fn exclude(&self, documents: Vec<Document>, paths: &[String]) -> Vec<Document> {
        if paths.is_empty() {
            return documents;
        }
        documents
            .into_iter()
            .map(|document| {
                paths
                    .iter()
                    .filter(|path| path.trim() != self.primary_key)
                    .fold(document, |document, path| without_path(document, path))
            })
            .collect()
    }
}
