//! Document scanning
//!
//! Visits every `*.json` entry of a store's data directory in filename
//! order and keeps the documents that pass the condition tree, the
//! legacy nested-where filter and the distinct check.
//!
//! A document that cannot be read or decoded is skipped, logged and
//! counted; it never aborts the scan. The scan is not a snapshot:
//! documents written or removed concurrently may or may not be seen.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::document::{resolve, Document};
use crate::observability::{Event, Logger, MetricsRegistry};
use crate::query::{QueryConfig, QueryResult};
use crate::storage::DocumentStorage;

use super::filters::ConditionEvaluator;
use super::legacy::LegacyEvaluator;

const DOCUMENT_EXTENSION: &str = ".json";

/// A matching document together with the file it was read from
#[derive(Debug, Clone)]
pub struct ScannedDocument {
    pub path: PathBuf,
    pub document: Document,
}

/// Selects matching documents from a data directory
pub struct DocumentScanner<'a> {
    storage: &'a dyn DocumentStorage,
    data_dir: &'a Path,
    metrics: &'a MetricsRegistry,
}

impl<'a> DocumentScanner<'a> {
    pub fn new(
        storage: &'a dyn DocumentStorage,
        data_dir: &'a Path,
        metrics: &'a MetricsRegistry,
    ) -> Self {
        Self {
            storage,
            data_dir,
            metrics,
        }
    }

    /// Returns the matching documents in scan order. With `first_only` the
    /// scan stops at the first match.
    pub fn scan(&self, config: &QueryConfig, first_only: bool) -> QueryResult<Vec<Document>> {
        let scanned = self.scan_with_paths(config, first_only)?;
        Ok(scanned.into_iter().map(|s| s.document).collect())
    }

    /// Like [`scan`](Self::scan) but keeps the source file of every match.
    /// Mutations write back to these paths; they never derive a path from
    /// document content.
    pub fn scan_with_paths(
        &self,
        config: &QueryConfig,
        first_only: bool,
    ) -> QueryResult<Vec<ScannedDocument>> {
        self.storage.check_read(self.data_dir)?;

        let mut found: Vec<ScannedDocument> = Vec::new();
        for entry in self.storage.list_entries(self.data_dir)? {
            if !entry.ends_with(DOCUMENT_EXTENSION) {
                continue;
            }
            let path = self.data_dir.join(&entry);
            let Some(document) = self.load(&path) else {
                continue;
            };

            if !Self::passes(config, &document)? {
                continue;
            }
            if !config.distinct_fields.is_empty()
                && Self::is_duplicate(&config.distinct_fields, &found, &document)
            {
                continue;
            }

            found.push(ScannedDocument { path, document });
            if first_only {
                break;
            }
        }
        Ok(found)
    }

    /// Reads and decodes one document; `None` when it has to be skipped
    fn load(&self, path: &Path) -> Option<Document> {
        let content = match self.storage.read_document(path) {
            Ok(content) => content,
            Err(e) => {
                self.skip(path, &e.to_string());
                return None;
            }
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(document)) => {
                self.metrics.increment_documents_scanned();
                Some(document)
            }
            Ok(_) => {
                self.skip(path, "content is not a JSON object");
                None
            }
            Err(e) => {
                self.skip(path, &e.to_string());
                None
            }
        }
    }

    fn skip(&self, path: &Path, reason: &str) {
        self.metrics.increment_documents_skipped();
        Logger::warn(
            Event::DocumentSkipped.as_str(),
            &[("path", &path.display().to_string()), ("reason", reason)],
        );
    }

    fn passes(config: &QueryConfig, document: &Document) -> QueryResult<bool> {
        let primary = match &config.conditions {
            Some(condition) => ConditionEvaluator::evaluate(condition, document)?,
            None => true,
        };
        match &config.nested_where {
            Some(nested) => LegacyEvaluator::apply(nested, primary, document),
            None => Ok(primary),
        }
    }

    /// A candidate is a duplicate when any distinct field equals that
    /// field of an already accepted document.
    fn is_duplicate(
        fields: &[String],
        accepted: &[ScannedDocument],
        candidate: &Document,
    ) -> bool {
        accepted.iter().any(|kept| {
            fields.iter().any(|field| {
                match (resolve(&kept.document, field), resolve(candidate, field)) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            })
        })
    }
}
