//! Update and delete
//!
//! Both reselect their targets with a plain scan: no search, join, sort,
//! slicing or projection. Neither is transactional. An update checks that
//! every target file still exists before writing any of them; a delete
//! stops at the first file it cannot remove and reports how many were
//! already gone.
//!
//! Targets are written back to the file the scan read them from. The
//! primary-key value inside a document never names the file to touch.
//!
//! A second mutation starting between an update's existence check and
//! its writes is not guarded against.

use std::path::PathBuf;

use serde_json::Value;

use crate::document::{set_segments, split_path, Document};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::query::{QueryConfig, QueryError, QueryResult};
use crate::store::Store;

use super::gateway::CacheGateway;
use super::result::{DeleteOutcome, DeleteReturn, UpdateOutcome};
use super::scanner::{DocumentScanner, ScannedDocument};

/// Applies updates and deletes to the documents a configuration selects
pub struct MutationExecutor<'a> {
    store: &'a Store,
}

impl<'a> MutationExecutor<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    fn select(&self, config: &QueryConfig) -> QueryResult<Vec<ScannedDocument>> {
        DocumentScanner::new(
            self.store.storage(),
            self.store.data_path(),
            self.store.metrics(),
        )
        .scan_with_paths(config, false)
    }

    fn gateway(&self) -> CacheGateway<'a> {
        CacheGateway::new(self.store.cache(), self.store.metrics())
    }

    /// Writes `updates` (dot-path → value) into every selected document.
    ///
    /// Returns `Flag(false)` without touching any file when nothing
    /// matches or when a selected document's file has disappeared.
    pub fn update(
        &self,
        config: &QueryConfig,
        updates: &Document,
        return_documents: bool,
    ) -> QueryResult<UpdateOutcome> {
        let primary_key = self.store.primary_key();

        let mut assignments: Vec<(Vec<&str>, &Value)> = Vec::with_capacity(updates.len());
        for (path, value) in updates {
            let segments = split_path(path)?;
            if segments.first() == Some(&primary_key) {
                continue;
            }
            assignments.push((segments, value));
        }

        let targets = self.select(config)?;
        if targets.is_empty() {
            return Ok(UpdateOutcome::Flag(false));
        }

        if let Some(missing) = targets
            .iter()
            .find(|target| !self.store.storage().exists(&target.path))
        {
            log_event_with_fields(
                Event::UpdateAborted,
                &[
                    ("reason", "document file missing"),
                    ("path", &missing.path.display().to_string()),
                ],
            );
            return Ok(UpdateOutcome::Flag(false));
        }
        let paths: Vec<PathBuf> = targets.into_iter().map(|target| target.path).collect();

        let count = paths.len().to_string();
        let scope = ObservationScope::with_fields("UPDATE", &[("documents", &count)]);

        let transform = |mut document: Document| {
            for (segments, value) in &assignments {
                set_segments(&mut document, segments, (*value).clone());
            }
            document
        };

        let mut updated = Vec::with_capacity(paths.len());
        for path in &paths {
            match self.store.storage().update_document(path, &transform) {
                Ok(document) => updated.push(document),
                Err(err) => {
                    scope.fail(&err.to_string());
                    return Err(err.into());
                }
            }
        }

        if let Err(err) = self.gateway().invalidate() {
            scope.fail(&err.to_string());
            return Err(err);
        }
        self.store.metrics().add_documents_updated(updated.len() as u64);
        scope.complete_with_fields(&[("updated", &updated.len().to_string())]);

        if return_documents {
            Ok(UpdateOutcome::Documents(updated))
        } else {
            Ok(UpdateOutcome::Flag(true))
        }
    }

    /// Removes every selected document's file, in selection order.
    ///
    /// The returned value describes the selection before deletion. The
    /// first file that cannot be removed aborts with
    /// [`QueryError::DeleteAborted`]; earlier deletions are not undone.
    pub fn delete(&self, config: &QueryConfig, return_option: DeleteReturn) -> QueryResult<DeleteOutcome> {
        let (paths, targets): (Vec<PathBuf>, Vec<Document>) = self
            .select(config)?
            .into_iter()
            .map(|target| (target.path, target.document))
            .unzip();

        let outcome = match return_option {
            DeleteReturn::Bool => DeleteOutcome::Bool(!targets.is_empty()),
            DeleteReturn::Count => DeleteOutcome::Count(targets.len()),
            DeleteReturn::Documents => DeleteOutcome::Documents(targets),
        };
        if paths.is_empty() {
            return Ok(outcome);
        }

        let count = paths.len().to_string();
        let scope = ObservationScope::with_fields("DELETE", &[("documents", &count)]);

        for (deleted, path) in paths.iter().enumerate() {
            if !self.store.storage().delete_document(path) {
                let display = path.display().to_string();
                log_event_with_fields(
                    Event::DeleteAborted,
                    &[("deleted", &deleted.to_string()), ("path", &display)],
                );
                self.store.metrics().add_documents_deleted(deleted as u64);
                scope.fail_fatal(&format!("could not delete {}", display));
                return Err(QueryError::DeleteAborted {
                    deleted,
                    path: path.clone(),
                });
            }
        }

        if let Err(err) = self.gateway().invalidate() {
            scope.fail(&err.to_string());
            return Err(err);
        }
        self.store.metrics().add_documents_deleted(paths.len() as u64);
        scope.complete();

        Ok(outcome)
    }
}
