//! Post-scan result pipeline
//!
//! Fixed order: search ranking, joins, sort, skip/limit, then either
//! aggregation or projection.

use crate::document::Document;
use crate::query::{QueryConfig, QueryResult};

use super::aggregate::Aggregator;
use super::joiner::Joiner;
use super::projection::Projector;
use super::search::SearchRanker;
use super::sorter::ResultSorter;

/// Turns the scanned matches into the user-facing result
pub struct ResultPipeline<'a> {
    config: &'a QueryConfig,
    primary_key: &'a str,
}

impl<'a> ResultPipeline<'a> {
    pub fn new(config: &'a QueryConfig, primary_key: &'a str) -> Self {
        Self { config, primary_key }
    }

    pub fn run(&self, documents: Vec<Document>) -> QueryResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(documents);
        }
        let config = self.config;

        let documents = match &config.search {
            Some(search) if !search.keyword.is_empty() => SearchRanker::rank(documents, search),
            _ => documents,
        };
        let documents = Joiner::apply(documents, &config.joins)?;
        let documents = ResultSorter::sort(documents, &config.order_by)?;
        let documents = Self::slice(documents, config.skip, config.limit);

        match &config.group_by {
            Some(spec) => Aggregator::new(spec, &config.fields_to_select)?
                .aggregate(&documents, config.having.as_ref()),
            None => {
                let projector = Projector::new(self.primary_key);
                let documents = projector.select(documents, &config.fields_to_select)?;
                Ok(projector.exclude(documents, &config.fields_to_exclude))
            }
        }
    }

    fn slice(documents: Vec<Document>, skip: usize, limit: Option<usize>) -> Vec<Document> {
        let remaining = documents.into_iter().skip(skip);
        match limit {
            Some(limit) => remaining.take(limit).collect(),
            None => remaining.collect(),
        }
    }
}
