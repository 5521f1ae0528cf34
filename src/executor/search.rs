//! Keyword search ranking
//!
//! Scores each document by string similarity between the keyword and its
//! searchable fields, keeps documents with a field scoring above 50 and
//! orders them by descending total score.

use serde_json::Value;

use crate::document::{resolve, Document};
use crate::query::SearchSpec;

/// Per-field scores at or below this are ignored
const MIN_FIELD_SCORE: f64 = 50.0;

/// Ranks documents against a search keyword
pub struct SearchRanker;

impl SearchRanker {
    pub fn rank(documents: Vec<Document>, search: &SearchSpec) -> Vec<Document> {
        let keyword: Vec<char> = search.keyword.to_lowercase().chars().collect();

        let mut scored: Vec<(f64, Document)> = documents
            .into_iter()
            .filter_map(|document| {
                let score = search
                    .fields
                    .iter()
                    .filter_map(|field| match resolve(&document, field) {
                        Ok(Some(Value::String(text))) => {
                            let text: Vec<char> = text.to_lowercase().chars().collect();
                            Some(similarity_percent(&text, &keyword))
                        }
                        _ => None,
                    })
                    .filter(|percent| *percent > MIN_FIELD_SCORE)
                    .fold(None, |total: Option<f64>, percent| {
                        Some(total.unwrap_or(0.0) + percent)
                    })?;
                Some((score, document))
            })
            .collect();

        // Stable, so equal scores keep scan order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().map(|(_, document)| document).collect()
    }
}

/// Similarity in percent: twice the common characters over the total
/// length of both strings
pub fn similarity_percent(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (common_chars(a, b) * 2) as f64 * 100.0 / total as f64
}

/// Length of the first longest common substring plus, recursively, the
/// common characters left and right of it
fn common_chars(a: &[char], b: &[char]) -> usize {
    let (mut best, mut at_a, mut at_b) = (0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let mut len = 0;
            while i + len < a.len() && j + len < b.len() && a[i + len] == b[j + len] {
                len += 1;
            }
            if len > best {
                best = len;
                at_a = i;
                at_b = j;
            }
        }
    }
    if best == 0 {
        return 0;
    }
    best + common_chars(&a[..at_a], &b[..at_b])
        + common_chars(&a[at_a + best..], &b[at_b + best..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_similarity_percent() {
        assert_eq!(similarity_percent(&chars("hello"), &chars("hello")), 100.0);
        assert_eq!(similarity_percent(&chars("abc"), &chars("xyz")), 0.0);
        // "World" / "Word": common "Wor" + "d" = 4, 8 * 100 / 9
        let p = similarity_percent(&chars("World"), &chars("Word"));
        assert!((p - 800.0 / 9.0).abs() < 1e-9);
        assert_eq!(similarity_percent(&[], &[]), 0.0);
    }

    #[test]
    fn test_rank_orders_and_filters() {
        let docs = vec![
            doc(json!({"_id": 1, "title": "completely different"})),
            doc(json!({"_id": 2, "title": "rust bool"})),
            doc(json!({"_id": 3, "title": "Rust book"})),
        ];
        let ranked = SearchRanker::rank(docs, &SearchSpec::new("rust book", ["title"]));
        let ids: Vec<_> = ranked.iter().map(|d| d["_id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2)]);
    }

    #[test]
    fn test_scores_sum_across_fields() {
        let docs = vec![
            doc(json!({"_id": 1, "a": "apple", "b": "zzz"})),
            doc(json!({"_id": 2, "a": "apple", "b": "apple"})),
        ];
        let ranked = SearchRanker::rank(docs, &SearchSpec::new("apple", ["a", "b"]));
        assert_eq!(ranked[0]["_id"], json!(2));
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_non_string_fields_ignored() {
        let docs = vec![doc(json!({"_id": 1, "a": 12345}))];
        assert!(SearchRanker::rank(docs, &SearchSpec::new("12345", ["a"])).is_empty());
    }
}
