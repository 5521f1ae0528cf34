//! Documents and dot-path access
//!
//! A document is one JSON object persisted as `<primary key>.json`. Field
//! paths address nested values with `.` separators; numeric segments index
//! into arrays.

mod path;

pub use path::{
    nest, resolve, resolve_owned, set_path, set_segments, split_path, without_path, PathError,
};

use serde_json::{Map, Value};

/// A stored document: an ordered JSON object
pub type Document = Map<String, Value>;

/// Returns the file stem used for a document with the given primary key
/// value, or `None` if the value cannot name a file inside the data
/// directory. Separators, NUL and the `.`/`..` components are rejected.
pub fn key_stem(document: &Document, primary_key: &str) -> Option<String> {
    match document.get(primary_key)? {
        Value::String(s) if is_plain_stem(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_plain_stem(stem: &str) -> bool {
    !stem.is_empty()
        && stem != "."
        && stem != ".."
        && !stem.contains(['/', '\\', '\0'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_key_stem_number_and_string() {
        assert_eq!(key_stem(&doc(json!({"_id": 7})), "_id"), Some("7".into()));
        assert_eq!(key_stem(&doc(json!({"id": "abc"})), "id"), Some("abc".into()));
    }

    #[test]
    fn test_key_stem_rejects_unusable_values() {
        assert_eq!(key_stem(&doc(json!({"_id": null})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": ""})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": [1]})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"name": "x"})), "_id"), None);
    }

    #[test]
    fn test_key_stem_rejects_path_components() {
        assert_eq!(key_stem(&doc(json!({"_id": "../../victim"})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": "a/b"})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": "a\\b"})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": ".."})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": "."})), "_id"), None);
        assert_eq!(key_stem(&doc(json!({"_id": "v1..2"})), "_id"), Some("v1..2".into()));
    }
}
