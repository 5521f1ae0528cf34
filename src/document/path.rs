//! Dot-path helpers over documents.
//!
//! All mutation helpers either take `&mut` on an owned document or consume
//! and return one; none of them hand out references into nested values.

use serde_json::Value;
use thiserror::Error;

use super::Document;

/// Path errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("fieldName is not allowed to be empty")]
    Empty,
}

/// Splits a field path into its segments. The path is trimmed first.
pub fn split_path(path: &str) -> Result<Vec<&str>, PathError> {
    let path = path.trim();
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(path.split('.').collect())
}

/// Resolves a field path against a document.
///
/// Returns `None` when any segment is missing or when the value on the way
/// is `null`, so a stored `null` and an absent field look the same.
pub fn resolve<'a>(document: &'a Document, path: &str) -> Result<Option<&'a Value>, PathError> {
    let segments = split_path(path)?;
    let (head, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return Err(PathError::Empty),
    };

    let mut current = match document.get(*head) {
        Some(v) => v,
        None => return Ok(None),
    };
    for segment in rest {
        let next = match current {
            Value::Object(map) => map.get(*segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        current = match next {
            Some(v) => v,
            None => return Ok(None),
        };
    }

    if current.is_null() {
        Ok(None)
    } else {
        Ok(Some(current))
    }
}

/// Like [`resolve`] but clones the value, mapping a missing field to `null`.
pub fn resolve_owned(document: &Document, path: &str) -> Result<Value, PathError> {
    Ok(resolve(document, path)?.cloned().unwrap_or(Value::Null))
}

/// Builds `{a: {b: value}}` from `["a", "b"]`.
pub fn nest(segments: &[&str], value: Value) -> Value {
    segments.iter().rev().fold(value, |inner, segment| {
        let mut map = Document::new();
        map.insert((*segment).to_string(), inner);
        Value::Object(map)
    })
}

/// Writes `value` at `path`.
///
/// Existing objects along the path are descended into so that sibling keys
/// survive at every level. The first segment that is missing or not an
/// object is replaced by a freshly built nested structure.
pub fn set_path(document: &mut Document, path: &str, value: Value) -> Result<(), PathError> {
    let segments = split_path(path)?;
    set_segments(document, &segments, value);
    Ok(())
}

/// [`set_path`] for a path that was already split. An empty segment list
/// leaves the document untouched.
pub fn set_segments(map: &mut Document, segments: &[&str], value: Value) {
    let (head, rest) = match segments.split_first() {
        Some(parts) => parts,
        None => return,
    };
    if rest.is_empty() {
        map.insert((*head).to_string(), value);
        return;
    }
    match map.get_mut(*head) {
        Some(Value::Object(child)) => set_segments(child, rest, value),
        _ => {
            map.insert((*head).to_string(), nest(rest, value));
        }
    }
}

/// Returns the document with the leaf at `path` removed.
///
/// A top-level key spelled exactly like the full path (dots included) is
/// removed as well. Siblings of the removed leaf are untouched; a path that
/// does not exist leaves the document as it was.
pub fn without_path(mut document: Document, path: &str) -> Document {
    let path = path.trim();
    document.shift_remove(path);
    let segments: Vec<&str> = path.split('.').collect();
    if segments.len() > 1 {
        remove_in(&mut document, &segments);
    }
    document
}

fn remove_in(map: &mut Document, segments: &[&str]) {
    match segments {
        [] => {}
        [leaf] => {
            map.shift_remove(*leaf);
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(child)) = map.get_mut(*head) {
                remove_in(child, rest);
            }
        }
    }
}
