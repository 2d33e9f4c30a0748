//! Document representation shared by repositories and stores.

use crate::errors::{ErrorKind, RepoError, RepoResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A stored document: a JSON object keyed by field name.
pub type Document = serde_json::Map<String, Value>;

/// Separator for nested field paths (`"address.city"`).
pub const FIELD_SEPARATOR: char = '.';

/// Converts a value into a document.
///
/// Fails with `ObjectMappingError` when the value does not serialize to a
/// JSON object.
pub fn to_document<T: Serialize>(value: &T) -> RepoResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            log::error!("Expected an object while converting to document, found {}", other);
            Err(RepoError::new(
                "Value does not serialize to a document",
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}

/// Converts a document back into a typed value.
pub fn from_document<T: DeserializeOwned>(document: Document) -> RepoResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Looks up a possibly nested field.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split(FIELD_SEPARATOR);
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Orders two scalar values of the same family.
///
/// Numbers compare numerically regardless of their integer/float encoding.
/// Values of different families are unordered.
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total order over any two values, used for sorting.
///
/// Types rank `null < number < string < bool < array < object`; values of
/// the same type compare as in [`compare_values`], arrays and objects
/// element by element.
pub fn total_order(left: &Value, right: &Value) -> Ordering {
    let by_type = type_rank(left).cmp(&type_rank(right));
    if by_type != Ordering::Equal {
        return by_type;
    }
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b)
            .map(|(a, b)| total_order(a, b))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(a), Value::Object(b)) => a
            .iter()
            .zip(b)
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| total_order(va, vb)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        _ => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Equality with numeric normalization; structured values compare structurally.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match compare_values(left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}
