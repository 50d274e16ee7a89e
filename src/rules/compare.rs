//! Structural comparisons behind the rule kinds.

use crate::core::error::ComparisonError;
use crate::core::types::Value;

/// Structural equality where lists compare as sets.
///
/// Maps compare key by key ignoring key order and numbers compare by
/// numeric value. Nested values use the same relaxed comparison.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(left), Value::List(right)) => {
            left.iter().all(|x| is_member(right, x)) && right.iter().all(|y| is_member(left, y))
        }
        (Value::Map(left), Value::Map(right)) => {
            left.len() == right.len()
                && left
                    .iter()
                    .all(|(k, v)| right.get(k).is_some_and(|other| loose_eq(v, other)))
        }
        _ => a == b,
    }
}

/// Whether `items` holds an element loosely equal to `item`.
pub fn is_member(items: &[Value], item: &Value) -> bool {
    items.iter().any(|x| loose_eq(x, item))
}

/// Membership / subset test between `actual` and `expected`.
pub fn contains(actual: &Value, expected: &Value) -> Result<bool, ComparisonError> {
    match (actual, expected) {
        // An absent collection contains nothing.
        (Value::Null, _) => Ok(false),
        (Value::List(items), Value::List(wanted)) => {
            Ok(wanted.iter().all(|w| is_member(items, w)))
        }
        (Value::List(items), item) => Ok(is_member(items, item)),
        (Value::Map(map), Value::Map(wanted)) => Ok(wanted
            .iter()
            .all(|(k, v)| map.get(k).is_some_and(|have| loose_eq(have, v)))),
        (Value::Map(map), Value::String(key)) => Ok(map.contains_key(key)),
        (Value::String(haystack), Value::String(needle)) => Ok(haystack.contains(needle.as_str())),
        _ => Err(ComparisonError::Incompatible {
            rule: "Contains",
            actual: actual.type_name(),
            expected: expected.type_name(),
        }),
    }
}
