//! Deep-equality comparison between a captured sandbox value and a problem's
//! expectation.

use crate::problem::Expected;
use rhai::{Array, Dynamic, FnPtr, Map};
use serde_json::Value;

/// Decide whether the captured output satisfies the expectation.
///
/// Kind mismatches (expected an array, got a scalar, ...) simply compare as
/// unequal; nothing here can fail or panic.
pub fn compare(actual: &Dynamic, expected: &Expected) -> bool {
    match expected {
        Expected::Callable => is_callable(actual),
        Expected::Literal(value) => deep_eq(actual, value),
    }
}

/// Any function pointer or closure qualifies, regardless of arity, body, or
/// captured state.
pub fn is_callable(actual: &Dynamic) -> bool {
    actual.is::<FnPtr>()
}

fn deep_eq(actual: &Dynamic, expected: &Value) -> bool {
    match expected {
        Value::Null => actual.is_unit(),
        Value::Bool(b) => actual.as_bool().map(|a| a == *b).unwrap_or(false),
        Value::Number(n) => numbers_eq(actual, n),
        Value::String(s) => strings_eq(actual, s),
        Value::Array(items) => match actual.clone().try_cast::<Array>() {
            // Element-wise and order-sensitive.
            Some(arr) => {
                arr.len() == items.len()
                    && arr.iter().zip(items).all(|(a, e)| deep_eq(a, e))
            }
            None => false,
        },
        Value::Object(fields) => match actual.clone().try_cast::<Map>() {
            // Key set plus per-key equality; insertion order is irrelevant.
            Some(map) => {
                map.len() == fields.len()
                    && fields
                        .iter()
                        .all(|(k, e)| map.get(k.as_str()).is_some_and(|a| deep_eq(a, e)))
            }
            None => false,
        },
    }
}

/// Numeric equality over IEEE doubles: `-0 == +0`, and `NaN` never equals
/// anything, including itself. Exact integer pairs short-circuit without a
/// float round trip.
fn numbers_eq(actual: &Dynamic, expected: &serde_json::Number) -> bool {
    if let (Ok(a), Some(e)) = (actual.as_int(), expected.as_i64()) {
        return a == e;
    }
    let Some(e) = expected.as_f64() else {
        return false;
    };
    if let Ok(a) = actual.as_float() {
        return a == e;
    }
    if let Ok(a) = actual.as_int() {
        return a as f64 == e;
    }
    false
}

fn strings_eq(actual: &Dynamic, expected: &str) -> bool {
    if let Some(c) = actual.clone().try_cast::<char>() {
        let mut buf = [0u8; 4];
        return c.encode_utf8(&mut buf) == expected;
    }
    actual
        .clone()
        .into_immutable_string()
        .map(|s| s.as_str() == expected)
        .unwrap_or(false)
}
