//! Argument coercion shared by every action
//!
//! Only JSON numbers count as numeric; numeric strings fall back to the
//! default like any other non-number.

use dfumt_common::DispatchError;
use serde_json::{Map, Value};

pub type Arguments = Map<String, Value>;

/// Finite number under `key`, or `default`
pub fn number(args: &Arguments, key: &str, default: f64) -> f64 {
    args.get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

/// Rounded number under `key`, floored at 1
pub fn integer(args: &Arguments, key: &str, default: usize) -> usize {
    let raw = number(args, key, default as f64).round();
    if raw < 1.0 {
        1
    } else {
        raw as usize
    }
}

/// [`integer`] that rejects values above `max`
pub fn bounded_integer(
    args: &Arguments,
    key: &str,
    default: usize,
    max: usize,
) -> Result<usize, DispatchError> {
    let value = integer(args, key, default);
    if value > max {
        return Err(DispatchError::InvalidArgument {
            argument: key.to_string(),
            reason: format!("must be at most {}, got {}", max, value),
        });
    }
    Ok(value)
}

/// Array under `key`, truncated to `max_len`; non-numeric elements become 0.
///
/// A missing or non-array value yields an empty vector.
pub fn vector(args: &Arguments, key: &str, max_len: usize) -> Vec<f64> {
    match args.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .take(max_len)
            .map(|item| item.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn string<'a>(args: &'a Arguments, key: &str, default: &'a str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Present and not null
pub fn is_present(args: &Arguments, key: &str) -> bool {
    args.get(key).map_or(false, |v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_fallbacks() {
        let a = args(json!({"x": 2.5, "s": "3", "b": true}));
        assert_eq!(number(&a, "x", 0.0), 2.5);
        assert_eq!(number(&a, "s", 7.0), 7.0);
        assert_eq!(number(&a, "b", 7.0), 7.0);
        assert_eq!(number(&a, "missing", -1.0), -1.0);
    }

    #[test]
    fn test_integer_rounds_and_floors_at_one() {
        let a = args(json!({"up": 2.5, "down": 2.4, "neg": -3, "zero": 0}));
        assert_eq!(integer(&a, "up", 1), 3);
        assert_eq!(integer(&a, "down", 1), 2);
        assert_eq!(integer(&a, "neg", 5), 1);
        assert_eq!(integer(&a, "zero", 5), 1);
        assert_eq!(integer(&a, "missing", 4), 4);
        assert_eq!(integer(&a, "missing", 0), 1);
    }

    #[test]
    fn test_bounded_integer() {
        let a = args(json!({"small": 8, "huge": 1e19, "neg": -4}));
        assert_eq!(bounded_integer(&a, "small", 1, 8), Ok(8));
        assert_eq!(bounded_integer(&a, "neg", 1, 8), Ok(1));
        assert_eq!(bounded_integer(&a, "missing", 5, 8), Ok(5));
        let err = bounded_integer(&a, "huge", 1, 8).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::InvalidArgument { ref argument, .. } if argument == "huge"
        ));
    }

    #[test]
    fn test_vector_truncates_and_zeroes() {
        let a = args(json!({"v": [1, "two", null, 4.5, 5, 6], "n": 3}));
        assert_eq!(vector(&a, "v", 4), vec![1.0, 0.0, 0.0, 4.5]);
        assert!(vector(&a, "n", 4).is_empty());
        assert!(vector(&a, "missing", 4).is_empty());
    }

    #[test]
    fn test_presence() {
        let a = args(json!({"x": null, "y": 0}));
        assert!(!is_present(&a, "x"));
        assert!(is_present(&a, "y"));
        assert!(!is_present(&a, "z"));
    }

    proptest! {
        #[test]
        fn prop_vector_never_exceeds_limit(
            items in proptest::collection::vec(-1e9f64..1e9, 0..64),
            max_len in 1usize..32,
        ) {
            let a = args(json!({ "v": &items }));
            let out = vector(&a, "v", max_len);
            prop_assert_eq!(out.len(), items.len().min(max_len));
        }

        #[test]
        fn prop_integer_at_least_one(raw in -1e6f64..1e6) {
            let a = args(json!({ "n": raw }));
            prop_assert!(integer(&a, "n", 3) >= 1);
        }
    }
}
