//! Live value map and coercion helpers
//!
//! Values arrive as JSON from the rendering layer; their runtime shape
//! depends on the field type. These helpers give every coercion a single
//! definition so comparison and validation agree on what "empty",
//! "numeric", and "as a string" mean.

use serde_json::Value;
use std::collections::HashMap;

/// `fieldId -> value`, rebuilt on every user edit.
pub type Values = HashMap<String, Value>;

/// Absent, null, `""`, or an empty array.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// String form of a value.
///
/// Whole numbers drop their fractional part, arrays are comma-joined, and
/// null or absent values become `""`.
pub fn coerce_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            Some(f) => f.to_string(),
            None => n.to_string(),
        },
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| coerce_to_string(Some(item)))
            .collect::<Vec<_>>()
            .join(","),
        Some(other @ Value::Object(_)) => other.to_string(),
    }
}

/// Numeric form of a value, or `None` when it does not parse.
pub fn coerce_to_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|f| !f.is_nan()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| !f.is_nan()),
        _ => None,
    }
}

/// Boolean form using the `"true"` / `"1"` convention.
pub fn coerce_to_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s == "true" || s == "1",
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Elements of an array value as strings; a scalar counts as one element.
pub fn coerce_to_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(|v| coerce_to_string(Some(v))).collect(),
        Some(other) => vec![coerce_to_string(Some(other))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(!is_empty_value(Some(&json!(" "))));
        assert!(!is_empty_value(Some(&json!(false))));
        assert!(!is_empty_value(Some(&json!(0))));
    }

    #[test]
    fn test_string_coercion() {
        assert_eq!(coerce_to_string(Some(&json!(5))), "5");
        assert_eq!(coerce_to_string(Some(&json!(5.0))), "5");
        assert_eq!(coerce_to_string(Some(&json!(2.5))), "2.5");
        assert_eq!(coerce_to_string(Some(&json!(true))), "true");
        assert_eq!(coerce_to_string(Some(&json!(["a", "b"]))), "a,b");
        assert_eq!(coerce_to_string(None), "");
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(coerce_to_number(Some(&json!("12.5"))), Some(12.5));
        assert_eq!(coerce_to_number(Some(&json!(" 3 "))), Some(3.0));
        assert_eq!(coerce_to_number(Some(&json!("abc"))), None);
        assert_eq!(coerce_to_number(Some(&json!("NaN"))), None);
        assert_eq!(coerce_to_number(Some(&json!(true))), None);
        assert_eq!(coerce_to_number(None), None);
    }

    #[test]
    fn test_bool_coercion() {
        assert!(coerce_to_bool(Some(&json!("1"))));
        assert!(coerce_to_bool(Some(&json!("true"))));
        assert!(!coerce_to_bool(Some(&json!("yes"))));
        assert!(!coerce_to_bool(None));
    }
}
