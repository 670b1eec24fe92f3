//! Condition evaluator shared by both rule engines.
//!
//! Decides whether one `(operator, expected, actual)` triple matches. Every
//! operator dispatches on the field's [`ValueShape`]; anything that cannot
//! be compared fails closed (returns `false`) rather than erroring.

use safeform_core::value::{
    coerce_to_bool, coerce_to_list, coerce_to_number, coerce_to_string, is_empty_value,
};
use safeform_core::{FieldType, Operator, ValueShape};
use serde_json::Value;

/// Evaluate a single condition.
///
/// `field_type` is the trigger field's type when known; without it the
/// value is compared as text.
pub fn evaluate_condition(
    op: &Operator,
    expected: Option<&Value>,
    actual: Option<&Value>,
    field_type: Option<FieldType>,
) -> bool {
    let shape = field_type.map(FieldType::shape).unwrap_or(ValueShape::Text);

    match op {
        Operator::Equals => equals(shape, expected, actual),
        Operator::NotEquals => !equals(shape, expected, actual),
        Operator::IsEmpty => is_empty(shape, actual),
        Operator::IsNotEmpty => !is_empty(shape, actual),
        Operator::Contains => contains(expected, actual),
        Operator::DoesNotContain => !contains(expected, actual),
        Operator::IsOneOf => is_one_of(shape, expected, actual),
        Operator::IsNotOneOf => !is_one_of(shape, expected, actual),
        Operator::GreaterThan => compare(expected, actual, |a, e| a > e),
        Operator::LessThan => compare(expected, actual, |a, e| a < e),
        Operator::GreaterThanOrEqual => compare(expected, actual, |a, e| a >= e),
        Operator::LessThanOrEqual => compare(expected, actual, |a, e| a <= e),
        Operator::Gt => compare_strict(expected, actual, |a, e| a > e),
        Operator::Lt => compare_strict(expected, actual, |a, e| a < e),
        Operator::In => member_of(expected, actual),
        Operator::Unknown(_) => false,
    }
}

fn equals(shape: ValueShape, expected: Option<&Value>, actual: Option<&Value>) -> bool {
    match shape {
        // Only the expected side follows the "true"/"1" convention; the
        // actual value must already be a boolean.
        ValueShape::Boolean => actual.and_then(Value::as_bool) == Some(coerce_to_bool(expected)),
        ValueShape::Multi => {
            let needle = coerce_to_string(expected);
            coerce_to_list(actual).iter().any(|item| *item == needle)
        }
        ValueShape::Numeric | ValueShape::Text | ValueShape::Structured => {
            coerce_to_string(actual) == coerce_to_string(expected)
        }
    }
}

fn is_empty(shape: ValueShape, actual: Option<&Value>) -> bool {
    match shape {
        ValueShape::Multi => coerce_to_list(actual).is_empty() || is_empty_value(actual),
        _ => is_empty_value(actual),
    }
}

fn contains(expected: Option<&Value>, actual: Option<&Value>) -> bool {
    let haystack = coerce_to_string(actual).to_lowercase();
    let needle = coerce_to_string(expected).to_lowercase();
    haystack.contains(&needle)
}

/// Comma-separated string or array, trimmed, blanks dropped.
fn option_set(expected: Option<&Value>) -> Vec<String> {
    let raw = match expected {
        Some(Value::Array(items)) => items.iter().map(|v| coerce_to_string(Some(v))).collect(),
        Some(other) => coerce_to_string(Some(other))
            .split(',')
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    };
    raw.into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_one_of(shape: ValueShape, expected: Option<&Value>, actual: Option<&Value>) -> bool {
    let set = option_set(expected);
    match shape {
        ValueShape::Multi => coerce_to_list(actual).iter().any(|item| set.contains(item)),
        _ => {
            if is_empty_value(actual) {
                return false;
            }
            set.contains(&coerce_to_string(actual))
        }
    }
}

fn compare(expected: Option<&Value>, actual: Option<&Value>, cmp: fn(f64, f64) -> bool) -> bool {
    match (coerce_to_number(actual), coerce_to_number(expected)) {
        (Some(a), Some(e)) => cmp(a, e),
        _ => false,
    }
}

/// Legacy `gt`/`lt`: both sides must already be JSON numbers.
fn compare_strict(
    expected: Option<&Value>,
    actual: Option<&Value>,
    cmp: fn(f64, f64) -> bool,
) -> bool {
    match (actual.and_then(Value::as_f64), expected.and_then(Value::as_f64)) {
        (Some(a), Some(e)) => cmp(a, e),
        _ => false,
    }
}

/// Legacy `in`: expected must be an array holding the actual value.
fn member_of(expected: Option<&Value>, actual: Option<&Value>) -> bool {
    match (expected, actual) {
        (Some(Value::Array(items)), Some(actual)) => items.contains(actual),
        _ => false,
    }
}
