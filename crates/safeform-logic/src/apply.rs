//! Applying forced values from the legacy engine
//!
//! Engine output is advisory. The caller applies forced values to its own
//! value map, except on fields locked by a static or QR prefill, which are
//! reported back as ignored.

use std::collections::BTreeMap;

use safeform_core::Values;
use serde::Serialize;
use serde_json::Value;

/// Result of applying forced values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedValues {
    /// The value map with forced values applied
    pub values: Values,
    /// Ids whose value was changed
    pub applied: Vec<String>,
    /// Ids skipped because a prefill locked them
    pub ignored: Vec<String>,
}

/// Apply `set_values` onto a copy of `values`, skipping `locked_ids`.
pub fn apply_set_values<S: AsRef<str>>(
    values: &Values,
    set_values: &BTreeMap<String, Value>,
    locked_ids: &[S],
) -> AppliedValues {
    let mut result = AppliedValues {
        values: values.clone(),
        ..Default::default()
    };

    for (id, value) in set_values {
        if locked_ids.iter().any(|l| l.as_ref() == id) {
            tracing::debug!(field = %id, "forced value ignored on prefilled field");
            result.ignored.push(id.clone());
            continue;
        }
        if result.values.get(id) != Some(value) {
            result.values.insert(id.clone(), value.clone());
            result.applied.push(id.clone());
        }
    }

    result
}
