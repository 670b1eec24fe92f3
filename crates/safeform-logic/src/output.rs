//! Engine output shared by both engines
use safeform_core::Field;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Visibility, required-ness, and (legacy only) forced values per field.
///
/// Always recomputed from scratch; nothing carries over between evaluations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicOutput {
    pub visibility: BTreeMap<String, bool>,
    pub required: BTreeMap<String, bool>,
    /// Advisory: the rendering layer decides whether to apply them
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set_values: BTreeMap<String, Value>,
}

/// Computed visibility and required-ness of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldState {
    pub visible: bool,
    pub required: bool,
}

impl FieldState {
    pub fn new(visible: bool, required: bool) -> Self {
        Self { visible, required }
    }
}

impl LogicOutput {
    /// Fields absent from the map count as visible.
    pub fn is_visible(&self, id: &str) -> bool {
        self.visibility.get(id).copied().unwrap_or(true)
    }

    /// Fields absent from the map count as optional.
    pub fn is_required(&self, id: &str) -> bool {
        self.required.get(id).copied().unwrap_or(false)
    }

    /// State of `field`, falling back to its static flags when the engine
    /// produced nothing for it.
    pub fn state_of(&self, field: &Field) -> FieldState {
        FieldState {
            visible: self.visibility.get(&field.id).copied().unwrap_or(field.visible),
            required: self.required.get(&field.id).copied().unwrap_or(field.required),
        }
    }

    /// Ids currently visible, in map order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &str> {
        self.visibility
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(id, _)| id.as_str())
    }
}
