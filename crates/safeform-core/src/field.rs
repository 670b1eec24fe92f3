//! Field model shared by the engines, the validator, and the status gate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ids that the legacy engine keeps required and visible no matter what
/// the rules say.
pub const PERMANENT_REQUIRED_FIELDS: [&str; 3] = ["title", "dateTime", "description"];

/// Whether `id` is one of the [`PERMANENT_REQUIRED_FIELDS`].
pub fn is_permanent_required(id: &str) -> bool {
    PERMANENT_REQUIRED_FIELDS.contains(&id)
}

/// Closed set of field types a template may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Textarea,
    Number,
    #[serde(alias = "date_time", alias = "dateTime")]
    Datetime,
    Dropdown,
    Radio,
    #[serde(alias = "boolean")]
    Checkbox,
    Multiselect,
    File,
    Signature,
    #[serde(alias = "location")]
    Gps,
    BodyDiagram,
    SceneDiagram,
    Sketch,
}

/// Runtime shape of a field's value.
///
/// Every comparison operator dispatches on this rather than on the raw
/// field type, so each operator has exactly one behaviour per shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// `true`/`false`, compared after `"true"`/`"1"` coercion.
    Boolean,
    /// Array of option values; equality means membership.
    Multi,
    /// Floating-point number.
    Numeric,
    /// Free text, compared as strings.
    Text,
    /// Objects (GPS, diagrams, signatures, files); compared by string coercion.
    Structured,
}

impl FieldType {
    /// Dispatch table from field type to value shape.
    pub fn shape(self) -> ValueShape {
        match self {
            FieldType::Checkbox => ValueShape::Boolean,
            FieldType::Multiselect => ValueShape::Multi,
            FieldType::Number => ValueShape::Numeric,
            FieldType::Text
            | FieldType::Textarea
            | FieldType::Datetime
            | FieldType::Dropdown
            | FieldType::Radio => ValueShape::Text,
            FieldType::File
            | FieldType::Signature
            | FieldType::Gps
            | FieldType::BodyDiagram
            | FieldType::SceneDiagram
            | FieldType::Sketch => ValueShape::Structured,
        }
    }

    /// Free-text fields, the only ones where substring operators make sense.
    pub fn is_text_like(self) -> bool {
        matches!(self, FieldType::Text | FieldType::Textarea)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number)
    }

    /// Choice fields that cannot be activated without options.
    pub fn needs_options(self) -> bool {
        matches!(self, FieldType::Dropdown | FieldType::Multiselect)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Number => "number",
            FieldType::Datetime => "datetime",
            FieldType::Dropdown => "dropdown",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Multiselect => "multiselect",
            FieldType::File => "file",
            FieldType::Signature => "signature",
            FieldType::Gps => "gps",
            FieldType::BodyDiagram => "body_diagram",
            FieldType::SceneDiagram => "scene_diagram",
            FieldType::Sketch => "sketch",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option of a dropdown, radio, or multiselect field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Optional value constraints checked by the field validator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValidation {
    /// Regex the string value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Numeric lower bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Numeric upper bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Minimum string length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum string length in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Allowed MIME patterns (`image/png` or `image/*`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,

    /// Maximum size of a single file in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,

    /// Maximum number of files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
}

/// A single form field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Stable identifier, unique within a template
    pub id: String,

    /// Human-readable name, also used in validation messages
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Static required flag; logic may override it at evaluation time
    #[serde(default)]
    pub required: bool,

    /// Static visibility (legacy model only)
    #[serde(default = "default_true")]
    pub visible: bool,

    /// Protected field: rules may never hide it or make it optional
    #[serde(default, alias = "core")]
    pub locked: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<FieldValidation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Field {
    pub fn new(id: impl Into<String>, label: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            field_type,
            required: false,
            visible: true,
            locked: false,
            options: Vec::new(),
            validation: None,
            help_text: None,
            placeholder: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    pub fn with_option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(FieldOption::new(value, label));
        self
    }

    pub fn with_validation(mut self, validation: FieldValidation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn with_help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    /// Shape of this field's runtime value
    pub fn shape(&self) -> ValueShape {
        self.field_type.shape()
    }
}

/// Partial update applied by [`Template::update_field`](crate::template::Template::update_field).
///
/// `None` leaves the property untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default, rename = "type")]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub visible: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<FieldOption>>,
    #[serde(default)]
    pub validation: Option<FieldValidation>,
}

impl FieldPatch {
    /// Properties a core field refuses to change.
    pub(crate) fn protected_changes(&self, field: &Field) -> Vec<&'static str> {
        let mut changes = Vec::new();
        if self.required.is_some_and(|r| r != field.required) {
            changes.push("required");
        }
        if self.field_type.is_some_and(|t| t != field.field_type) {
            changes.push("type");
        }
        changes
    }

    pub(crate) fn apply(self, field: &mut Field) {
        if let Some(label) = self.label {
            field.label = label;
        }
        if let Some(help) = self.help_text {
            field.help_text = Some(help);
        }
        if let Some(placeholder) = self.placeholder {
            field.placeholder = Some(placeholder);
        }
        if let Some(required) = self.required {
            field.required = required;
        }
        if let Some(field_type) = self.field_type {
            field.field_type = field_type;
        }
        if let Some(visible) = self.visible {
            field.visible = visible;
        }
        if let Some(options) = self.options {
            field.options = options;
        }
        if let Some(validation) = self.validation {
            field.validation = Some(validation);
        }
    }
}
