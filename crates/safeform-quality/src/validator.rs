//! Field validator. Pure logic over the engine's output.
//!
//! Checks run in a fixed order and stop at the first failure:
//! visibility skip → required → empty skip → pattern → numeric bounds →
//! length bounds → file constraints.

use std::collections::HashMap;
use std::sync::Mutex;

use lazy_static::lazy_static;
use regex::Regex;
use safeform_core::value::is_empty_value;
use safeform_core::{is_permanent_required, Field, FieldType, FieldValidation, Values};
use safeform_logic::{FieldState, LogicOutput};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hard cap on attachments per file field.
pub const MAX_FILES: usize = 20;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Distinct patterns kept compiled before the cache is reset.
const PATTERN_CACHE_LIMIT: usize = 256;

lazy_static! {
    /// Compiled field patterns; `None` marks a pattern that failed to compile.
    static ref PATTERNS: Mutex<HashMap<String, Option<Regex>>> = Mutex::new(HashMap::new());
}

/// A failed check on one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_id: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &Field, message: impl Into<String>) -> Self {
        Self {
            field_id: field.id.clone(),
            message: message.into(),
        }
    }
}

/// Every field error of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValidation {
    pub errors: Vec<FieldError>,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_for(&self, field_id: &str) -> Option<&FieldError> {
        self.errors.iter().find(|e| e.field_id == field_id)
    }
}

/// An uploaded file as the rendering layer describes it.
#[derive(Debug, Clone, PartialEq)]
struct FileDescriptor {
    name: String,
    mime_type: String,
    /// Bytes; `None` when absent or not a number
    size: Option<f64>,
}

impl FileDescriptor {
    /// Read a descriptor leniently. Only a non-object is rejected outright.
    fn from_value(raw: &Value) -> Option<Self> {
        let object = raw.as_object()?;
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            name: text("name").unwrap_or_default(),
            mime_type: text("type").or_else(|| text("mimeType")).unwrap_or_default(),
            size: object.get("size").and_then(coerce_size),
        })
    }
}

fn coerce_size(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|size| size.is_finite() && *size >= 0.0)
}

/// Validate one field (on blur). Returns at most one error.
pub fn validate_field(field: &Field, value: Option<&Value>, state: FieldState) -> Option<FieldError> {
    if !state.visible && !is_permanent_required(&field.id) {
        return None;
    }

    let empty = is_empty_value(value);
    if state.required && empty {
        return Some(FieldError::new(field, format!("{} is required", field.label)));
    }
    if empty {
        return None;
    }

    let value = value?;
    let rules = field.validation.as_ref();

    if let Some(rules) = rules {
        if let Some(message) = check_pattern(field, rules, value)
            .or_else(|| check_numeric(field, rules, value))
            .or_else(|| check_length(field, rules, value))
        {
            return Some(FieldError::new(field, message));
        }
    }

    if field.field_type == FieldType::File {
        if let Value::Array(files) = value {
            return check_files(field, rules, files).map(|message| FieldError::new(field, message));
        }
    }

    None
}

/// Validate every field of a form (on submit), collecting all errors.
pub fn validate_form(fields: &[Field], values: &Values, output: &LogicOutput) -> FormValidation {
    let errors = fields
        .iter()
        .filter_map(|field| validate_field(field, values.get(&field.id), output.state_of(field)))
        .collect::<Vec<_>>();

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "form validation failed");
    }
    FormValidation { errors }
}

/// Compile `pattern` once and reuse it on every later check.
fn compiled_pattern(field: &Field, pattern: &str) -> Option<Regex> {
    let mut cache = PATTERNS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(cached) = cache.get(pattern) {
        return cached.clone();
    }

    let compiled = match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(err) => {
            tracing::warn!(field = %field.id, error = %err, "ignoring invalid validation pattern");
            None
        }
    };
    if cache.len() >= PATTERN_CACHE_LIMIT {
        cache.clear();
    }
    cache.insert(pattern.to_string(), compiled.clone());
    compiled
}

fn check_pattern(field: &Field, rules: &FieldValidation, value: &Value) -> Option<String> {
    let (pattern, text) = (rules.pattern.as_deref()?, value.as_str()?);
    let re = compiled_pattern(field, pattern)?;
    if re.is_match(text) {
        None
    } else {
        Some(format!("{} format is invalid", field.label))
    }
}

fn check_numeric(field: &Field, rules: &FieldValidation, value: &Value) -> Option<String> {
    let number = value.as_f64()?;
    if let Some(min) = rules.min {
        if number < min {
            return Some(format!("{} must be at least {}", field.label, min));
        }
    }
    if let Some(max) = rules.max {
        if number > max {
            return Some(format!("{} must be at most {}", field.label, max));
        }
    }
    None
}

fn check_length(field: &Field, rules: &FieldValidation, value: &Value) -> Option<String> {
    let length = value.as_str()?.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            return Some(format!("{} must be at least {} characters", field.label, min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Some(format!("{} must be at most {} characters", field.label, max));
        }
    }
    None
}

/// `image/*` matches any image type; anything else must match exactly.
fn mime_matches(pattern: &str, mime: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(major) => mime
            .split_once('/')
            .is_some_and(|(m, _)| m.eq_ignore_ascii_case(major)),
        None => pattern.eq_ignore_ascii_case(mime),
    }
}

fn check_files(field: &Field, rules: Option<&FieldValidation>, files: &[Value]) -> Option<String> {
    if files.len() > MAX_FILES {
        return Some(format!("Maximum {MAX_FILES} files allowed"));
    }
    let Some(files) = files
        .iter()
        .map(FileDescriptor::from_value)
        .collect::<Option<Vec<_>>>()
    else {
        tracing::debug!(field = %field.id, "rejecting malformed file descriptor");
        return Some(format!("{} contains an invalid file", field.label));
    };

    let rules = rules?;
    if let Some(max_files) = rules.max_files.filter(|m| *m < MAX_FILES) {
        if files.len() > max_files {
            return Some(format!("Maximum {max_files} files allowed"));
        }
    }

    for file in &files {
        if let Some(allowed) = rules.allowed_types.as_ref().filter(|a| !a.is_empty()) {
            if !allowed.iter().any(|p| mime_matches(p, &file.mime_type)) {
                return Some(format!(
                    "File type {} is not allowed. Allowed types: {}",
                    file.mime_type,
                    allowed.join(", ")
                ));
            }
        }
        if let Some(max_size) = rules.max_size {
            let mb = (max_size as f64 / BYTES_PER_MB).round();
            match file.size {
                Some(size) if size <= max_size as f64 => {}
                Some(_) => {
                    return Some(format!(
                        "File \"{}\" exceeds maximum size of {}MB",
                        file.name, mb
                    ));
                }
                None => return Some(format!("File \"{}\" has an invalid size", file.name)),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SHOWN: FieldState = FieldState {
        visible: true,
        required: false,
    };
    const SHOWN_REQUIRED: FieldState = FieldState {
        visible: true,
        required: true,
    };
    const HIDDEN_REQUIRED: FieldState = FieldState {
        visible: false,
        required: true,
    };

    fn number_field(min: Option<f64>, max: Option<f64>) -> Field {
        Field::new("estimatedDamageCost", "Estimated damage cost", FieldType::Number).with_validation(
            FieldValidation {
                min,
                max,
                ..Default::default()
            },
        )
    }

    fn file_field(validation: FieldValidation) -> Field {
        Field::new("photos", "Photos", FieldType::File).with_validation(validation)
    }

    #[test]
    fn test_hidden_field_skips_validation() {
        let field = Field::new("hospital", "Hospital", FieldType::Text).required();
        assert_eq!(validate_field(&field, None, HIDDEN_REQUIRED), None);
    }

    #[test]
    fn test_hidden_permanent_field_still_validated() {
        let field = Field::new("title", "Title", FieldType::Text).required();
        let error = validate_field(&field, Some(&json!("")), HIDDEN_REQUIRED).unwrap();
        assert_eq!(error.message, "Title is required");
    }

    #[test]
    fn test_required_empty_values() {
        let field = Field::new("witnesses", "Witnesses", FieldType::Multiselect);
        for value in [Value::Null, json!(""), json!([])] {
            let error = validate_field(&field, Some(&value), SHOWN_REQUIRED).unwrap();
            assert_eq!(error.message, "Witnesses is required");
        }
        assert!(validate_field(&field, None, SHOWN_REQUIRED).is_some());
    }

    #[test]
    fn test_empty_optional_passes_constraints() {
        let field = Field::new("code", "Code", FieldType::Text).with_validation(FieldValidation {
            pattern: Some("^[A-Z]{3}$".to_string()),
            min_length: Some(3),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&json!("")), SHOWN), None);
    }

    #[test]
    fn test_pattern() {
        let field = Field::new("code", "Site code", FieldType::Text).with_validation(FieldValidation {
            pattern: Some("^[A-Z]{3}-\\d+$".to_string()),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&json!("ABC-12")), SHOWN), None);
        let error = validate_field(&field, Some(&json!("abc")), SHOWN).unwrap();
        assert_eq!(error.message, "Site code format is invalid");
    }

    #[test]
    fn test_pattern_compiled_once() {
        let pattern = "^INC-[0-9]{6}$";
        let field = Field::new("ref", "Reference", FieldType::Text).with_validation(FieldValidation {
            pattern: Some(pattern.to_string()),
            ..Default::default()
        });

        assert_eq!(validate_field(&field, Some(&json!("INC-000123")), SHOWN), None);
        assert!(PATTERNS.lock().unwrap().get(pattern).is_some_and(Option::is_some));

        let error = validate_field(&field, Some(&json!("INC-12")), SHOWN).unwrap();
        assert_eq!(error.message, "Reference format is invalid");
    }

    #[test]
    fn test_invalid_pattern_passes() {
        let field = Field::new("code", "Code", FieldType::Text).with_validation(FieldValidation {
            pattern: Some("([".to_string()),
            ..Default::default()
        });
        assert_eq!(validate_field(&field, Some(&json!("anything")), SHOWN), None);
    }

    #[test]
    fn test_damage_cost_maximum() {
        let field = number_field(None, Some(100000.0));

        let error = validate_field(&field, Some(&json!(150000)), SHOWN).unwrap();
        assert!(error.message.contains("must be at most 100000"));
        assert_eq!(error.field_id, "estimatedDamageCost");

        assert_eq!(validate_field(&field, Some(&json!(50000)), SHOWN), None);
    }

    #[test]
    fn test_min_checked_before_max() {
        let field = number_field(Some(10.0), Some(5.0));
        let error = validate_field(&field, Some(&json!(7)), SHOWN).unwrap();
        assert_eq!(error.message, "Estimated damage cost must be at least 10");
    }

    #[test]
    fn test_numeric_bounds_ignore_strings() {
        let field = number_field(Some(10.0), None);
        assert_eq!(validate_field(&field, Some(&json!("3")), SHOWN), None);
    }

    #[test]
    fn test_length_bounds() {
        let field = Field::new("summary", "Summary", FieldType::Textarea).with_validation(
            FieldValidation {
                min_length: Some(5),
                max_length: Some(10),
                ..Default::default()
            },
        );
        let short = validate_field(&field, Some(&json!("abc")), SHOWN).unwrap();
        assert_eq!(short.message, "Summary must be at least 5 characters");
        let long = validate_field(&field, Some(&json!("abcdefghijk")), SHOWN).unwrap();
        assert_eq!(long.message, "Summary must be at most 10 characters");
        assert_eq!(validate_field(&field, Some(&json!("ñandú!")), SHOWN), None);
    }

    #[test]
    fn test_file_count_cap() {
        let field = file_field(FieldValidation::default());
        let files: Vec<Value> = (0..21)
            .map(|i| json!({"name": format!("{i}.png"), "type": "image/png", "size": 10}))
            .collect();
        let error = validate_field(&field, Some(&Value::Array(files)), SHOWN).unwrap();
        assert_eq!(error.message, "Maximum 20 files allowed");
    }

    #[test]
    fn test_file_mime_patterns() {
        let field = file_field(FieldValidation {
            allowed_types: Some(vec!["image/*".to_string(), "application/pdf".to_string()]),
            ..Default::default()
        });
        let ok = json!([
            {"name": "a.jpg", "type": "image/jpeg", "size": 1},
            {"name": "b.pdf", "type": "application/pdf", "size": 1}
        ]);
        assert_eq!(validate_field(&field, Some(&ok), SHOWN), None);

        let bad = json!([
            {"name": "a.jpg", "type": "image/jpeg", "size": 1},
            {"name": "c.exe", "type": "application/x-msdownload", "size": 1}
        ]);
        let error = validate_field(&field, Some(&bad), SHOWN).unwrap();
        assert_eq!(
            error.message,
            "File type application/x-msdownload is not allowed. Allowed types: image/*, application/pdf"
        );
    }

    #[test]
    fn test_file_size() {
        let field = file_field(FieldValidation {
            max_size: Some(5 * 1024 * 1024),
            ..Default::default()
        });
        let files = json!([
            {"name": "small.png", "type": "image/png", "size": 1024},
            {"name": "huge.mov", "type": "video/quicktime", "size": 6 * 1024 * 1024}
        ]);
        let error = validate_field(&field, Some(&files), SHOWN).unwrap();
        assert_eq!(error.message, "File \"huge.mov\" exceeds maximum size of 5MB");
    }

    #[test]
    fn test_loose_file_descriptors_still_checked() {
        let field = file_field(FieldValidation {
            allowed_types: Some(vec!["image/*".to_string()]),
            max_size: Some(1024),
            ..Default::default()
        });

        let float_size = json!([{"name": "evil.exe", "type": "application/x-msdownload", "size": 99999999.0}]);
        let error = validate_field(&field, Some(&float_size), SHOWN).unwrap();
        assert!(error.message.starts_with("File type application/x-msdownload is not allowed"));

        let big_float = json!([{"name": "wide.png", "type": "image/png", "size": 6291456.0}]);
        let error = validate_field(&field, Some(&big_float), SHOWN).unwrap();
        assert_eq!(error.message, "File \"wide.png\" exceeds maximum size of 0MB");

        for size in [Value::Null, json!(-5), json!("lots")] {
            let files = json!([{"name": "a.png", "type": "image/png", "size": size}]);
            let error = validate_field(&field, Some(&files), SHOWN).unwrap();
            assert_eq!(error.message, "File \"a.png\" has an invalid size");
        }

        let string_size = json!([{"name": "a.png", "mimeType": "image/png", "size": "512"}]);
        assert_eq!(validate_field(&field, Some(&string_size), SHOWN), None);
    }

    #[test]
    fn test_non_object_file_rejected() {
        let field = file_field(FieldValidation::default());
        for files in [json!(["evil.exe"]), json!([null]), json!([42])] {
            let error = validate_field(&field, Some(&files), SHOWN).unwrap();
            assert_eq!(error.message, "Photos contains an invalid file");
        }
    }

    #[test]
    fn test_validate_form_collects_all_errors() {
        let fields = vec![
            Field::new("title", "Title", FieldType::Text).required(),
            number_field(None, Some(100000.0)),
            Field::new("hospital", "Hospital", FieldType::Text).required(),
        ];
        let mut output = LogicOutput::default();
        output.visibility.insert("hospital".to_string(), false);

        let values: Values = [("estimatedDamageCost".to_string(), json!(200000))]
            .into_iter()
            .collect();

        let report = validate_form(&fields, &values, &output);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 2);
        assert!(report.error_for("title").is_some());
        assert!(report.error_for("estimatedDamageCost").is_some());
        assert!(report.error_for("hospital").is_none());
    }
}
