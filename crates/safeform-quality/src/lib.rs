//! Safeform Quality: Submission Validation and Status Gate
//!
//! Two checks sit on either side of the rule engines:
//!
//! * [`validate_form`] runs at submit time against the engine's output and
//!   reports per-field errors (required, pattern, range, length, files);
//! * [`StatusGate`] runs at authoring time and blocks a draft template from
//!   going active while its fields or rules are broken.
//!
//! # Example
//!
//! ```
//! use safeform_core::{Field, FieldType, FieldValidation, Template, Values};
//! use safeform_logic::evaluate_template;
//! use safeform_quality::{validate_form, StatusGate};
//! use serde_json::json;
//!
//! let mut template = Template::with_core_fields("Incident report");
//! template
//!     .add_field(
//!         Field::new("cost", "Estimated cost", FieldType::Number).with_validation(FieldValidation {
//!             max: Some(100000.0),
//!             ..Default::default()
//!         }),
//!     )
//!     .unwrap();
//! StatusGate::new().activate(&mut template).unwrap();
//!
//! let mut values = Values::new();
//! values.insert("title".to_string(), json!("Forklift collision"));
//! values.insert("dateTime".to_string(), json!("2024-03-01T10:00"));
//! values.insert("description".to_string(), json!("Pallet struck racking"));
//! values.insert("cost".to_string(), json!(250000));
//!
//! let output = evaluate_template(&template, &values);
//! let result = validate_form(template.fields(), &values, &output);
//! assert!(!result.is_valid());
//! assert_eq!(
//!     result.error_for("cost").map(|e| e.message.as_str()),
//!     Some("Estimated cost must be at most 100000")
//! );
//! ```

pub mod gate;
pub mod validator;

pub use gate::{GateIssue, GateIssueKind, GateReport, StatusGate};
pub use validator::{validate_field, validate_form, FieldError, FormValidation, MAX_FILES};
