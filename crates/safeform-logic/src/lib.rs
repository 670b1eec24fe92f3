//! Safeform Logic: Conditional Rule Engines
//!
//! Evaluates a template's rules against the live value map and produces
//! which fields are visible, which are required, and (legacy rules only)
//! which values should be forced.
//!
//! # Architecture
//!
//! ```text
//! Template ──┬─ Legacy rules  ─→ evaluate_legacy  ─┐
//!            └─ Builder rules ─→ evaluate_builder ─┴→ LogicOutput → validator / renderer
//!                        ↑                ↑
//!                   evaluate_condition (shared)
//! ```
//!
//! Both engines keep their own precedence semantics:
//!
//! * legacy: phased HIDE → SET_VALUE → SHOW → REQUIRE/OPTIONAL, then the
//!   three permanent fields are forced visible and required;
//! * builder: hide/optional on core fields are dropped while collecting,
//!   and hidden fields are always optional.
//!
//! # Example
//!
//! ```
//! use safeform_core::{Field, FieldType, LegacyRule, Operator, RuleAction, Values};
//! use safeform_logic::evaluate_legacy;
//! use serde_json::json;
//!
//! let fields = vec![
//!     Field::new("medical", "Medical attention", FieldType::Checkbox),
//!     Field::new("hospital", "Hospital", FieldType::Text).hidden(),
//! ];
//! let rules = vec![LegacyRule::new("medical")
//!     .when("medical", Operator::Equals, json!(true))
//!     .then(RuleAction::Show, "hospital")
//!     .then(RuleAction::Require, "hospital")];
//!
//! let mut values = Values::new();
//! values.insert("medical".to_string(), json!(true));
//!
//! let output = evaluate_legacy(&rules, &values, &fields);
//! assert!(output.is_visible("hospital"));
//! assert!(output.is_required("hospital"));
//! ```

pub mod apply;
pub mod builder;
pub mod condition;
pub mod legacy;
pub mod output;

pub use apply::{apply_set_values, AppliedValues};
pub use builder::{evaluate_builder, validate_rules, IssueSeverity, RuleIssue};
pub use condition::evaluate_condition;
pub use legacy::{evaluate_legacy, validate_logic_rules};
pub use output::{FieldState, LogicOutput};

use safeform_core::{Template, TemplateLogic, Values};

/// Evaluate a template with whichever engine its rule model calls for.
pub fn evaluate_template(template: &Template, values: &Values) -> LogicOutput {
    match &template.logic {
        TemplateLogic::Legacy { rules } => evaluate_legacy(rules, values, template.fields()),
        TemplateLogic::Builder { rules } => {
            evaluate_builder(template.fields(), rules, values, &template.core_field_ids)
        }
    }
}
