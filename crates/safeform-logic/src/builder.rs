//! Builder engine
//!
//! Evaluates the flat single-condition, single-action rules authored in the
//! template builder. Core-field protection happens while actions are
//! collected, and hidden fields are re-derived as optional on every pass.

use std::collections::{HashMap, HashSet};

use safeform_core::{BuilderRule, Field, RuleAction, Values};
use serde::{Deserialize, Serialize};

use crate::condition::evaluate_condition;
use crate::output::LogicOutput;

/// Target ids collected per action kind.
#[derive(Debug, Default)]
struct ActionSets<'a> {
    hide: HashSet<&'a str>,
    show: HashSet<&'a str>,
    require: HashSet<&'a str>,
    optional: HashSet<&'a str>,
}

/// Evaluate builder rules into visibility and required maps.
///
/// `hide` and `optional` actions aimed at `core_field_ids` or at a locked
/// field are dropped; `show` and `require` always apply.
pub fn evaluate_builder<S: AsRef<str>>(
    fields: &[Field],
    rules: &[BuilderRule],
    values: &Values,
    core_field_ids: &[S],
) -> LogicOutput {
    let by_id: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();
    let is_core = |id: &str| is_protected(id, &by_id, core_field_ids);

    let mut sets = ActionSets::default();
    for rule in rules {
        let field_type = by_id.get(rule.trigger_field_id.as_str()).map(|f| f.field_type);
        let matched = evaluate_condition(
            &rule.operator,
            rule.value.as_ref(),
            values.get(&rule.trigger_field_id),
            field_type,
        );
        if !matched {
            continue;
        }

        let target = rule.target_field_id.as_str();
        if rule.action.weakens() && is_core(target) {
            tracing::debug!(rule = %rule.id, target, action = %rule.action, "dropped action on core field");
            continue;
        }

        match rule.action {
            RuleAction::Hide => sets.hide.insert(target),
            RuleAction::Show => sets.show.insert(target),
            RuleAction::Require => sets.require.insert(target),
            RuleAction::Optional => sets.optional.insert(target),
            RuleAction::SetValue | RuleAction::Unknown(_) => continue,
        };
    }

    let mut output = LogicOutput::default();
    for field in fields {
        let id = field.id.as_str();

        // Hide is checked first. Builder fields start visible, so a show
        // target can only keep the default.
        let visible = !sets.hide.contains(id);

        let required = if !visible {
            false
        } else if sets.require.contains(id) {
            true
        } else if sets.optional.contains(id) {
            false
        } else {
            field.required
        };

        output.visibility.insert(field.id.clone(), visible);
        output.required.insert(field.id.clone(), required);
    }

    tracing::trace!(
        rules = rules.len(),
        hidden = sets.hide.len(),
        shown = sets.show.len(),
        "builder logic evaluated"
    );
    output
}

/// Listed as a core id or locked in its own definition.
fn is_protected<S: AsRef<str>>(id: &str, by_id: &HashMap<&str, &Field>, core_field_ids: &[S]) -> bool {
    core_field_ids.iter().any(|c| c.as_ref() == id) || by_id.get(id).is_some_and(|f| f.locked)
}

/// Severity of a rule lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

impl IssueSeverity {
    pub fn is_blocking(&self) -> bool {
        matches!(self, IssueSeverity::Error)
    }
}

/// One author-time finding about a builder rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIssue {
    pub severity: IssueSeverity,
    pub rule_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub message: String,
}

impl RuleIssue {
    fn error(rule: &BuilderRule, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            rule_id: rule.id.clone(),
            field_id: None,
            message: message.into(),
        }
    }

    fn warning(rule: &BuilderRule, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            ..Self::error(rule, message)
        }
    }

    fn on_field(mut self, field_id: &str) -> Self {
        self.field_id = Some(field_id.to_string());
        self
    }
}

fn value_missing(rule: &BuilderRule) -> bool {
    safeform_core::value::is_empty_value(rule.value.as_ref())
        || rule
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .is_some_and(|s| s.trim().is_empty())
}

/// Lint builder rules against the field list. Never affects evaluation.
pub fn validate_rules<S: AsRef<str>>(
    rules: &[BuilderRule],
    fields: &[Field],
    core_field_ids: &[S],
) -> Vec<RuleIssue> {
    let by_id: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();
    let is_core = |id: &str| is_protected(id, &by_id, core_field_ids);

    let mut issues = Vec::new();
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();

    for rule in rules {
        let trigger = by_id.get(rule.trigger_field_id.as_str());
        if trigger.is_none() {
            issues.push(
                RuleIssue::error(
                    rule,
                    format!("Trigger field \"{}\" does not exist", rule.trigger_field_id),
                )
                .on_field(&rule.trigger_field_id),
            );
        }
        if !by_id.contains_key(rule.target_field_id.as_str()) {
            issues.push(
                RuleIssue::error(
                    rule,
                    format!("Target field \"{}\" does not exist", rule.target_field_id),
                )
                .on_field(&rule.target_field_id),
            );
        }

        if rule.action.weakens() && is_core(&rule.target_field_id) {
            issues.push(
                RuleIssue::warning(
                    rule,
                    format!(
                        "Cannot {} core field \"{}\"; the action will be ignored",
                        rule.action, rule.target_field_id
                    ),
                )
                .on_field(&rule.target_field_id),
            );
        }

        if let RuleAction::Unknown(name) = &rule.action {
            issues.push(RuleIssue::error(rule, format!("Unknown action \"{name}\"")));
        } else if rule.action == RuleAction::SetValue {
            issues.push(RuleIssue::error(
                rule,
                "Builder rules cannot set values",
            ));
        }

        if let safeform_core::Operator::Unknown(name) = &rule.operator {
            issues.push(RuleIssue::error(rule, format!("Unknown operator \"{name}\"")));
        } else if rule.operator.requires_value() && value_missing(rule) {
            issues.push(RuleIssue::error(
                rule,
                format!("Operator \"{}\" requires a value", rule.operator),
            ));
        }

        if let Some(field) = trigger {
            if rule.operator.is_numeric() && !field.field_type.is_numeric() {
                issues.push(
                    RuleIssue::warning(
                        rule,
                        format!(
                            "Numeric operator \"{}\" used on {} field \"{}\"",
                            rule.operator, field.field_type, field.id
                        ),
                    )
                    .on_field(&field.id),
                );
            }
            if rule.operator.is_textual() && !field.field_type.is_text_like() {
                issues.push(
                    RuleIssue::warning(
                        rule,
                        format!(
                            "Text operator \"{}\" used on {} field \"{}\"",
                            rule.operator, field.field_type, field.id
                        ),
                    )
                    .on_field(&field.id),
                );
            }
        }

        // Same condition on the same target, whatever the action
        let key = (
            rule.trigger_field_id.clone(),
            rule.operator.to_string(),
            rule.value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            rule.target_field_id.clone(),
        );
        if !seen.insert(key) {
            issues.push(
                RuleIssue::warning(rule, "Duplicate rule: an identical rule already exists")
                    .on_field(&rule.target_field_id),
            );
        }
    }

    issues
}
