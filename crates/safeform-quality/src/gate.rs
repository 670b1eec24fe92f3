//! Template status gate
//!
//! Checks that a template's fields and rules are structurally sound before
//! it moves from draft to active. Errors block activation; warnings are
//! shown to the author but let it through.

use std::collections::HashSet;

use safeform_core::{BuilderRule, Template, TemplateError, TemplateLogic, TemplateStatus};
use safeform_logic::{validate_logic_rules, validate_rules, RuleIssue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateIssueKind {
    Error,
    Warning,
}

/// Single finding of the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateIssue {
    #[serde(rename = "type")]
    pub kind: GateIssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl GateIssue {
    pub fn error(field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind: GateIssueKind::Error,
            field: field.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn warning(field: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind: GateIssueKind::Warning,
            ..Self::error(field, message)
        }
    }
}

/// Everything the gate found on one template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateReport {
    pub issues: Vec<GateIssue>,
}

impl GateReport {
    pub fn errors(&self) -> impl Iterator<Item = &GateIssue> {
        self.issues.iter().filter(|i| i.kind == GateIssueKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GateIssue> {
        self.issues.iter().filter(|i| i.kind == GateIssueKind::Warning)
    }

    pub fn can_activate(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn summary(&self) -> String {
        let errors = self.errors().count();
        let warnings = self.warnings().count();
        if errors > 0 {
            format!("Blocked: {errors} error(s), {warnings} warning(s)")
        } else if warnings > 0 {
            format!("Ready with {warnings} warning(s)")
        } else {
            "Ready to activate".to_string()
        }
    }
}

/// Gate guarding the draft → active transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusGate;

impl StatusGate {
    pub fn new() -> Self {
        Self
    }

    /// Check a template without changing it.
    pub fn check(&self, template: &Template) -> GateReport {
        let mut issues = Vec::new();

        // === Template Checks ===
        if template.name.trim().is_empty() {
            issues.push(GateIssue::error(None, "Template name is required"));
        }
        if template.fields().is_empty() {
            issues.push(GateIssue::error(None, "Template must have at least one field"));
        }

        // === Field Checks ===
        let mut seen = HashSet::new();
        for field in template.fields() {
            if !seen.insert(field.id.as_str()) {
                issues.push(GateIssue::error(
                    Some(&field.id),
                    format!("Duplicate field id \"{}\"", field.id),
                ));
            }
            if field.label.trim().is_empty() {
                issues.push(GateIssue::error(
                    Some(&field.id),
                    format!("Field \"{}\" needs a label", field.id),
                ));
            }
            if field.field_type.needs_options() && field.options.is_empty() {
                issues.push(GateIssue::error(
                    Some(&field.id),
                    format!(
                        "{} field \"{}\" needs at least one option",
                        field.field_type,
                        display_name(&field.label, &field.id)
                    ),
                ));
            }
        }
        for core_id in &template.core_field_ids {
            if template.field(core_id).is_none() {
                issues.push(GateIssue::error(
                    Some(core_id),
                    format!("Core field \"{core_id}\" is missing"),
                ));
            }
        }

        // === Rule Checks ===
        match &template.logic {
            TemplateLogic::Builder { rules } => {
                for issue in validate_rules(rules, template.fields(), &template.core_field_ids) {
                    let kind = if issue.severity.is_blocking()
                        || weakens_protected_field(template, rules, &issue)
                    {
                        GateIssueKind::Error
                    } else {
                        GateIssueKind::Warning
                    };
                    issues.push(GateIssue {
                        kind,
                        field: issue.field_id,
                        message: format!("Rule {}: {}", issue.rule_id, issue.message),
                    });
                }
            }
            TemplateLogic::Legacy { rules } => {
                for rule in rules {
                    let referenced = rule
                        .when
                        .iter()
                        .map(|c| c.field_id.as_str())
                        .chain(rule.then.iter().map(|a| a.target_id.as_str()));
                    for id in referenced {
                        if template.field(id).is_none() {
                            issues.push(GateIssue::error(
                                Some(id),
                                format!("Rule {}: field \"{id}\" does not exist", rule.id),
                            ));
                        }
                    }
                }
                for warning in validate_logic_rules(rules) {
                    issues.push(GateIssue::warning(None, warning));
                }
            }
        }

        GateReport { issues }
    }

    /// Check the template and, when nothing blocks, mark it active.
    ///
    /// The report is returned on success so warnings can still be shown.
    pub fn activate(&self, template: &mut Template) -> Result<GateReport, TemplateError> {
        if !template.status.can_transition_to(TemplateStatus::Active) {
            return Err(TemplateError::InvalidTransition {
                from: template.status,
                to: TemplateStatus::Active,
            });
        }

        let report = self.check(template);
        if !report.can_activate() {
            let errors = report.errors().count();
            tracing::info!(template = %template.id, errors, "activation blocked");
            return Err(TemplateError::ActivationBlocked(errors));
        }

        template.transition(TemplateStatus::Active)?;
        Ok(report)
    }
}

fn display_name<'a>(label: &'a str, id: &'a str) -> &'a str {
    if label.trim().is_empty() {
        id
    } else {
        label
    }
}

/// The engine drops these actions, but an active template may not carry them.
fn weakens_protected_field(template: &Template, rules: &[BuilderRule], issue: &RuleIssue) -> bool {
    let Some(field_id) = issue.field_id.as_deref() else {
        return false;
    };
    template.is_core(field_id)
        && rules.iter().any(|r| {
            r.id == issue.rule_id && r.target_field_id == field_id && r.action.weakens()
        })
}
