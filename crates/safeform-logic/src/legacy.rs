//! Legacy phased engine
//!
//! Evaluates multi-condition, multi-action `when`/`then` rules in four
//! fixed phases so that rule order never decides a conflict:
//!
//! ```text
//! init → HIDE → SET_VALUE → SHOW → REQUIRE/OPTIONAL → permanent fields
//!          ↓                   ↓            ↓
//!    hidden set         skips hidden   require set wins
//! ```

use std::collections::{HashMap, HashSet};

use safeform_core::{
    is_permanent_required, Field, LegacyAction, LegacyRule, RuleAction, Values, WhenOp,
    PERMANENT_REQUIRED_FIELDS,
};

use crate::condition::evaluate_condition;
use crate::output::LogicOutput;

/// Whether a legacy rule's `when` clause holds against `values`.
///
/// An empty clause holds under AND and fails under OR.
pub fn rule_matches(rule: &LegacyRule, values: &Values, fields: &HashMap<&str, &Field>) -> bool {
    let check = |cond: &safeform_core::LegacyCondition| {
        let field_type = fields.get(cond.field_id.as_str()).map(|f| f.field_type);
        evaluate_condition(&cond.op, Some(&cond.value), values.get(&cond.field_id), field_type)
    };

    match rule.when_op {
        WhenOp::And => rule.when.iter().all(check),
        WhenOp::Or => rule.when.iter().any(check),
    }
}

fn actions_of<'a>(
    fired: &'a [&'a LegacyAction],
    kind: RuleAction,
) -> impl Iterator<Item = &'a LegacyAction> + 'a {
    fired.iter().copied().filter(move |a| a.action == kind)
}

/// Evaluate legacy rules into visibility, required, and forced-value maps.
pub fn evaluate_legacy(rules: &[LegacyRule], values: &Values, fields: &[Field]) -> LogicOutput {
    let by_id: HashMap<&str, &Field> = fields.iter().map(|f| (f.id.as_str(), f)).collect();

    let mut output = LogicOutput::default();
    for field in fields {
        output.visibility.insert(field.id.clone(), field.visible);
        output.required.insert(field.id.clone(), field.required);
    }

    // Each rule's `when` is evaluated once; all phases share the result.
    let fired: Vec<&LegacyAction> = rules
        .iter()
        .filter(|rule| rule_matches(rule, values, &by_id))
        .flat_map(|rule| rule.then.iter())
        .collect();

    // Phase 1: HIDE
    let mut hidden: HashSet<&str> = HashSet::new();
    for action in actions_of(&fired, RuleAction::Hide) {
        output.visibility.insert(action.target_id.clone(), false);
        hidden.insert(action.target_id.as_str());
    }

    // Phase 2: SET_VALUE, regardless of visibility
    for action in actions_of(&fired, RuleAction::SetValue) {
        let value = action.value.clone().unwrap_or_default();
        output.set_values.insert(action.target_id.clone(), value);
    }

    // Phase 3: SHOW, except where a hide fired
    for action in actions_of(&fired, RuleAction::Show) {
        if hidden.contains(action.target_id.as_str()) {
            tracing::debug!(target_id = %action.target_id, "show suppressed by hide");
            continue;
        }
        output.visibility.insert(action.target_id.clone(), true);
    }

    // Phase 4: REQUIRE beats OPTIONAL
    let required: HashSet<&str> = actions_of(&fired, RuleAction::Require)
        .map(|a| a.target_id.as_str())
        .collect();
    for id in &required {
        output.required.insert(id.to_string(), true);
    }
    for action in actions_of(&fired, RuleAction::Optional) {
        if !required.contains(action.target_id.as_str()) {
            output.required.insert(action.target_id.clone(), false);
        }
    }

    for id in PERMANENT_REQUIRED_FIELDS {
        output.required.insert(id.to_string(), true);
        output.visibility.insert(id.to_string(), true);
    }

    tracing::trace!(
        rules = rules.len(),
        fired = fired.len(),
        hidden = hidden.len(),
        "legacy logic evaluated"
    );
    output
}

/// Warn about hide actions aimed at permanently required fields.
///
/// Non-fatal: evaluation already turns such hides into no-ops.
pub fn validate_logic_rules(rules: &[LegacyRule]) -> Vec<String> {
    rules
        .iter()
        .flat_map(|rule| {
            rule.then
                .iter()
                .filter(|a| a.action == RuleAction::Hide && is_permanent_required(&a.target_id))
                .map(move |a| {
                    format!(
                        "Rule \"{}\" attempts to hide permanently required field \"{}\"; the field will remain visible and required",
                        rule.id, a.target_id
                    )
                })
        })
        .collect()
}
