//! Conditional logic rule shapes
//!
//! Two rule models coexist: the legacy `when`/`then` rules evaluated in
//! ordered phases, and the flat single-condition rules produced by the
//! template builder. A template carries exactly one of them
//! ([`TemplateLogic`]).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Comparison operator of a condition.
///
/// Covers both vocabularies. Unrecognized names deserialize into
/// [`Operator::Unknown`], which never matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    IsEmpty,
    IsNotEmpty,
    Contains,
    DoesNotContain,
    IsOneOf,
    IsNotOneOf,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    /// Legacy numeric-only `gt`
    Gt,
    /// Legacy numeric-only `lt`
    Lt,
    /// Legacy array membership
    In,
    Unknown(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name {
            "equals" | "eq" => Operator::Equals,
            "not_equals" | "ne" => Operator::NotEquals,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            "contains" => Operator::Contains,
            "does_not_contain" => Operator::DoesNotContain,
            "is_one_of" => Operator::IsOneOf,
            "is_not_one_of" => Operator::IsNotOneOf,
            "greater_than" => Operator::GreaterThan,
            "less_than" => Operator::LessThan,
            "greater_than_or_equal" => Operator::GreaterThanOrEqual,
            "less_than_or_equal" => Operator::LessThanOrEqual,
            "gt" => Operator::Gt,
            "lt" => Operator::Lt,
            "in" => Operator::In,
            other => Operator::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::IsOneOf => "is_one_of",
            Operator::IsNotOneOf => "is_not_one_of",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterThanOrEqual => "greater_than_or_equal",
            Operator::LessThanOrEqual => "less_than_or_equal",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::In => "in",
            Operator::Unknown(name) => name,
        }
    }

    /// Everything except the two emptiness checks compares against an operand.
    pub fn requires_value(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::LessThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThanOrEqual
                | Operator::Gt
                | Operator::Lt
        )
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Operator::Contains | Operator::DoesNotContain)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Operator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Operator::parse(&name))
    }
}

/// Effect of a matching rule on its target field.
///
/// `SetValue` only exists in the legacy model. Unrecognized names
/// deserialize into [`RuleAction::Unknown`] and are skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleAction {
    Show,
    Hide,
    Require,
    Optional,
    SetValue,
    Unknown(String),
}

impl RuleAction {
    pub fn parse(name: &str) -> Self {
        match name {
            "show" => RuleAction::Show,
            "hide" => RuleAction::Hide,
            "require" => RuleAction::Require,
            "optional" => RuleAction::Optional,
            "setValue" | "set_value" => RuleAction::SetValue,
            other => RuleAction::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RuleAction::Show => "show",
            RuleAction::Hide => "hide",
            RuleAction::Require => "require",
            RuleAction::Optional => "optional",
            RuleAction::SetValue => "setValue",
            RuleAction::Unknown(name) => name,
        }
    }

    /// Hiding or relaxing a field, which core fields refuse.
    pub fn weakens(&self) -> bool {
        matches!(self, RuleAction::Hide | RuleAction::Optional)
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RuleAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RuleAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(RuleAction::parse(&name))
    }
}

/// How the conditions of a legacy rule combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhenOp {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

/// One condition of a legacy rule's `when` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCondition {
    pub field_id: String,
    pub op: Operator,
    #[serde(default)]
    pub value: Value,
}

/// One action of a legacy rule's `then` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAction {
    pub action: RuleAction,
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Multi-condition, multi-action rule evaluated by the phased engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRule {
    pub id: String,
    #[serde(default)]
    pub when: Vec<LegacyCondition>,
    #[serde(default)]
    pub when_op: WhenOp,
    #[serde(default)]
    pub then: Vec<LegacyAction>,
}

impl LegacyRule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            when: Vec::new(),
            when_op: WhenOp::And,
            then: Vec::new(),
        }
    }

    pub fn when(mut self, field_id: impl Into<String>, op: Operator, value: Value) -> Self {
        self.when.push(LegacyCondition {
            field_id: field_id.into(),
            op,
            value,
        });
        self
    }

    pub fn any(mut self) -> Self {
        self.when_op = WhenOp::Or;
        self
    }

    pub fn then(mut self, action: RuleAction, target_id: impl Into<String>) -> Self {
        self.then.push(LegacyAction {
            action,
            target_id: target_id.into(),
            value: None,
        });
        self
    }

    pub fn then_set(mut self, target_id: impl Into<String>, value: Value) -> Self {
        self.then.push(LegacyAction {
            action: RuleAction::SetValue,
            target_id: target_id.into(),
            value: Some(value),
        });
        self
    }
}

/// Single-condition, single-action rule authored in the template builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderRule {
    pub id: String,
    pub trigger_field_id: String,
    pub operator: Operator,
    /// String or string array; absent for the emptiness operators
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    pub action: RuleAction,
    pub target_field_id: String,
}

impl BuilderRule {
    pub fn new(
        id: impl Into<String>,
        trigger_field_id: impl Into<String>,
        operator: Operator,
        value: Option<Value>,
        action: RuleAction,
        target_field_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            trigger_field_id: trigger_field_id.into(),
            operator,
            value,
            action,
            target_field_id: target_field_id.into(),
        }
    }

    /// Whether the rule mentions `field_id` as trigger or target
    pub fn references(&self, field_id: &str) -> bool {
        self.trigger_field_id == field_id || self.target_field_id == field_id
    }
}

/// The rule set of a template, in one of the two models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum TemplateLogic {
    Legacy { rules: Vec<LegacyRule> },
    Builder { rules: Vec<BuilderRule> },
}

impl Default for TemplateLogic {
    fn default() -> Self {
        TemplateLogic::Builder { rules: Vec::new() }
    }
}

impl TemplateLogic {
    pub fn rule_count(&self) -> usize {
        match self {
            TemplateLogic::Legacy { rules } => rules.len(),
            TemplateLogic::Builder { rules } => rules.len(),
        }
    }
}
