//! Template aggregate: ordered fields, one rule model, lifecycle status.
//!
//! Field-editing operations guard the core fields: they cannot be removed,
//! and their `required` flag and type are frozen. Labels, help text, and
//! other presentational properties stay editable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TemplateError;
use crate::field::{Field, FieldPatch, FieldType, PERMANENT_REQUIRED_FIELDS};
use crate::rule::TemplateLogic;

/// Lifecycle state of a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateStatus {
    #[default]
    Draft,
    Active,
    Archived,
}

impl TemplateStatus {
    /// Allowed edges of the lifecycle graph. Staying put is a no-op.
    pub fn can_transition_to(self, to: TemplateStatus) -> bool {
        use TemplateStatus::*;
        matches!(
            (self, to),
            (Draft, Active)
                | (Draft, Archived)
                | (Active, Draft)
                | (Active, Archived)
                | (Archived, Draft)
        ) || self == to
    }
}

impl fmt::Display for TemplateStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TemplateStatus::Draft => write!(f, "draft"),
            TemplateStatus::Active => write!(f, "active"),
            TemplateStatus::Archived => write!(f, "archived"),
        }
    }
}

fn default_core_field_ids() -> Vec<String> {
    PERMANENT_REQUIRED_FIELDS.iter().map(|id| id.to_string()).collect()
}

/// A safety event report template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TemplateStatus,
    /// Edited only through the field operations below
    #[serde(default)]
    fields: Vec<Field>,
    #[serde(default)]
    pub logic: TemplateLogic,
    /// Protected ids handed to the builder engine
    #[serde(default = "default_core_field_ids")]
    pub core_field_ids: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Create an empty draft
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            status: TemplateStatus::Draft,
            fields: Vec::new(),
            logic: TemplateLogic::default(),
            core_field_ids: default_core_field_ids(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a draft seeded with the locked title, date-time, and
    /// description fields.
    pub fn with_core_fields(name: impl Into<String>) -> Self {
        let mut template = Self::new(name);
        template.fields = vec![
            Field::new("title", "Title", FieldType::Text).required().locked(),
            Field::new("dateTime", "Date & Time", FieldType::Datetime)
                .required()
                .locked(),
            Field::new("description", "Description", FieldType::Textarea)
                .required()
                .locked(),
        ];
        template
    }

    pub fn with_logic(mut self, logic: TemplateLogic) -> Self {
        self.logic = logic;
        self
    }

    /// Fields in display order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Locked in its definition or listed as a core id.
    pub fn is_core(&self, id: &str) -> bool {
        self.core_field_ids.iter().any(|c| c == id)
            || self.field(id).is_some_and(|f| f.locked)
    }

    /// Append a field; ids must stay unique.
    pub fn add_field(&mut self, field: Field) -> Result<(), TemplateError> {
        if self.field(&field.id).is_some() {
            return Err(TemplateError::DuplicateField(field.id));
        }
        self.fields.push(field);
        self.touch();
        Ok(())
    }

    /// Remove a non-core field. Builder rules that mention it go with it.
    pub fn remove_field(&mut self, id: &str) -> Result<Field, TemplateError> {
        let index = self.position(id)?;
        if self.is_core(id) {
            return Err(TemplateError::ProtectedField {
                field: id.to_string(),
                reason: "it cannot be removed".to_string(),
            });
        }

        let removed = self.fields.remove(index);
        if let TemplateLogic::Builder { rules } = &mut self.logic {
            let before = rules.len();
            rules.retain(|rule| !rule.references(id));
            let dropped = before - rules.len();
            if dropped > 0 {
                tracing::debug!(field = id, dropped, "dropped rules referencing removed field");
            }
        }
        self.touch();
        Ok(removed)
    }

    /// Apply a partial edit. Core fields reject changes to `required` and type.
    pub fn update_field(&mut self, id: &str, patch: FieldPatch) -> Result<(), TemplateError> {
        let index = self.position(id)?;
        if self.is_core(id) {
            let frozen = patch.protected_changes(&self.fields[index]);
            if !frozen.is_empty() {
                return Err(TemplateError::ProtectedField {
                    field: id.to_string(),
                    reason: format!("{} cannot be changed", frozen.join(" and ")),
                });
            }
        }
        patch.apply(&mut self.fields[index]);
        self.touch();
        Ok(())
    }

    /// Move a field to `index`, clamped to the end of the list.
    pub fn move_field(&mut self, id: &str, index: usize) -> Result<(), TemplateError> {
        let from = self.position(id)?;
        let field = self.fields.remove(from);
        let to = index.min(self.fields.len());
        self.fields.insert(to, field);
        self.touch();
        Ok(())
    }

    /// Move along the lifecycle graph without any content checks.
    ///
    /// Activation should go through the status gate, which checks the
    /// template before calling this.
    pub fn transition(&mut self, to: TemplateStatus) -> Result<(), TemplateError> {
        if !self.status.can_transition_to(to) {
            return Err(TemplateError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        if self.status != to {
            tracing::info!(template = %self.id, from = %self.status, to = %to, "template status changed");
            self.status = to;
            self.touch();
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let template: Self =
            serde_json::from_str(json).map_err(|e| TemplateError::Parse(e.to_string()))?;
        template.check_unique_ids()
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, TemplateError> {
        let template: Self =
            serde_yaml::from_str(yaml).map_err(|e| TemplateError::Parse(e.to_string()))?;
        template.check_unique_ids()
    }

    pub fn to_json(&self) -> Result<String, TemplateError> {
        serde_json::to_string_pretty(self).map_err(|e| TemplateError::Serialize(e.to_string()))
    }

    fn position(&self, id: &str) -> Result<usize, TemplateError> {
        self.fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| TemplateError::FieldNotFound(id.to_string()))
    }

    fn check_unique_ids(self) -> Result<Self, TemplateError> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.fields.iter().find(|f| !seen.insert(f.id.as_str())) {
            return Err(TemplateError::DuplicateField(dup.id.clone()));
        }
        Ok(self)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
