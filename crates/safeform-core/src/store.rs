//! Persistence port for templates
//!
//! Orchestration code that owns templates talks to storage through
//! [`TemplateStore`]; the engines never see it.
use std::collections::BTreeMap;

use crate::error::StoreError;
use crate::template::Template;

/// Key-value persistence of template aggregates.
pub trait TemplateStore {
    /// Load a template by id. `Ok(None)` when nothing is stored under it.
    fn load(&self, id: &str) -> Result<Option<Template>, StoreError>;

    /// Insert or replace a template.
    fn save(&mut self, template: &Template) -> Result<(), StoreError>;

    /// Remove a template. Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;

    /// Every stored template, skipping entries that fail to decode.
    fn list(&self) -> Result<Vec<Template>, StoreError>;
}

const KEY_PREFIX: &str = "template:";

fn key_for(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Store holding serialized JSON strings, like a browser key-value store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTemplateStore {
    entries: BTreeMap<String, String>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a raw entry, bypassing serialization.
    pub fn insert_raw(&mut self, id: &str, raw: impl Into<String>) {
        self.entries.insert(key_for(id), raw.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TemplateStore for InMemoryTemplateStore {
    fn load(&self, id: &str) -> Result<Option<Template>, StoreError> {
        let key = key_for(id);
        match self.entries.get(&key) {
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|source| StoreError::Corrupt { key, source }),
            None => Ok(None),
        }
    }

    fn save(&mut self, template: &Template) -> Result<(), StoreError> {
        let raw = serde_json::to_string(template)?;
        self.entries.insert(key_for(&template.id), raw);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(&key_for(id)).is_some())
    }

    fn list(&self) -> Result<Vec<Template>, StoreError> {
        let mut templates = Vec::with_capacity(self.entries.len());
        for (key, raw) in &self.entries {
            match serde_json::from_str::<Template>(raw) {
                Ok(template) => templates.push(template),
                Err(err) => tracing::warn!(key = %key, error = %err, "skipping corrupt template entry"),
            }
        }
        Ok(templates)
    }
}
