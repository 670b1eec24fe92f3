//! Safeform Core: Field Model, Rule Shapes, and Templates
//!
//! Shared vocabulary for the safety event form logic: field definitions,
//! the two rule models, the live value map, and the template aggregate
//! with its lifecycle and persistence port.

pub mod error;
pub mod field;
pub mod rule;
pub mod store;
pub mod template;
pub mod value;

pub use error::{StoreError, TemplateError};
pub use field::{
    is_permanent_required, Field, FieldOption, FieldPatch, FieldType, FieldValidation,
    ValueShape, PERMANENT_REQUIRED_FIELDS,
};
pub use rule::{
    BuilderRule, LegacyAction, LegacyCondition, LegacyRule, Operator, RuleAction,
    TemplateLogic, WhenOp,
};
pub use store::{InMemoryTemplateStore, TemplateStore};
pub use template::{Template, TemplateStatus};
pub use value::Values;
