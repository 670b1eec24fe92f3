//! End-to-end flow: author a template, activate it through the gate,
//! persist it, then validate submissions against the engine output.

use safeform_core::{
    InMemoryTemplateStore, Template, TemplateError, TemplateLogic, TemplateStatus, TemplateStore,
    Values,
};
use safeform_logic::evaluate_template;
use safeform_quality::{validate_form, FormValidation, StatusGate};
use serde_json::{json, Value};

const FIXTURES_DIR: &str = "testing/fixtures/templates";

fn load(name: &str) -> Template {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    let yaml = std::fs::read_to_string(workspace_root.join(FIXTURES_DIR).join(name)).unwrap();
    Template::from_yaml(&yaml).unwrap()
}

fn base_values() -> Values {
    [
        ("title", json!("Forklift struck racking")),
        ("dateTime", json!("2024-05-14T09:30")),
        ("description", json!("Reversing forklift hit aisle 4 racking")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn with(mut values: Values, pairs: &[(&str, Value)]) -> Values {
    for (k, v) in pairs {
        values.insert(k.to_string(), v.clone());
    }
    values
}

fn submit(template: &Template, values: &Values) -> FormValidation {
    let output = evaluate_template(template, values);
    validate_form(template.fields(), values, &output)
}

fn message<'a>(result: &'a FormValidation, field: &str) -> Option<&'a str> {
    result.error_for(field).map(|e| e.message.as_str())
}

// =============================================================================
// Authoring
// =============================================================================

#[test]
fn test_legacy_template_activates_with_warning() {
    let mut template = load("incident-legacy.yaml");

    let report = StatusGate::new().activate(&mut template).unwrap();
    assert_eq!(template.status, TemplateStatus::Active);
    assert_eq!(report.warnings().count(), 1);
    assert!(report.can_activate());
}

#[test]
fn test_builder_template_blocked_until_rule_removed() {
    let mut template = load("hazard-builder.yaml");

    let err = StatusGate::new().activate(&mut template).unwrap_err();
    assert_eq!(err, TemplateError::ActivationBlocked(1));
    assert_eq!(template.status, TemplateStatus::Draft);

    if let TemplateLogic::Builder { rules } = &mut template.logic {
        rules.retain(|r| r.id != "relax-description");
    }
    let report = StatusGate::new().activate(&mut template).unwrap();
    assert!(report.issues.is_empty());
    assert_eq!(template.status, TemplateStatus::Active);
}

#[test]
fn test_removing_field_drops_its_rules_and_unblocks() {
    let mut template = load("hazard-builder.yaml");
    template.remove_field("chemicalName").unwrap();

    let TemplateLogic::Builder { rules } = &template.logic else {
        panic!("expected builder rules");
    };
    assert!(rules.iter().all(|r| !r.references("chemicalName")));
    assert_eq!(rules.len(), 3);
}

#[test]
fn test_store_round_trip() {
    let mut store = InMemoryTemplateStore::new();
    let mut template = load("incident-legacy.yaml");
    StatusGate::new().activate(&mut template).unwrap();
    store.save(&template).unwrap();
    store.save(&load("hazard-builder.yaml")).unwrap();
    store.insert_raw("broken", "{ not json");

    let loaded = store.load("incident-legacy").unwrap().unwrap();
    assert_eq!(loaded, template);
    assert!(store.load("broken").is_err());
    assert_eq!(store.list().unwrap().len(), 2);

    assert!(store.delete("hazard-builder").unwrap());
    assert!(!store.delete("hazard-builder").unwrap());
    assert!(store.load("hazard-builder").unwrap().is_none());
}

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_missing_permanent_fields() {
    let template = load("incident-legacy.yaml");
    let result = submit(&template, &with(Values::new(), &[("eventType", json!("near_miss"))]));

    assert_eq!(message(&result, "title"), Some("Title is required"));
    assert_eq!(message(&result, "dateTime"), Some("Date & Time is required"));
    assert_eq!(message(&result, "description"), Some("Description is required"));
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_injury_requires_body_parts() {
    let template = load("incident-legacy.yaml");

    let result = submit(&template, &with(base_values(), &[("eventType", json!("injury"))]));
    assert_eq!(message(&result, "bodyParts"), Some("Body parts affected is required"));

    let result = submit(
        &template,
        &with(base_values(), &[("eventType", json!("injury")), ("bodyParts", json!(["hand"]))]),
    );
    assert!(result.is_valid());
}

#[test]
fn test_hidden_required_field_skipped() {
    let template = load("incident-legacy.yaml");

    let result = submit(&template, &with(base_values(), &[("eventType", json!("near_miss"))]));
    assert!(result.is_valid());

    let result = submit(
        &template,
        &with(base_values(), &[("eventType", json!("near_miss")), ("medicalAttention", json!(true))]),
    );
    assert_eq!(message(&result, "hospitalName"), Some("Hospital name is required"));
}

#[test]
fn test_damage_cost_bounds() {
    let template = load("incident-legacy.yaml");
    let values = with(
        base_values(),
        &[("eventType", json!("property_damage")), ("estimatedDamageCost", json!(200000))],
    );

    let result = submit(&template, &values);
    assert_eq!(
        message(&result, "estimatedDamageCost"),
        Some("Estimated damage cost must be at most 100000")
    );

    let values = with(values, &[("estimatedDamageCost", json!(-5))]);
    assert_eq!(
        message(&submit(&template, &values), "estimatedDamageCost"),
        Some("Estimated damage cost must be at least 0")
    );
}

#[test]
fn test_sds_pattern_only_checked_when_visible() {
    let template = load("hazard-builder.yaml");
    let bad_sds = ("sdsReference", json!("SDS-12"));

    let result = submit(&template, &with(base_values(), &[("hazardType", json!("slip")), bad_sds.clone()]));
    assert!(result.is_valid());

    let result = submit(
        &template,
        &with(
            base_values(),
            &[("hazardType", json!("chemical")), ("chemicalName", json!("Acetone")), bad_sds],
        ),
    );
    assert_eq!(message(&result, "sdsReference"), Some("SDS reference format is invalid"));
}

#[test]
fn test_photo_constraints() {
    let template = load("hazard-builder.yaml");
    let photo = |name: &str, mime: &str, size: u64| json!({ "name": name, "type": mime, "size": size });
    let submit_photos = |photos: Value| {
        submit(
            &template,
            &with(base_values(), &[("peopleExposed", json!(1)), ("photos", photos)]),
        )
    };

    let result = submit_photos(json!([]));
    assert_eq!(message(&result, "photos"), Some("Photos is required"));

    let four = json!([
        photo("a.jpg", "image/jpeg", 1000),
        photo("b.jpg", "image/jpeg", 1000),
        photo("c.jpg", "image/jpeg", 1000),
        photo("d.jpg", "image/jpeg", 1000),
    ]);
    assert_eq!(message(&submit_photos(four), "photos"), Some("Maximum 3 files allowed"));

    let pdf = json!([photo("report.pdf", "application/pdf", 1000)]);
    assert_eq!(
        message(&submit_photos(pdf), "photos"),
        Some("File type application/pdf is not allowed. Allowed types: image/*")
    );

    let large = json!([photo("wide.png", "image/png", 6 * 1024 * 1024)]);
    assert_eq!(
        message(&submit_photos(large), "photos"),
        Some("File \"wide.png\" exceeds maximum size of 5MB")
    );

    let ok = json!([photo("spill.png", "image/png", 2 * 1024 * 1024)]);
    assert!(submit_photos(ok).is_valid());
}
