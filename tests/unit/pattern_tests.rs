//! Unit tests for naming rules: anchoring, renames and forward idempotence

use proptest::prelude::*;
use spec_migrate::TestingMode;
use spec_migrate::models::ManualReason;
use spec_migrate::services::pattern::{NamingRule, RuleSet, SPEC_EXTENSIONS};

fn default_e2e() -> NamingRule {
    NamingRule::compile(TestingMode::E2e, "cypress/integration").unwrap()
}

fn default_component() -> NamingRule {
    NamingRule::compile(TestingMode::Component, "cypress/component").unwrap()
}

#[test]
fn integration_spec_renames_to_e2e_folder() {
    let rule = NamingRule::new(TestingMode::E2e, "integration", "e2e", false).unwrap();
    let m = rule.match_path("integration/login.spec.js").unwrap();
    assert_eq!(m.main, "login");
    assert_eq!(m.marker.as_deref(), Some(".spec"));
    assert_eq!(m.extension, ".js");
    assert_eq!(rule.rename(&m), "e2e/login.cy.js");
}

#[test]
fn custom_integration_folder_stays_in_place() {
    let rule = NamingRule::compile(TestingMode::E2e, "tests/e2e-legacy").unwrap();
    assert_eq!(rule.after_root(), "tests/e2e-legacy");
    let m = rule.match_path("tests/e2e-legacy/cart_spec.ts").unwrap();
    assert_eq!(rule.rename(&m), "tests/e2e-legacy/cart.cy.ts");
}

#[test]
fn component_specs_need_a_marker() {
    let rule = default_component();
    assert!(rule.match_path("cypress/component/Button.tsx").is_none());
    assert_eq!(
        rule.mismatch_reason("cypress/component/Button.tsx"),
        ManualReason::MissingSpecMarker
    );
    let m = rule.match_path("cypress/component/Button.spec.tsx").unwrap();
    assert_eq!(rule.rename(&m), "cypress/component/Button.cy.tsx");
}

#[test]
fn unsupported_extension_is_reported() {
    let rule = default_e2e();
    assert!(rule.match_path("cypress/integration/weird.txt").is_none());
    assert_eq!(
        rule.mismatch_reason("cypress/integration/weird.txt"),
        ManualReason::UnsupportedExtension
    );
    assert_eq!(
        rule.mismatch_reason("cypress/integration/README"),
        ManualReason::UnsupportedExtension
    );
}

#[test]
fn migrated_names_are_recognized() {
    let rule = default_component();
    assert!(rule.is_migrated("cypress/component/Card.cy.jsx"));
    assert!(!rule.is_migrated("cypress/component/Card.spec.jsx"));
}

#[test]
fn segments_concatenate_to_paths() {
    let rule = default_e2e();
    let m = rule.match_path("cypress/integration/admin/users_spec.ts").unwrap();

    let before: String = rule.before_segments(&m).iter().map(|s| s.text.as_str()).collect();
    let after: String = rule.after_segments(&m).iter().map(|s| s.text.as_str()).collect();
    assert_eq!(before, "cypress/integration/admin/users_spec.ts");
    assert_eq!(after, "cypress/e2e/admin/users.cy.ts");

    let highlighted: Vec<_> = rule
        .after_segments(&m)
        .into_iter()
        .filter(|s| s.highlight)
        .map(|s| s.text)
        .collect();
    assert_eq!(highlighted, vec!["e2e/".to_string(), ".cy.ts".to_string()]);
}

#[test]
fn component_rule_is_skipped_when_disabled() {
    let config = spec_migrate::services::config::parse_legacy(r#"{"componentFolder": false}"#).unwrap();
    let rules = RuleSet::compile(&config).unwrap();
    assert!(rules.component.is_none());
    assert!(rules.for_mode(TestingMode::Component).is_none());
    assert_eq!(rules.for_mode(TestingMode::E2e).unwrap().before_root(), "cypress/integration");
}

fn main_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,8}(/[a-z][a-z0-9_-]{0,8}){0,2}"
}

fn marker() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some(".spec")), Just(Some("_spec"))]
}

fn extension() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SPEC_EXTENSIONS.to_vec())
}

proptest! {
    #[test]
    fn e2e_rename_is_forward_idempotent(main in main_name(), marker in marker(), ext in extension()) {
        for rule in [default_e2e(), NamingRule::compile(TestingMode::E2e, "tests").unwrap()] {
            let path = format!("{}/{main}{}.{ext}", rule.before_root(), marker.unwrap_or(""));
            let m = rule.match_path(&path);
            prop_assert!(m.is_some(), "{} should match", path);
            let renamed = rule.rename(&m.unwrap());

            let suffix = format!(".cy.{ext}");
            prop_assert!(renamed.ends_with(&suffix), "{} lacks {}", renamed, suffix);
            prop_assert!(rule.match_path(&renamed).is_none(), "{} matched again", renamed);
            prop_assert!(rule.is_migrated(&renamed));
        }
    }

    #[test]
    fn component_rename_is_forward_idempotent(
        main in main_name(),
        marker in prop_oneof![Just(".spec"), Just("_spec")],
        ext in extension(),
    ) {
        let rule = default_component();
        let path = format!("cypress/component/{main}{marker}.{ext}");
        let m = rule.match_path(&path).unwrap();
        let renamed = rule.rename(&m);

        prop_assert_eq!(&renamed, &format!("cypress/component/{main}.cy.{ext}"));
        prop_assert!(rule.match_path(&renamed).is_none());
    }

    #[test]
    fn paths_outside_the_legacy_folder_never_match(main in main_name(), ext in extension()) {
        let rule = default_e2e();
        let outside = format!("cypress/fixtures/{main}.spec.{ext}");
        prop_assert!(rule.match_path(&outside).is_none());
    }
}
