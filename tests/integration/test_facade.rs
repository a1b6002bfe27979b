//! Integration tests for the migration facade: steps, gates and config edits

use crate::fixtures::{create_clean_project, create_default_project, create_legacy_project};
use spec_migrate::io::fs::{StdFs, TextConfigSource};
use spec_migrate::models::ManualReason;
use spec_migrate::services::test_files::SpecGlob;
use spec_migrate::{Error, MigrationFacade, MigrationOptions, MigrationStep};
use std::sync::Arc;
use tempfile::TempDir;

fn open(root: &std::path::Path) -> MigrationFacade {
    MigrationFacade::open_local(root, MigrationOptions::default()).unwrap()
}

fn open_with_text(root: &std::path::Path, text: &str) -> MigrationFacade {
    MigrationFacade::open(
        root,
        Arc::new(StdFs),
        Box::new(TextConfigSource(text.to_string())),
        MigrationOptions::default(),
    )
    .unwrap()
}

fn advance_to(facade: &mut MigrationFacade, step: MigrationStep) {
    while facade.current_step() < step {
        facade.advance().unwrap();
    }
}

#[test]
fn test_plan_reflects_project() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_default_project(temp_dir.path()).unwrap();
    let facade = open(&root);

    let plan = facade.plan().unwrap();
    assert_eq!(plan.before.len(), 4);
    assert_eq!(plan.before.len(), plan.after.len());
    assert_eq!(plan.manual_files, vec!["cypress/integration/notes.txt".to_string()]);
    assert_eq!(plan.integration_folder, "cypress/integration");
    assert_eq!(plan.component_folder, "cypress/component");
    assert!(plan.config_before_text.contains("\"baseUrl\": \"http://localhost:3000\""));
    assert!(plan.config_after_text.contains("baseUrl: 'http://localhost:3000',"));

    let (before, after) = plan.find_pair("cypress/integration/login.spec.js").unwrap();
    assert_eq!(before.display_name(), "cypress/integration/login.spec.js");
    assert_eq!(after.display_name(), "cypress/e2e/login.cy.js");
}

#[test]
fn test_walk_through_clean_project() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 3).unwrap();
    let mut facade = open(&root);

    assert_eq!(facade.current_step(), MigrationStep::Initialize);
    for expected in &MigrationStep::ALL[1..] {
        assert_eq!(facade.advance().unwrap(), *expected);
    }
    assert!(matches!(facade.advance(), Err(Error::InvalidTransition { .. })));

    assert_eq!(facade.go_back().unwrap(), MigrationStep::SetupComponent);
    assert_eq!(facade.set_step(MigrationStep::Complete).unwrap(), MigrationStep::Complete);
}

#[test]
fn test_parse_error_blocks_config_step() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 1).unwrap();
    let mut facade = open_with_text(&root, "{ \"video\": ");

    assert!(matches!(facade.config(), Err(Error::Parse(_))));
    assert!(matches!(facade.plan(), Err(Error::Parse(_))));

    assert_eq!(facade.advance().unwrap(), MigrationStep::ConfigFile);
    assert!(matches!(facade.advance(), Err(Error::Parse(_))));
    assert_eq!(facade.current_step(), MigrationStep::ConfigFile);

    facade.update_config("{\"video\": false}").unwrap();
    assert_eq!(facade.advance().unwrap(), MigrationStep::RenameAuto);
}

#[test]
fn test_unresolved_manual_files_block_manual_step() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_default_project(temp_dir.path()).unwrap();
    let mut facade = open(&root);

    advance_to(&mut facade, MigrationStep::RenameManual);
    match facade.advance() {
        Err(Error::StepBlocked { step, .. }) => assert_eq!(step, MigrationStep::RenameManual),
        other => panic!("expected blocked step, got {other:?}"),
    }
    assert!(!facade.step_machine().is_reachable(MigrationStep::SetupComponent));

    assert!(matches!(
        facade.mark_manual_resolved("cypress/integration/login.spec.js"),
        Err(Error::UnknownSpec(_))
    ));
    facade
        .mark_manual_resolved("cypress/integration/notes.txt")
        .unwrap();
    assert!(facade.unresolved_manual_files().unwrap().is_empty());
    assert_eq!(facade.advance().unwrap(), MigrationStep::SetupComponent);
}

#[test]
fn test_config_edit_after_complete_reopens_config_step() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 2).unwrap();
    let mut facade = open(&root);

    advance_to(&mut facade, MigrationStep::Complete);
    assert!(facade.step_machine().is_closed());

    facade.update_config(r#"{"video": false}"#).unwrap();

    assert_eq!(facade.current_step(), MigrationStep::ConfigFile);
    assert_eq!(facade.step_machine().furthest(), MigrationStep::ConfigFile);
    assert!(matches!(
        facade.set_step(MigrationStep::Complete),
        Err(Error::InvalidTransition { .. })
    ));
    assert!(facade.config_after_text().unwrap().contains("video: false,"));
}

#[test]
fn test_unchanged_config_keeps_progress() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 1).unwrap();
    let mut facade = open(&root);

    advance_to(&mut facade, MigrationStep::Complete);
    facade.reload_config().unwrap();
    assert_eq!(facade.current_step(), MigrationStep::Complete);
}

#[test]
fn test_broken_edit_mid_session_pulls_back() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 1).unwrap();
    let mut facade = open(&root);

    advance_to(&mut facade, MigrationStep::RenameAuto);
    assert!(facade.update_config("not json").is_err());

    assert_eq!(facade.current_step(), MigrationStep::ConfigFile);
    assert!(facade.step_machine().gate(MigrationStep::ConfigFile).is_some());
}

#[test]
fn test_custom_config_file_name() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_clean_project(temp_dir.path(), 1).unwrap();
    std::fs::write(
        root.join("legacy.json"),
        r#"{"integrationFolder": "cypress/integration", "componentFolder": false}"#,
    )
    .unwrap();

    let options = MigrationOptions {
        legacy_config_file: "legacy.json".to_string(),
        ..MigrationOptions::default()
    };
    let facade = MigrationFacade::open_local(&root, options).unwrap();

    assert!(!facade.config().unwrap().component_testing_enabled());
    let text = facade.config_after_text().unwrap();
    assert!(text.contains("specPattern: 'cypress/e2e/**/*.cy.{js,jsx,ts,tsx}',"));
    assert!(text.contains("componentFolder: false,"));
}

#[test]
fn test_rescan_picks_up_new_manual_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_legacy_project(temp_dir.path(), "{}", &["cypress/integration/a.spec.js"]).unwrap();
    let mut facade = open(&root);

    advance_to(&mut facade, MigrationStep::Complete);
    std::fs::write(root.join("cypress/integration/data.csv"), "x").unwrap();

    // Cached until asked to rescan.
    assert!(facade.plan().unwrap().manual_files.is_empty());

    let plan = facade.rescan().unwrap();
    assert_eq!(plan.manual_files, vec!["cypress/integration/data.csv".to_string()]);
    assert_eq!(facade.step_machine().furthest(), MigrationStep::RenameManual);
}

#[test]
fn test_write_new_config_never_overwrites() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_legacy_project(temp_dir.path(), r#"{"baseUrl": "http://x"}"#, &[]).unwrap();
    let facade = open(&root);

    let path = facade.write_new_config().unwrap();
    assert_eq!(path, root.join("cypress.config.js"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, facade.config_after_text().unwrap());

    std::fs::write(&path, "// edited by hand\n").unwrap();
    assert!(matches!(facade.write_new_config(), Err(Error::InvalidInput(_))));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "// edited by hand\n");
}

#[test]
fn test_default_plugins_file_is_wired_in() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_legacy_project(temp_dir.path(), "{}", &["cypress/plugins/index.js"]).unwrap();
    let facade = open(&root);

    let text = facade.config_after_text().unwrap();
    assert!(text.contains("return require('./cypress/plugins/index.js')(on, config)"));
}

/// The single e2e `specPattern` in generated config text.
fn e2e_spec_pattern(text: &str) -> SpecGlob {
    let line = text
        .lines()
        .find(|l| l.trim_start().starts_with("specPattern: '"))
        .unwrap();
    let pattern = line.split('\'').nth(1).unwrap();
    SpecGlob::new(pattern).unwrap()
}

#[test]
fn test_renamed_specs_match_generated_pattern() {
    let temp_dir = TempDir::new().unwrap();
    let config = r#"{"integrationFolder": "cypress/integration"}"#;
    let root = create_legacy_project(
        temp_dir.path(),
        config,
        &["cypress/integration/login.spec.js", "cypress/integration/admin/users_spec.ts"],
    )
    .unwrap();
    let facade = open(&root);

    let plan = facade.plan().unwrap();
    let pattern = e2e_spec_pattern(&plan.config_after_text);
    assert_eq!(plan.after.len(), 2);
    for after in &plan.after {
        assert!(pattern.matches(&after.relative_path), "{} vs {}", after.relative_path, pattern.as_str());
    }
}

#[test]
fn test_custom_test_files_keep_specs_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_legacy_project(
        temp_dir.path(),
        r#"{"testFiles": "**/*.test.js"}"#,
        &[
            "cypress/integration/login.test.js",
            "cypress/integration/admin/users.test.js",
            "cypress/integration/helpers.js",
        ],
    )
    .unwrap();
    let facade = open(&root);

    let plan = facade.plan().unwrap();
    assert!(plan.before.is_empty());
    assert!(plan.after.is_empty());
    assert_eq!(plan.kept_in_place, 2);
    assert_eq!(plan.manual_files, vec!["cypress/integration/helpers.js".to_string()]);
    assert_eq!(plan.manual_details[0].reason, ManualReason::OutsideTestFiles);

    let pattern = e2e_spec_pattern(&plan.config_after_text);
    assert_eq!(pattern.as_str(), "cypress/integration/**/*.test.js");
    for kept in ["cypress/integration/login.test.js", "cypress/integration/admin/users.test.js"] {
        assert!(root.join(kept).exists());
        assert!(pattern.matches(kept));
    }
    assert!(!pattern.matches("cypress/integration/helpers.js"));
}

#[test]
fn test_regexps_follow_config() {
    let temp_dir = TempDir::new().unwrap();
    let root = create_legacy_project(temp_dir.path(), r#"{"componentFolder": false}"#, &[]).unwrap();
    let mut facade = open(&root);

    let regexps = facade.regexps().unwrap();
    assert!(regexps.before_e2e.starts_with("^cypress/integration/"));
    assert!(regexps.after_e2e.starts_with("^cypress/e2e/"));
    assert!(regexps.before_component.is_none());
    assert!(regexps.after_component.is_none());

    facade.update_config(r#"{"componentFolder": "src"}"#).unwrap();
    let regexps = facade.regexps().unwrap();
    assert!(regexps.before_component.unwrap().starts_with("^src/"));
    assert_eq!(facade.plan().unwrap().regexps, facade.regexps().unwrap());
}
