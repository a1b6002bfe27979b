//! Unit tests for the wizard step machine

use proptest::prelude::*;
use spec_migrate::{Error, MigrationStep, SessionSnapshot, StepMachine};

#[test]
fn advancing_k_minus_one_times_reaches_the_end() {
    let mut machine = StepMachine::new();
    assert_eq!(machine.current(), MigrationStep::first());

    for _ in 1..MigrationStep::ALL.len() {
        machine.advance().unwrap();
    }
    assert_eq!(machine.current(), MigrationStep::last());
    assert!(machine.is_closed());
}

#[test]
fn back_at_start_is_invalid() {
    let mut machine = StepMachine::new();
    let err = machine.go_back().unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { from: MigrationStep::Initialize, .. }));
    assert_eq!(machine.current(), MigrationStep::Initialize);
}

#[test]
fn advance_at_end_is_invalid() {
    let mut machine = StepMachine::new();
    while machine.advance().is_ok() {}
    assert_eq!(machine.current(), MigrationStep::Complete);
    assert!(matches!(machine.advance(), Err(Error::InvalidTransition { .. })));
}

#[test]
fn gate_blocks_only_its_own_step() {
    let mut machine = StepMachine::new();
    machine.set_gate(MigrationStep::ConfigFile, Some("broken".to_string()));
    machine.advance().unwrap();

    match machine.advance() {
        Err(Error::StepBlocked { step, reason }) => {
            assert_eq!(step, MigrationStep::ConfigFile);
            assert_eq!(reason, "broken");
        }
        other => panic!("expected blocked step, got {other:?}"),
    }

    machine.set_gate(MigrationStep::ConfigFile, None);
    assert_eq!(machine.advance().unwrap(), MigrationStep::RenameAuto);
}

#[test]
fn set_step_only_jumps_to_reached_steps() {
    let mut machine = StepMachine::new();
    machine.advance().unwrap();
    machine.advance().unwrap();
    machine.go_back().unwrap();
    machine.go_back().unwrap();

    assert_eq!(machine.set_step(MigrationStep::RenameAuto).unwrap(), MigrationStep::RenameAuto);
    assert!(machine.set_step(MigrationStep::RenameManual).is_err());

    machine.set_gate(MigrationStep::ConfigFile, Some("broken".to_string()));
    assert!(!machine.is_reachable(MigrationStep::RenameAuto));
    assert!(machine.set_step(MigrationStep::ConfigFile).is_ok());
}

#[test]
fn invalidate_pulls_back_progress() {
    let mut machine = StepMachine::new();
    while machine.advance().is_ok() {}
    machine.invalidate(MigrationStep::ConfigFile);
    assert_eq!(machine.current(), MigrationStep::ConfigFile);
    assert_eq!(machine.furthest(), MigrationStep::ConfigFile);
    assert!(!machine.is_closed());
}

#[test]
fn restore_rejects_foreign_snapshots() {
    let stale = SessionSnapshot {
        version: MigrationStep::VERSION + 1,
        current: MigrationStep::Initialize,
        furthest: MigrationStep::Initialize,
    };
    assert!(StepMachine::restore(&stale).is_err());

    let inverted = SessionSnapshot {
        version: MigrationStep::VERSION,
        current: MigrationStep::Complete,
        furthest: MigrationStep::ConfigFile,
    };
    assert!(StepMachine::restore(&inverted).is_err());
}

#[test]
fn labels_parse_back() {
    for step in MigrationStep::ALL {
        assert_eq!(step.as_str().parse::<MigrationStep>().unwrap(), step);
    }
    assert_eq!(
        "RENAMEMANUAL".parse::<MigrationStep>().unwrap(),
        MigrationStep::RenameManual
    );
    assert!("done".parse::<MigrationStep>().is_err());
}

#[derive(Debug, Clone)]
enum Nav {
    Advance,
    Back,
    Jump(usize),
}

fn nav() -> impl Strategy<Value = Nav> {
    prop_oneof![
        Just(Nav::Advance),
        Just(Nav::Back),
        (0..MigrationStep::ALL.len()).prop_map(Nav::Jump),
    ]
}

proptest! {
    #[test]
    fn current_never_passes_furthest(ops in prop::collection::vec(nav(), 0..40)) {
        let mut machine = StepMachine::new();
        let mut furthest_seen = MigrationStep::first();

        for op in ops {
            let _ = match op {
                Nav::Advance => machine.advance(),
                Nav::Back => machine.go_back(),
                Nav::Jump(i) => machine.set_step(MigrationStep::ALL[i]),
            };
            prop_assert!(machine.current() <= machine.furthest());
            prop_assert!(machine.furthest() >= furthest_seen);
            furthest_seen = machine.furthest();
        }

        let restored = StepMachine::restore(&machine.snapshot()).unwrap();
        prop_assert_eq!(restored.current(), machine.current());
        prop_assert_eq!(restored.furthest(), machine.furthest());
    }
}
