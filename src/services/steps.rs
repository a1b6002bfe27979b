//! Wizard step state machine.
//!
//! Steps form a fixed ordered enumeration. Navigation is strictly sequential
//! (`advance`/`go_back`) except for `set_step`, which may only jump to a step
//! that has already been reached and is not behind an unresolved gate.
//!
//! Progress lives for the lifetime of the process. `snapshot`/`restore` is
//! the explicit contract for callers that want to keep it longer.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationStep {
    Initialize,
    ConfigFile,
    RenameAuto,
    RenameManual,
    SetupComponent,
    Complete,
}

impl MigrationStep {
    /// Version of the step enumeration; bumped whenever members change.
    pub const VERSION: u32 = 1;

    pub const ALL: [MigrationStep; 6] = [
        MigrationStep::Initialize,
        MigrationStep::ConfigFile,
        MigrationStep::RenameAuto,
        MigrationStep::RenameManual,
        MigrationStep::SetupComponent,
        MigrationStep::Complete,
    ];

    #[must_use]
    pub fn first() -> Self {
        Self::ALL[0]
    }

    #[must_use]
    pub fn last() -> Self {
        Self::ALL[Self::ALL.len() - 1]
    }

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationStep::Initialize => "initialize",
            MigrationStep::ConfigFile => "configFile",
            MigrationStep::RenameAuto => "renameAuto",
            MigrationStep::RenameManual => "renameManual",
            MigrationStep::SetupComponent => "setupComponent",
            MigrationStep::Complete => "complete",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MigrationStep {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MigrationStep::from_label(s).ok_or_else(|| format!("unknown step '{s}'"))
    }
}

/// Serializable progress of a step machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub current: MigrationStep,
    pub furthest: MigrationStep,
}

#[derive(Debug, Clone)]
pub struct StepMachine {
    current: MigrationStep,
    furthest: MigrationStep,
    /// Steps that cannot be left, with the reason.
    gates: BTreeMap<MigrationStep, String>,
}

impl Default for StepMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StepMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: MigrationStep::first(),
            furthest: MigrationStep::first(),
            gates: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn current(&self) -> MigrationStep {
        self.current
    }

    /// Furthest step reached this session.
    #[must_use]
    pub fn furthest(&self) -> MigrationStep {
        self.furthest
    }

    /// The terminal step has been reached at least once.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.furthest == MigrationStep::last()
    }

    /// Block (`Some`) or unblock (`None`) leaving `step`.
    pub fn set_gate(&mut self, step: MigrationStep, reason: Option<String>) {
        match reason {
            Some(reason) => {
                self.gates.insert(step, reason);
            }
            None => {
                self.gates.remove(&step);
            }
        }
    }

    #[must_use]
    pub fn gate(&self, step: MigrationStep) -> Option<&str> {
        self.gates.get(&step).map(String::as_str)
    }

    /// Reached before, and no gate sits on any earlier step.
    #[must_use]
    pub fn is_reachable(&self, step: MigrationStep) -> bool {
        step <= self.furthest && self.gates.range(..step).next().is_none()
    }

    pub fn advance(&mut self) -> Result<MigrationStep> {
        let Some(next) = self.current.next() else {
            return Err(Error::InvalidTransition {
                from: self.current,
                reason: "already at the last step".to_string(),
            });
        };
        if let Some(reason) = self.gate(self.current) {
            return Err(Error::StepBlocked {
                step: self.current,
                reason: reason.to_string(),
            });
        }

        self.current = next;
        self.furthest = self.furthest.max(next);
        log::debug!("migration step advanced to {next}");
        Ok(next)
    }

    pub fn go_back(&mut self) -> Result<MigrationStep> {
        let Some(prev) = self.current.prev() else {
            return Err(Error::InvalidTransition {
                from: self.current,
                reason: "already at the first step".to_string(),
            });
        };

        self.current = prev;
        log::debug!("migration step went back to {prev}");
        Ok(prev)
    }

    pub fn set_step(&mut self, step: MigrationStep) -> Result<MigrationStep> {
        if !self.is_reachable(step) {
            return Err(Error::InvalidTransition {
                from: self.current,
                reason: format!("step '{step}' has not been reached"),
            });
        }
        self.current = step;
        Ok(step)
    }

    /// Drop progress beyond `step`.
    pub fn invalidate(&mut self, step: MigrationStep) {
        if self.furthest > step {
            log::info!("migration progress invalidated back to {step}");
        }
        self.furthest = self.furthest.min(step);
        self.current = self.current.min(step);
    }

    pub fn reset(&mut self) {
        self.current = MigrationStep::first();
        self.furthest = MigrationStep::first();
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            version: MigrationStep::VERSION,
            current: self.current,
            furthest: self.furthest,
        }
    }

    /// Rebuild a machine from a snapshot. Gates are not part of a snapshot.
    pub fn restore(snapshot: &SessionSnapshot) -> Result<Self> {
        if snapshot.version != MigrationStep::VERSION {
            return Err(Error::InvalidInput(format!(
                "session snapshot version {} does not match step version {}",
                snapshot.version,
                MigrationStep::VERSION
            )));
        }
        if snapshot.current > snapshot.furthest {
            return Err(Error::InvalidInput(format!(
                "session snapshot current step '{}' is past furthest step '{}'",
                snapshot.current, snapshot.furthest
            )));
        }

        Ok(Self {
            current: snapshot.current,
            furthest: snapshot.furthest,
            gates: BTreeMap::new(),
        })
    }
}
