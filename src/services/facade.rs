//! Migration facade: the query and mutation surface for a presentation layer.
//!
//! One facade owns one project's session. Step navigation and config edits
//! take `&mut self`; renames take `&self` so a caller may issue renames for
//! different files from several threads at once. Each rename is an
//! independent no-clobber move and only touches its own ledger entry.

use crate::io::fs::{ConfigSource, FileConfigSource, ProjectFs, StdFs};
use crate::models::{
    ManualFile, ManualReason, MigrationPlan, NamingRegexps, RenameFailure, RenameOutcome,
    RenameReport,
};
use crate::services::classify::{self, ScanResult};
use crate::services::config::{
    DEFAULT_PLUGINS_FILE, LegacyConfig, ParseError, TransformOptions, parse_legacy,
    render_after_text_with, render_before_text,
};
use crate::services::pattern::RuleSet;
use crate::services::steps::{MigrationStep, SessionSnapshot, StepMachine};
use crate::{Error, MigrationOptions, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Everything needed to resume a wizard in a later process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub steps: SessionSnapshot,
    pub resolved_manual: BTreeSet<String>,
}

pub struct MigrationFacade {
    root: PathBuf,
    options: MigrationOptions,
    fs: Arc<dyn ProjectFs>,
    source: Box<dyn ConfigSource>,
    config: std::result::Result<LegacyConfig, ParseError>,
    scan: Mutex<Option<Arc<ScanResult>>>,
    /// Renames applied since the last scan, keyed by legacy path.
    applied: Mutex<BTreeMap<String, String>>,
    /// Legacy paths whose rename hit an existing destination.
    conflicts: Mutex<BTreeSet<String>>,
    resolved_manual: BTreeSet<String>,
    machine: StepMachine,
}

impl std::fmt::Debug for MigrationFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationFacade")
            .field("root", &self.root)
            .field("step", &self.machine.current())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MigrationFacade {
    /// Open a session for `root`, reading the legacy config from `source`.
    ///
    /// A legacy config that does not parse does not fail the session: the
    /// wizard stays at or before the config step until it is fixed.
    pub fn open(
        root: impl Into<PathBuf>,
        fs: Arc<dyn ProjectFs>,
        source: Box<dyn ConfigSource>,
        options: MigrationOptions,
    ) -> Result<Self> {
        let root = root.into();
        if !fs.exists(&root) {
            return Err(Error::InvalidInput(format!(
                "Project root does not exist: {}",
                root.display()
            )));
        }

        let raw = source.read_legacy()?;
        let config = parse_legacy(&raw);
        if let Err(e) = &config {
            log::warn!("legacy config for {} does not parse: {e}", root.display());
        }

        let mut facade = Self {
            root,
            options,
            fs,
            source,
            config,
            scan: Mutex::new(None),
            applied: Mutex::new(BTreeMap::new()),
            conflicts: Mutex::new(BTreeSet::new()),
            resolved_manual: BTreeSet::new(),
            machine: StepMachine::new(),
        };
        facade.refresh_gates();
        Ok(facade)
    }

    /// Open a session on the local file system with the legacy config file
    /// named in `options`.
    pub fn open_local(root: impl Into<PathBuf>, options: MigrationOptions) -> Result<Self> {
        let root = root.into();
        let fs: Arc<dyn ProjectFs> = Arc::new(StdFs);
        let source =
            FileConfigSource::new(Arc::clone(&fs), root.join(&options.legacy_config_file));
        Self::open(root, fs, Box::new(source), options)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn options(&self) -> &MigrationOptions {
        &self.options
    }

    // ---- queries ----

    #[must_use]
    pub fn current_step(&self) -> MigrationStep {
        self.machine.current()
    }

    #[must_use]
    pub fn step_machine(&self) -> &StepMachine {
        &self.machine
    }

    /// The parsed legacy config, or the parse failure.
    pub fn config(&self) -> Result<&LegacyConfig> {
        self.config.as_ref().map_err(|e| Error::Parse(e.clone()))
    }

    pub fn config_before_text(&self) -> Result<String> {
        Ok(render_before_text(self.config()?))
    }

    pub fn config_after_text(&self) -> Result<String> {
        let opts = TransformOptions {
            default_plugins_file_present: self.fs.exists(&self.root.join(DEFAULT_PLUGINS_FILE)),
        };
        Ok(render_after_text_with(self.config()?, &opts))
    }

    pub fn integration_folder(&self) -> Result<String> {
        Ok(self.config()?.integration_folder())
    }

    pub fn component_folder(&self) -> Result<String> {
        Ok(self.config()?.component_folder())
    }

    /// Before/after naming patterns of both testing modes.
    pub fn regexps(&self) -> Result<NamingRegexps> {
        Ok(RuleSet::compile(self.config()?)?.regexps())
    }

    /// The current plan: the cached scan with this session's renames and
    /// conflicts applied on top.
    pub fn plan(&self) -> Result<MigrationPlan> {
        let scan = self.scan_result()?;
        let applied = lock(&self.applied).clone();
        let conflicts = lock(&self.conflicts).clone();

        let mut plan = MigrationPlan {
            config_before_text: self.config_before_text()?,
            config_after_text: self.config_after_text()?,
            integration_folder: self.integration_folder()?,
            component_folder: self.component_folder()?,
            regexps: self.regexps()?,
            kept_in_place: scan.kept_in_place,
            scan_errors: scan.errors.clone(),
            ..MigrationPlan::default()
        };

        let mut manual = scan.manual.clone();
        for (before, after) in scan.before.iter().zip(scan.after.iter()) {
            if applied.contains_key(&before.relative_path) {
                continue;
            }
            if conflicts.contains(&before.relative_path) {
                manual.push(ManualFile {
                    path: before.relative_path.clone(),
                    testing_mode: before.testing_mode,
                    reason: ManualReason::RenameConflict,
                });
                continue;
            }
            plan.before.push(before.clone());
            plan.after.push(after.clone());
        }

        manual.sort_by(|a, b| a.path.cmp(&b.path));
        plan.manual_files = manual.iter().map(|m| m.path.clone()).collect();
        plan.manual_details = manual;
        Ok(plan)
    }

    /// Manual files the user has not marked resolved yet.
    pub fn unresolved_manual_files(&self) -> Result<Vec<String>> {
        Ok(self
            .plan()?
            .manual_files
            .into_iter()
            .filter(|p| !self.resolved_manual.contains(p))
            .collect())
    }

    #[must_use]
    pub fn applied_renames(&self) -> Vec<RenameOutcome> {
        lock(&self.applied)
            .iter()
            .map(|(from, to)| RenameOutcome {
                from: from.clone(),
                to: to.clone(),
            })
            .collect()
    }

    fn scan_result(&self) -> Result<Arc<ScanResult>> {
        let config = self.config()?;
        if let Some(scan) = lock(&self.scan).as_ref() {
            return Ok(Arc::clone(scan));
        }

        let scan = Arc::new(classify::scan(
            self.fs.as_ref(),
            &self.root,
            config,
            &self.options,
        )?);
        *lock(&self.scan) = Some(Arc::clone(&scan));
        Ok(scan)
    }

    // ---- step navigation ----

    pub fn advance(&mut self) -> Result<MigrationStep> {
        if self.machine.current() == MigrationStep::ConfigFile
            && let Err(e) = &self.config
        {
            return Err(Error::Parse(e.clone()));
        }
        self.refresh_gates();
        self.machine.advance()
    }

    pub fn go_back(&mut self) -> Result<MigrationStep> {
        self.machine.go_back()
    }

    pub fn set_step(&mut self, step: MigrationStep) -> Result<MigrationStep> {
        self.refresh_gates();
        self.machine.set_step(step)
    }

    // ---- mutations ----

    /// Move one legacy spec to its new path.
    ///
    /// Fails with [`Error::RenameConflict`] when the destination exists; the
    /// file then shows up among the manual files. Other renames are
    /// unaffected either way.
    pub fn apply_rename(&self, before_path: &str) -> Result<RenameOutcome> {
        let scan = self.scan_result()?;
        let Some(idx) = scan
            .before
            .iter()
            .position(|s| s.relative_path == before_path)
        else {
            return Err(Error::UnknownSpec(before_path.to_string()));
        };
        let to = scan.after[idx].relative_path.clone();

        match self
            .fs
            .move_file(&self.root.join(before_path), &self.root.join(&to))
        {
            Ok(()) => {
                log::info!("renamed {before_path} -> {to}");
                lock(&self.applied).insert(before_path.to_string(), to.clone());
                Ok(RenameOutcome {
                    from: before_path.to_string(),
                    to,
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::warn!("cannot rename {before_path}: {to} already exists");
                lock(&self.conflicts).insert(before_path.to_string());
                Err(Error::RenameConflict {
                    from: before_path.to_string(),
                    to,
                })
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Apply several renames one after another, collecting per-file failures.
    pub fn apply_renames<S: AsRef<str>>(&self, paths: &[S]) -> RenameReport {
        let mut report = RenameReport::default();
        for path in paths {
            match self.apply_rename(path.as_ref()) {
                Ok(outcome) => report.applied.push(outcome),
                Err(e) => report.failures.push(RenameFailure::from_error(path.as_ref(), &e)),
            }
        }
        report
    }

    /// Legacy paths of every pending auto rename.
    pub fn pending_renames(&self) -> Result<Vec<String>> {
        Ok(self
            .plan()?
            .before
            .into_iter()
            .map(|s| s.relative_path)
            .collect())
    }

    pub fn mark_manual_resolved(&mut self, path: &str) -> Result<()> {
        let plan = self.plan()?;
        if !plan.manual_files.iter().any(|p| p == path) {
            return Err(Error::UnknownSpec(path.to_string()));
        }
        self.resolved_manual.insert(path.to_string());
        self.refresh_gates();
        Ok(())
    }

    /// Replace the legacy config with edited text.
    pub fn update_config(&mut self, raw: &str) -> Result<()> {
        let parsed = parse_legacy(raw);
        let result = parsed.as_ref().map(|_| ()).map_err(|e| Error::Parse(e.clone()));
        self.set_config(parsed);
        result
    }

    /// Re-read the legacy config from its source.
    pub fn reload_config(&mut self) -> Result<()> {
        let raw = self.source.read_legacy()?;
        self.update_config(&raw)
    }

    fn set_config(&mut self, config: std::result::Result<LegacyConfig, ParseError>) {
        if self.config == config {
            return;
        }
        let valid = config.is_ok();
        self.config = config;
        self.invalidate();

        if self.machine.is_closed() || (!valid && self.machine.furthest() > MigrationStep::ConfigFile)
        {
            self.machine.invalidate(MigrationStep::ConfigFile);
        }
        self.refresh_gates();
    }

    /// Drop the cached scan; the next query rescans.
    pub fn invalidate(&self) {
        *lock(&self.scan) = None;
        lock(&self.applied).clear();
        lock(&self.conflicts).clear();
    }

    /// Scan again. New unresolved manual files pull progress back to the
    /// manual step.
    pub fn rescan(&mut self) -> Result<MigrationPlan> {
        self.invalidate();
        let plan = self.plan()?;
        self.resolved_manual
            .retain(|p| plan.manual_files.iter().any(|m| m == p));

        let unresolved = plan
            .manual_files
            .iter()
            .any(|p| !self.resolved_manual.contains(p));
        if unresolved && self.machine.furthest() > MigrationStep::RenameManual {
            self.machine.invalidate(MigrationStep::RenameManual);
        }
        self.refresh_gates();
        Ok(plan)
    }

    /// Write the generated config next to the legacy one. Never overwrites.
    pub fn write_new_config(&self) -> Result<PathBuf> {
        let text = self.config_after_text()?;
        let path = self.root.join(&self.options.new_config_file);
        match self.fs.write_new(&path, &text) {
            Ok(()) => {
                log::info!("wrote {}", path.display());
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(Error::InvalidInput(format!(
                "{} already exists",
                path.display()
            ))),
            Err(e) => Err(Error::Io(e)),
        }
    }

    // ---- persistence contract ----

    #[must_use]
    pub fn session_state(&self) -> SessionState {
        SessionState {
            steps: self.machine.snapshot(),
            resolved_manual: self.resolved_manual.clone(),
        }
    }

    pub fn restore_session(&mut self, state: &SessionState) -> Result<()> {
        self.machine = StepMachine::restore(&state.steps)?;
        self.resolved_manual = state.resolved_manual.clone();
        if self.config.is_err() && self.machine.furthest() > MigrationStep::ConfigFile {
            self.machine.invalidate(MigrationStep::ConfigFile);
        }
        self.refresh_gates();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.machine.reset();
        self.resolved_manual.clear();
        self.invalidate();
        self.refresh_gates();
    }

    fn refresh_gates(&mut self) {
        let config_gate = self.config.as_ref().err().map(ToString::to_string);
        self.machine.set_gate(MigrationStep::ConfigFile, config_gate);

        let manual_gate = match self.unresolved_manual_files() {
            Ok(files) if files.is_empty() => None,
            Ok(files) => Some(format!("{} manual file(s) unresolved", files.len())),
            Err(e) => Some(e.to_string()),
        };
        self.machine.set_gate(MigrationStep::RenameManual, manual_gate);
    }
}

/// Process-lifetime sessions keyed by project identity
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<PathBuf, MigrationFacade>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical identity of a project root.
    #[must_use]
    pub fn project_key(root: &Path) -> PathBuf {
        std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
    }

    /// Existing session for `root`, or a new one built by `open`.
    pub fn open_with<F>(&mut self, root: &Path, open: F) -> Result<&mut MigrationFacade>
    where
        F: FnOnce(&Path) -> Result<MigrationFacade>,
    {
        let key = Self::project_key(root);
        if !self.sessions.contains_key(&key) {
            let facade = open(root)?;
            self.sessions.insert(key.clone(), facade);
        }
        self.sessions
            .get_mut(&key)
            .ok_or_else(|| Error::InvalidInput(format!("no session for {}", key.display())))
    }

    /// Session on the local file system with default options.
    pub fn open_local(&mut self, root: &Path) -> Result<&mut MigrationFacade> {
        self.open_with(root, |r| {
            MigrationFacade::open_local(r, MigrationOptions::default())
        })
    }

    #[must_use]
    pub fn get(&self, root: &Path) -> Option<&MigrationFacade> {
        self.sessions.get(&Self::project_key(root))
    }

    /// End the session for `root`.
    pub fn close(&mut self, root: &Path) -> Option<MigrationFacade> {
        self.sessions.remove(&Self::project_key(root))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
