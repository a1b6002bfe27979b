//! Spec classification over a project's legacy spec folders.
//!
//! A scan never mutates anything and produces the same result for an
//! unchanged tree. `before` and `after` are ordered by legacy path and stay
//! index-aligned; `manual` is ordered by path.

use crate::MigrationOptions;
use crate::io::fs::{EntryKind, ProjectFs};
use crate::models::{ManualFile, ManualReason, MigrationStatus, ScanError, SpecFile, TestingMode};
use crate::services::config::LegacyConfig;
use crate::services::pattern::{NamingRule, RuleSet};
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::Path;

/// Output of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Auto-convertible files, index-aligned with `after`.
    pub before: Vec<SpecFile>,
    pub after: Vec<SpecFile>,
    pub manual: Vec<ManualFile>,
    /// Files already in the new layout; counted, never listed.
    pub already_migrated: usize,
    /// Specs that keep their names because `testFiles` is custom.
    pub kept_in_place: usize,
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    #[must_use]
    pub fn manual_paths(&self) -> Vec<String> {
        self.manual.iter().map(|m| m.path.clone()).collect()
    }
}

/// Scan `project_root` using the rules a legacy config resolves to.
pub fn scan(
    fs: &dyn ProjectFs,
    project_root: &Path,
    config: &LegacyConfig,
    opts: &MigrationOptions,
) -> Result<ScanResult> {
    let rules = RuleSet::compile(config)?;
    scan_with_rules(fs, project_root, &rules, opts)
}

/// Scan `project_root` with explicit rules.
pub fn scan_with_rules(
    fs: &dyn ProjectFs,
    project_root: &Path,
    rules: &RuleSet,
    opts: &MigrationOptions,
) -> Result<ScanResult> {
    if !fs.exists(project_root) {
        return Err(Error::InvalidInput(format!(
            "Project root does not exist: {}",
            project_root.display()
        )));
    }

    let mut walker = Walker {
        fs,
        project_root,
        skip_dirs: &opts.skip_dirs,
        errors: Vec::new(),
    };

    let mut result = ScanResult::default();

    // Component files first: they win when the two folders overlap.
    let mut claimed = BTreeSet::new();
    let mut candidates: Vec<(&NamingRule, String)> = Vec::new();
    for rule in [rules.component.as_ref(), Some(&rules.e2e)].into_iter().flatten() {
        let seen_errors = walker.errors.len();
        for path in walker.collect(rule.before_root()) {
            if claimed.insert(path.clone()) {
                candidates.push((rule, path));
            }
        }
        // Specs below an unreadable directory are unknown, never skipped.
        for error in &walker.errors[seen_errors..] {
            result.manual.push(ManualFile {
                path: error.path.clone(),
                testing_mode: rule.mode(),
                reason: ManualReason::UnreadableDirectory,
            });
        }
    }

    let mut pending = Vec::new();

    for (rule, path) in candidates {
        if let Some(reason) = rules.filter.rejection(relative_to(rule.before_root(), &path)) {
            log::debug!("{} file {path} is not a spec: {}", rule.mode(), reason.describe());
            result.manual.push(ManualFile {
                path,
                testing_mode: rule.mode(),
                reason,
            });
        } else if rules.filter.is_custom() {
            log::debug!("{} spec {path} keeps its name", rule.mode());
            result.kept_in_place += 1;
        } else if let Some(m) = rule.match_path(&path) {
            let destination = rule.rename(&m);
            log::debug!("{} spec {path} -> {destination}", rule.mode());
            pending.push(Pending {
                mode: rule.mode(),
                before: SpecFile {
                    relative_path: path,
                    testing_mode: rule.mode(),
                    segments: rule.before_segments(&m),
                    migration_status: MigrationStatus::Auto,
                },
                after: SpecFile {
                    relative_path: destination,
                    testing_mode: rule.mode(),
                    segments: rule.after_segments(&m),
                    migration_status: MigrationStatus::Auto,
                },
            });
        } else if rule.is_migrated(&path) {
            log::debug!("{} spec {path} already migrated", rule.mode());
            result.already_migrated += 1;
        } else {
            let reason = rule.mismatch_reason(&path);
            log::debug!("{} file {path} needs manual handling: {}", rule.mode(), reason.describe());
            result.manual.push(ManualFile {
                path,
                testing_mode: rule.mode(),
                reason,
            });
        }
    }

    pending.sort_by(|a, b| a.before.relative_path.cmp(&b.before.relative_path));

    // Never guess between two files competing for one destination.
    let mut by_destination: BTreeMap<String, usize> = BTreeMap::new();
    for p in &pending {
        *by_destination.entry(p.after.relative_path.clone()).or_default() += 1;
    }

    for p in pending {
        let destination = &p.after.relative_path;
        let reason = if by_destination.get(destination).copied().unwrap_or(0) > 1 {
            Some(ManualReason::DuplicateDestination)
        } else if fs.exists(&project_root.join(destination)) {
            Some(ManualReason::DestinationExists)
        } else {
            None
        };

        match reason {
            Some(reason) => result.manual.push(ManualFile {
                path: p.before.relative_path,
                testing_mode: p.mode,
                reason,
            }),
            None => {
                result.before.push(p.before);
                result.after.push(p.after);
            }
        }
    }

    result.manual.sort_by(|a, b| a.path.cmp(&b.path));
    result.errors = walker.errors;

    log::info!(
        "scan of {}: {} renameable, {} manual, {} already migrated, {} kept in place",
        project_root.display(),
        result.before.len(),
        result.manual.len(),
        result.already_migrated,
        result.kept_in_place
    );

    Ok(result)
}

fn relative_to<'a>(root: &str, path: &'a str) -> &'a str {
    if root.is_empty() {
        return path;
    }
    path.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
}

struct Pending {
    mode: TestingMode,
    before: SpecFile,
    after: SpecFile,
}

/// Recursive file lister recording unreadable directories instead of failing
struct Walker<'a> {
    fs: &'a dyn ProjectFs,
    project_root: &'a Path,
    skip_dirs: &'a [String],
    errors: Vec<ScanError>,
}

impl Walker<'_> {
    /// All files below `root`, project-relative and sorted.
    fn collect(&mut self, root: &str) -> Vec<String> {
        let mut files = Vec::new();
        self.walk(root, true, &mut files);
        files.sort();
        files
    }

    fn walk(&mut self, rel_dir: &str, is_root: bool, files: &mut Vec<String>) {
        let dir = if rel_dir.is_empty() {
            self.project_root.to_path_buf()
        } else {
            self.project_root.join(rel_dir)
        };

        let entries = match self.fs.list_dir(&dir) {
            Ok(entries) => entries,
            // A legacy folder that was never created simply has no specs.
            Err(e) if is_root && e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                self.record_error(rel_dir, &e);
                return;
            }
        };

        for entry in entries {
            let rel = if rel_dir.is_empty() {
                entry.name.clone()
            } else {
                format!("{rel_dir}/{}", entry.name)
            };
            match entry.kind {
                EntryKind::File => files.push(rel),
                EntryKind::Dir => {
                    if entry.name.starts_with('.') || self.skip_dirs.contains(&entry.name) {
                        continue;
                    }
                    self.walk(&rel, false, files);
                }
                EntryKind::Other => {}
            }
        }
    }

    fn record_error(&mut self, path: &str, error: &std::io::Error) {
        if self.errors.iter().any(|e| e.path == path) {
            return;
        }
        let code = match error.kind() {
            ErrorKind::NotFound => "ENOENT",
            ErrorKind::PermissionDenied => "EACCES",
            _ => "IO",
        };
        log::warn!("cannot read {path}: {error}");

        self.errors.push(ScanError {
            path: path.to_string(),
            code: code.to_string(),
            message: error.to_string(),
        });
    }
}
