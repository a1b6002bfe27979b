//! Naming rules mapping legacy spec paths to their new-format paths.
//!
//! A rule is compiled once per testing mode. Matching anchors on whole path
//! segments: the legacy folder must be a leading run of segments of the
//! candidate path, never a substring of one.
//!
//! Forward migration is idempotent: `rename` always produces a `.cy` name,
//! and a main name ending in `.cy` is never matched.

use crate::models::{NamingRegexps, SpecSegment, TestingMode};
use crate::services::config::{DEFAULT_COMPONENT_FOLDER, DEFAULT_INTEGRATION_FOLDER, LegacyConfig};
use crate::services::test_files::TestFileFilter;
use crate::{Error, Result};
use regex::Regex;

/// Extensions a spec file may carry, without the dot.
pub const SPEC_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "coffee", "cjsx"];

/// Folder end-to-end specs move to when the integration folder is the default.
pub const NEW_E2E_FOLDER: &str = "cypress/e2e";

const NEW_MARKER: &str = ".cy";

/// Components of a legacy path matched by a [`NamingRule`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub mode: TestingMode,
    /// Path below the legacy folder, without the marker and extension.
    pub main: String,
    /// `.spec` or `_spec` when present.
    pub marker: Option<String>,
    /// Extension including the leading dot.
    pub extension: String,
}

/// Compiled before/after naming rule for one testing mode
#[derive(Debug, Clone)]
pub struct NamingRule {
    mode: TestingMode,
    before_root: String,
    after_root: String,
    marker_required: bool,
    before: Regex,
    after: Regex,
}

impl NamingRule {
    /// Build a rule moving specs from `before_root` to `after_root`.
    ///
    /// Both roots are project-relative folders; `""` means the project root.
    pub fn new(
        mode: TestingMode,
        before_root: &str,
        after_root: &str,
        marker_required: bool,
    ) -> Result<Self> {
        let before_root = normalize_folder(before_root);
        let after_root = normalize_folder(after_root);
        let exts = SPEC_EXTENSIONS.join("|");

        let marker = if marker_required {
            "(?P<marker>[._]spec)"
        } else {
            "(?P<marker>[._]spec)?"
        };
        let before = format!(
            r"^{}(?P<main>(?:[^/]+/)*[^/]+?){marker}(?P<ext>\.(?:{exts}))$",
            root_prefix(&before_root)
        );
        let after = format!(
            r"^{}(?P<main>(?:[^/]+/)*[^/]+?)\.cy(?P<ext>\.(?:{exts}))$",
            root_prefix(&after_root)
        );

        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| Error::InvalidInput(format!("invalid naming rule for {mode}: {e}")))
        };

        Ok(Self {
            mode,
            before: compile(&before)?,
            after: compile(&after)?,
            before_root,
            after_root,
            marker_required,
        })
    }

    /// Compile the standard rule for `mode` given its legacy folder.
    ///
    /// End-to-end specs move from the default integration folder to
    /// `cypress/e2e`; a custom integration folder is kept. Component specs
    /// stay in their folder and must carry a `.spec` marker.
    pub fn compile(mode: TestingMode, legacy_folder: &str) -> Result<Self> {
        match mode {
            TestingMode::E2e => {
                let after = if normalize_folder(legacy_folder) == DEFAULT_INTEGRATION_FOLDER {
                    NEW_E2E_FOLDER
                } else {
                    legacy_folder
                };
                Self::new(mode, legacy_folder, after, false)
            }
            TestingMode::Component => Self::new(mode, legacy_folder, legacy_folder, true),
        }
    }

    #[must_use]
    pub fn mode(&self) -> TestingMode {
        self.mode
    }

    #[must_use]
    pub fn before_root(&self) -> &str {
        &self.before_root
    }

    #[must_use]
    pub fn after_root(&self) -> &str {
        &self.after_root
    }

    #[must_use]
    pub fn marker_required(&self) -> bool {
        self.marker_required
    }

    /// The legacy-side pattern as a regular expression string.
    #[must_use]
    pub fn before_pattern(&self) -> &str {
        self.before.as_str()
    }

    /// The new-side pattern as a regular expression string.
    #[must_use]
    pub fn after_pattern(&self) -> &str {
        self.after.as_str()
    }

    /// Whether `path` lies below this rule's legacy folder.
    #[must_use]
    pub fn in_before_root(&self, path: &str) -> bool {
        under_root(&self.before_root, path)
    }

    /// Match a project-relative path against the legacy naming.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<MatchResult> {
        let caps = self.before.captures(path)?;
        let main = caps.name("main")?.as_str();
        if main.ends_with(NEW_MARKER) {
            return None;
        }

        Some(MatchResult {
            mode: self.mode,
            main: main.to_string(),
            marker: caps.name("marker").map(|m| m.as_str().to_string()),
            extension: caps.name("ext")?.as_str().to_string(),
        })
    }

    /// Whether `path` already follows the new naming at the new location.
    #[must_use]
    pub fn is_migrated(&self, path: &str) -> bool {
        self.after.is_match(path)
    }

    /// New path for a match. Pure; touches nothing on disk.
    #[must_use]
    pub fn rename(&self, m: &MatchResult) -> String {
        format!(
            "{}{}{NEW_MARKER}{}",
            folder_prefix(&self.after_root),
            m.main,
            m.extension
        )
    }

    /// Display segments of the legacy name.
    #[must_use]
    pub fn before_segments(&self, m: &MatchResult) -> Vec<SpecSegment> {
        let suffix = format!("{}{}", m.marker.as_deref().unwrap_or(""), m.extension);
        self.segments(&self.before_root, &self.after_root, &m.main, &suffix)
    }

    /// Display segments of the new name.
    #[must_use]
    pub fn after_segments(&self, m: &MatchResult) -> Vec<SpecSegment> {
        let suffix = format!("{NEW_MARKER}{}", m.extension);
        self.segments(&self.after_root, &self.before_root, &m.main, &suffix)
    }

    fn segments(&self, root: &str, other_root: &str, main: &str, suffix: &str) -> Vec<SpecSegment> {
        let parts: Vec<&str> = split_folder(root);
        let other: Vec<&str> = split_folder(other_root);
        let common = parts
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut raw = Vec::new();
        for (idx, part) in parts.iter().enumerate() {
            let text = format!("{part}/");
            if idx < common {
                raw.push(SpecSegment::literal(text));
            } else {
                raw.push(SpecSegment::highlighted(text));
            }
        }
        raw.push(SpecSegment::literal(main));
        raw.push(SpecSegment::highlighted(suffix));

        merge_segments(raw)
    }

    /// Classify why a path below the legacy folder was not matched.
    #[must_use]
    pub fn mismatch_reason(&self, path: &str) -> crate::models::ManualReason {
        use crate::models::ManualReason;

        let file_name = path.rsplit('/').next().unwrap_or(path);
        let Some((stem, ext)) = file_name.rsplit_once('.') else {
            return ManualReason::UnsupportedExtension;
        };
        if !SPEC_EXTENSIONS.contains(&ext) {
            ManualReason::UnsupportedExtension
        } else if stem.ends_with(NEW_MARKER) {
            ManualReason::NewNamingInLegacyRoot
        } else {
            ManualReason::MissingSpecMarker
        }
    }
}

/// The pair of rules used by a scan
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub e2e: NamingRule,
    /// `None` when component testing is disabled in the legacy config.
    pub component: Option<NamingRule>,
    pub filter: TestFileFilter,
}

impl RuleSet {
    /// Compile both rules from the folders a legacy config resolves to.
    pub fn compile(config: &LegacyConfig) -> Result<Self> {
        let e2e = NamingRule::compile(TestingMode::E2e, &config.integration_folder())?;
        let component = if config.component_testing_enabled() {
            Some(NamingRule::compile(
                TestingMode::Component,
                &config.component_folder(),
            )?)
        } else {
            None
        };
        Ok(Self {
            e2e,
            component,
            filter: TestFileFilter::from_config(config),
        })
    }

    /// Rules for an untouched project with no legacy config keys.
    pub fn defaults() -> Result<Self> {
        Ok(Self {
            e2e: NamingRule::compile(TestingMode::E2e, DEFAULT_INTEGRATION_FOLDER)?,
            component: Some(NamingRule::compile(
                TestingMode::Component,
                DEFAULT_COMPONENT_FOLDER,
            )?),
            filter: TestFileFilter::default(),
        })
    }

    #[must_use]
    pub fn regexps(&self) -> NamingRegexps {
        NamingRegexps {
            before_e2e: self.e2e.before_pattern().to_string(),
            after_e2e: self.e2e.after_pattern().to_string(),
            before_component: self.component.as_ref().map(|r| r.before_pattern().to_string()),
            after_component: self.component.as_ref().map(|r| r.after_pattern().to_string()),
        }
    }

    #[must_use]
    pub fn for_mode(&self, mode: TestingMode) -> Option<&NamingRule> {
        match mode {
            TestingMode::E2e => Some(&self.e2e),
            TestingMode::Component => self.component.as_ref(),
        }
    }
}

/// Strip `./` prefixes and trailing slashes; `.` becomes the empty root.
#[must_use]
pub fn normalize_folder(folder: &str) -> String {
    let mut folder = folder.replace('\\', "/");
    while let Some(rest) = folder.strip_prefix("./") {
        folder = rest.to_string();
    }
    let trimmed = folder.trim_end_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn folder_prefix(root: &str) -> String {
    if root.is_empty() {
        String::new()
    } else {
        format!("{root}/")
    }
}

fn root_prefix(root: &str) -> String {
    if root.is_empty() {
        String::new()
    } else {
        format!("{}/", regex::escape(root))
    }
}

fn split_folder(root: &str) -> Vec<&str> {
    root.split('/').filter(|p| !p.is_empty()).collect()
}

fn under_root(root: &str, path: &str) -> bool {
    root.is_empty()
        || path
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn merge_segments(raw: Vec<SpecSegment>) -> Vec<SpecSegment> {
    let mut merged: Vec<SpecSegment> = Vec::with_capacity(raw.len());
    for seg in raw.into_iter().filter(|s| !s.text.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.highlight == seg.highlight => last.text.push_str(&seg.text),
            _ => merged.push(seg),
        }
    }
    merged
}
