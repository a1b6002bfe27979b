//! Data models for spec files, migration plans, and rename results

use serde::{Deserialize, Serialize};

/// Testing mode a spec file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestingMode {
    /// End-to-end specs living under the integration folder.
    E2e,
    /// Component specs living under the component folder.
    Component,
}

impl TestingMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TestingMode::E2e => "e2e",
            TestingMode::Component => "component",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "e2e" | "end-to-end" | "integration" => Some(TestingMode::E2e),
            "component" | "ct" => Some(TestingMode::Component),
            _ => None,
        }
    }
}

impl std::fmt::Display for TestingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestingMode::from_label(s).ok_or_else(|| format!("unknown testing mode '{s}'"))
    }
}

/// One piece of a displayed file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSegment {
    pub text: String,
    /// Marks the part that differs between the before and after names.
    pub highlight: bool,
}

impl SpecSegment {
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: false,
        }
    }

    #[must_use]
    pub fn highlighted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            highlight: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationStatus {
    Auto,
    Manual,
    AlreadyMigrated,
}

/// A spec file discovered during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecFile {
    /// Path relative to the project root, always `/`-separated.
    pub relative_path: String,
    pub testing_mode: TestingMode,
    pub segments: Vec<SpecSegment>,
    pub migration_status: MigrationStatus,
}

impl SpecFile {
    /// Concatenate the segments back into the display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Why a file was routed to manual handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualReason {
    /// Extension is not one of the supported spec extensions.
    UnsupportedExtension,
    /// Already named like a new-format spec but still in the legacy folder.
    NewNamingInLegacyRoot,
    /// Component spec without a `.spec`/`_spec` marker.
    MissingSpecMarker,
    /// Another legacy file renames to the same destination.
    DuplicateDestination,
    /// The rename destination already exists on disk.
    DestinationExists,
    /// A rename was attempted in this session and hit an existing file.
    RenameConflict,
    /// Not matched by the legacy `testFiles` globs.
    OutsideTestFiles,
    /// Matched by the legacy `ignoreTestFiles` globs.
    IgnoredTestFile,
    /// A directory below a legacy folder could not be listed, so its specs
    /// are unknown.
    UnreadableDirectory,
}

impl ManualReason {
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            ManualReason::UnsupportedExtension => "unsupported extension",
            ManualReason::NewNamingInLegacyRoot => "new naming inside legacy folder",
            ManualReason::MissingSpecMarker => "no .spec marker",
            ManualReason::DuplicateDestination => "several files rename to the same path",
            ManualReason::DestinationExists => "destination already exists",
            ManualReason::RenameConflict => "rename conflict",
            ManualReason::OutsideTestFiles => "not matched by testFiles",
            ManualReason::IgnoredTestFile => "matched by ignoreTestFiles",
            ManualReason::UnreadableDirectory => "directory could not be read",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFile {
    pub path: String,
    pub testing_mode: TestingMode,
    pub reason: ManualReason,
}

/// Represents an error encountered during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanError {
    pub path: String,
    pub code: String,
    pub message: String,
}

/// Regular expressions behind the naming rules, for highlighting in a UI
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRegexps {
    #[serde(rename = "beforeE2E")]
    pub before_e2e: String,
    #[serde(rename = "afterE2E")]
    pub after_e2e: String,
    /// `None` when component testing is disabled.
    #[serde(rename = "beforeComponent")]
    pub before_component: Option<String>,
    #[serde(rename = "afterComponent")]
    pub after_component: Option<String>,
}

/// Derived view of everything the wizard shows. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationPlan {
    /// Legacy spec files, index-aligned with `after`.
    pub before: Vec<SpecFile>,
    pub after: Vec<SpecFile>,
    pub manual_files: Vec<String>,
    pub manual_details: Vec<ManualFile>,
    /// Specs left where they are because `testFiles` is custom.
    pub kept_in_place: usize,
    /// Directories the scan could not read. Each is also a manual entry.
    pub scan_errors: Vec<ScanError>,
    pub regexps: NamingRegexps,
    pub config_before_text: String,
    pub config_after_text: String,
    pub integration_folder: String,
    pub component_folder: String,
}

impl MigrationPlan {
    /// Iterate over (before, after) pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (&SpecFile, &SpecFile)> {
        self.before.iter().zip(self.after.iter())
    }

    /// Find the pair whose legacy path is `before_path`.
    #[must_use]
    pub fn find_pair(&self, before_path: &str) -> Option<(&SpecFile, &SpecFile)> {
        self.pairs().find(|(b, _)| b.relative_path == before_path)
    }
}

/// A successfully applied rename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    pub from: String,
    pub to: String,
}

/// A rename that failed without aborting its batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFailure {
    pub from: String,
    pub to: Option<String>,
    pub code: String,
    pub message: String,
}

impl RenameFailure {
    #[must_use]
    pub fn from_error(from: &str, error: &crate::Error) -> Self {
        let (code, to) = match error {
            crate::Error::RenameConflict { to, .. } => ("CONFLICT", Some(to.clone())),
            crate::Error::UnknownSpec(_) => ("UNKNOWN", None),
            crate::Error::Parse(_) => ("PARSE", None),
            _ => ("IO", None),
        };
        Self {
            from: from.to_string(),
            to,
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result of applying a batch of renames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenameReport {
    pub applied: Vec<RenameOutcome>,
    pub failures: Vec<RenameFailure>,
}

impl RenameReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
