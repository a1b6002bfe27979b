//! Test Project Migration Library
//!
//! This library migrates a test project written against the legacy flat
//! configuration and folder layout to the multi-mode layout: it classifies
//! spec files per testing mode, previews and applies renames, converts the
//! legacy configuration object into new configuration source, and tracks the
//! migration wizard's progress.

pub mod cli;
pub mod io;
pub mod models;
pub mod services;

pub use models::{
    ManualFile, ManualReason, MigrationPlan, MigrationStatus, NamingRegexps, RenameFailure,
    RenameOutcome, RenameReport, ScanError, SpecFile, SpecSegment, TestingMode,
};
pub use services::config::{LegacyConfig, ParseError};
pub use services::facade::{MigrationFacade, SessionRegistry, SessionState};
pub use services::steps::{MigrationStep, SessionSnapshot, StepMachine};

use std::result;

/// Custom error type for the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Invalid transition from '{from}': {reason}")]
    InvalidTransition { from: MigrationStep, reason: String },
    #[error("Step '{step}' is blocked: {reason}")]
    StepBlocked { step: MigrationStep, reason: String },
    #[error("Rename conflict: {to} already exists (from {from})")]
    RenameConflict { from: String, to: String },
    #[error("Unknown spec file: {0}")]
    UnknownSpec(String),
    #[error("Partial failure: {completed} completed, {failed} failed")]
    PartialFailure { completed: usize, failed: usize },
}

pub type Result<T> = result::Result<T, Error>;

/// Legacy configuration file name.
pub const LEGACY_CONFIG_FILE: &str = "cypress.json";

/// Configuration file written for the new format.
pub const NEW_CONFIG_FILE: &str = "cypress.config.js";

/// Options for a migration session
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// Legacy config file, relative to the project root.
    pub legacy_config_file: String,
    /// New config file, relative to the project root.
    pub new_config_file: String,
    /// Directory names never descended into while scanning.
    pub skip_dirs: Vec<String>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            legacy_config_file: LEGACY_CONFIG_FILE.to_string(),
            new_config_file: NEW_CONFIG_FILE.to_string(),
            skip_dirs: vec!["node_modules".to_string()],
        }
    }
}
