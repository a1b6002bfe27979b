//! Legacy `testFiles` / `ignoreTestFiles` globs.
//!
//! Globs are matched against paths relative to a legacy spec folder. A glob
//! without a `/` matches the file name alone. `{a,b}` alternatives are
//! expanded before the patterns are compiled.

use crate::models::ManualReason;
use crate::services::config::LegacyConfig;
use glob::{MatchOptions, Pattern, PatternError};
use serde_json::Value;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// One legacy glob, possibly with brace alternatives
#[derive(Debug, Clone)]
pub struct SpecGlob {
    source: String,
    alternatives: Vec<Pattern>,
    match_base: bool,
}

impl SpecGlob {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        let alternatives = expand_braces(source)
            .iter()
            .map(|p| Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            source: source.to_string(),
            alternatives,
            match_base: !source.contains('/'),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `path` (relative to the glob's folder) matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let target = if self.match_base {
            path.rsplit('/').next().unwrap_or(path)
        } else {
            path
        };
        self.alternatives
            .iter()
            .any(|p| p.matches_with(target, MATCH_OPTIONS))
    }
}

/// Which files under a legacy folder count as specs
#[derive(Debug, Clone, Default)]
pub struct TestFileFilter {
    custom: bool,
    include: Vec<SpecGlob>,
    exclude: Vec<SpecGlob>,
}

impl TestFileFilter {
    #[must_use]
    pub fn from_config(config: &LegacyConfig) -> Self {
        let custom = config.custom_test_files();
        let include = if custom {
            globs(config.get("testFiles"))
        } else {
            Vec::new()
        };
        Self {
            custom,
            include,
            exclude: globs(config.get("ignoreTestFiles")),
        }
    }

    /// `testFiles` narrows the legacy default. Specs then keep their names,
    /// since a `.cy` rename would take them out of the copied glob.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Why `relative` is not a spec, or `None` when it is one.
    #[must_use]
    pub fn rejection(&self, relative: &str) -> Option<ManualReason> {
        if self.exclude.iter().any(|g| g.matches(relative)) {
            Some(ManualReason::IgnoredTestFile)
        } else if self.custom && !self.include.iter().any(|g| g.matches(relative)) {
            Some(ManualReason::OutsideTestFiles)
        } else {
            None
        }
    }
}

fn globs(value: Option<&Value>) -> Vec<SpecGlob> {
    let sources: Vec<&str> = match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    sources
        .into_iter()
        .filter_map(|source| match SpecGlob::new(source) {
            Ok(glob) => Some(glob),
            Err(e) => {
                log::warn!("ignoring invalid test file glob '{source}': {e}");
                None
            }
        })
        .collect()
}

/// `a/{b,c{d,e}}.js` becomes `a/b.js`, `a/cd.js` and `a/ce.js`. Unbalanced
/// braces are kept literally.
#[must_use]
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };

    let mut depth = 0usize;
    let mut start = open + 1;
    let mut parts = Vec::new();
    for (offset, c) in pattern[open..].char_indices() {
        let i = open + offset;
        match c {
            '{' => depth += 1,
            ',' if depth == 1 => {
                parts.push(&pattern[start..i]);
                start = i + 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    parts.push(&pattern[start..i]);
                    let (prefix, suffix) = (&pattern[..open], &pattern[i + 1..]);
                    return parts
                        .iter()
                        .flat_map(|part| expand_braces(&format!("{prefix}{part}{suffix}")))
                        .collect();
                }
            }
            _ => {}
        }
    }

    vec![pattern.to_string()]
}
