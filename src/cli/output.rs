//! Output formatting for CLI

use crate::models::{MigrationPlan, RenameReport, SpecSegment};
use crate::services::steps::StepMachine;
use crate::{MigrationStep, Result};
use std::fmt::Write;

/// Render segments with highlighted parts wrapped in brackets
#[must_use]
pub fn format_segments(segments: &[SpecSegment]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.highlight {
                format!("[{}]", s.text)
            } else {
                s.text.clone()
            }
        })
        .collect()
}

/// Format a plan as human-readable text
#[must_use]
pub fn format_plan_text(plan: &MigrationPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Integration folder: {}", plan.integration_folder);
    let _ = writeln!(out, "Component folder:   {}", plan.component_folder);
    out.push('\n');

    if plan.before.is_empty() {
        out.push_str("No specs to rename.\n");
    } else {
        let _ = writeln!(out, "Specs to rename ({}):", plan.before.len());
        let width = plan
            .before
            .iter()
            .map(|s| format_segments(&s.segments).len())
            .max()
            .unwrap_or(0);
        for (before, after) in plan.pairs() {
            let _ = writeln!(
                out,
                "  {:<width$}  ->  {}  ({})",
                format_segments(&before.segments),
                format_segments(&after.segments),
                before.testing_mode,
            );
        }
    }

    if plan.kept_in_place > 0 {
        let _ = writeln!(
            out,
            "{} spec(s) keep their names (custom testFiles).",
            plan.kept_in_place
        );
    }

    if !plan.scan_errors.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Unreadable directories ({}):", plan.scan_errors.len());
        for error in &plan.scan_errors {
            let _ = writeln!(out, "  {}  ({}: {})", error.path, error.code, error.message);
        }
    }

    if !plan.manual_details.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Needs manual migration ({}):", plan.manual_details.len());
        for manual in &plan.manual_details {
            let _ = writeln!(
                out,
                "  {}  ({}, {})",
                manual.path,
                manual.testing_mode,
                manual.reason.describe()
            );
        }
    }

    out
}

/// Format a plan as JSON
pub fn format_plan_json(plan: &MigrationPlan) -> Result<String> {
    serde_json::to_string_pretty(plan)
        .map_err(|e| crate::Error::InvalidInput(format!("cannot serialize plan: {e}")))
}

#[must_use]
pub fn format_report(report: &RenameReport) -> String {
    let mut out = String::new();
    for applied in &report.applied {
        let _ = writeln!(out, "renamed  {} -> {}", applied.from, applied.to);
    }
    for failure in &report.failures {
        let _ = writeln!(out, "failed   {}: {}", failure.from, failure.message);
    }
    let _ = writeln!(
        out,
        "{} renamed, {} failed",
        report.applied.len(),
        report.failures.len()
    );
    out
}

/// One line per step, marking the current one and any blocked ones
#[must_use]
pub fn format_steps(machine: &StepMachine) -> String {
    let mut out = String::new();
    for step in MigrationStep::ALL {
        let marker = if step == machine.current() {
            ">"
        } else if step <= machine.furthest() {
            "*"
        } else {
            " "
        };
        let _ = write!(out, "{marker} {step}");
        if let Some(reason) = machine.gate(step) {
            let _ = write!(out, "  (blocked: {reason})");
        }
        out.push('\n');
    }
    out
}
