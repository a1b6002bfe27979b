//! Spec migration CLI (spec-migrate) - Main binary entry point

use rayon::prelude::*;
use spec_migrate::cli::args::{
    ApplyArgs, Command, ConfigArgs, PlanArgs, StepAction, StepArgs, parse_args,
};
use spec_migrate::cli::output::{format_plan_json, format_plan_text, format_report, format_steps};
use spec_migrate::io::session::{read_session, write_session};
use spec_migrate::models::{RenameFailure, RenameReport};
use spec_migrate::{Error, MigrationFacade, MigrationOptions, MigrationStep};
use std::path::Path;
use std::process;
use std::str::FromStr;

fn main() {
    // Initialize logger (controlled by RUST_LOG environment variable)
    // Example: RUST_LOG=debug spec-migrate plan ./my-project
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "--help" | "-h" => {
            print_help();
            return;
        }
        "--version" | "-v" => {
            print_version();
            return;
        }
        _ => {}
    }

    let cli_args = match parse_args(&args) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Use --help for usage information");
            process::exit(2);
        }
    };

    let exit_code = match &cli_args.command {
        Command::Plan(plan_args) => handle_plan(plan_args),
        Command::Config(config_args) => handle_config(config_args),
        Command::Apply(apply_args) => handle_apply(apply_args),
        Command::Step(step_args) => handle_step(step_args),
    };

    process::exit(exit_code);
}

fn exit_code_for(e: &Error) -> i32 {
    match e {
        Error::InvalidInput(_)
        | Error::Parse(_)
        | Error::InvalidTransition { .. }
        | Error::StepBlocked { .. }
        | Error::UnknownSpec(_) => 2,
        Error::PartialFailure { .. } | Error::RenameConflict { .. } => 3,
        Error::Io(_) => 4,
    }
}

fn open_facade(path: &str, config: Option<&str>) -> Result<MigrationFacade, i32> {
    let mut options = MigrationOptions::default();
    if let Some(config) = config {
        options.legacy_config_file = config.to_string();
    }

    MigrationFacade::open_local(path, options).map_err(|e| {
        eprintln!("Error: {e}");
        exit_code_for(&e)
    })
}

fn handle_plan(args: &PlanArgs) -> i32 {
    let facade = match open_facade(&args.path, args.config.as_deref()) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let plan = match facade.plan() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code_for(&e);
        }
    };

    if args.json {
        match format_plan_json(&plan) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return 4;
            }
        }
    } else {
        print!("{}", format_plan_text(&plan));
    }

    0
}

fn handle_config(args: &ConfigArgs) -> i32 {
    let facade = match open_facade(&args.path, args.config.as_deref()) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let text = if args.before {
        facade.config_before_text()
    } else {
        facade.config_after_text()
    };

    match text {
        Ok(text) => {
            print!("{text}");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code_for(&e)
        }
    }
}

fn handle_apply(args: &ApplyArgs) -> i32 {
    let facade = match open_facade(&args.path, args.config.as_deref()) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let pending = match facade.pending_renames() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code_for(&e);
        }
    };

    if args.dry_run {
        match facade.plan() {
            Ok(plan) => print!("{}", format_plan_text(&plan)),
            Err(e) => {
                eprintln!("Error: {e}");
                return exit_code_for(&e);
            }
        }
        return 0;
    }

    if !args.quiet {
        eprintln!("Renaming {} spec(s) in {}", pending.len(), args.path);
    }

    // Renames of distinct files are independent; issue them concurrently.
    let results: Vec<_> = pending
        .par_iter()
        .map(|path| (path.as_str(), facade.apply_rename(path)))
        .collect();

    let mut report = RenameReport::default();
    for (path, result) in results {
        match result {
            Ok(outcome) => report.applied.push(outcome),
            Err(e) => report.failures.push(RenameFailure::from_error(path, &e)),
        }
    }

    if !args.quiet {
        print!("{}", format_report(&report));
    }

    if args.write_config {
        match facade.write_new_config() {
            Ok(path) => {
                if !args.quiet {
                    eprintln!("Wrote {}", path.display());
                }
            }
            Err(e) => {
                eprintln!("Error: {e}");
                return exit_code_for(&e);
            }
        }
    }

    if report.is_clean() {
        0
    } else {
        let e = Error::PartialFailure {
            completed: report.applied.len(),
            failed: report.failures.len(),
        };
        eprintln!("{e}");
        exit_code_for(&e)
    }
}

fn handle_step(args: &StepArgs) -> i32 {
    let mut facade = match open_facade(&args.path, args.config.as_deref()) {
        Ok(f) => f,
        Err(code) => return code,
    };

    let session_path = Path::new(&args.session);
    match read_session(session_path) {
        Ok(Some(state)) => {
            if let Err(e) = facade.restore_session(&state) {
                eprintln!("Error: {e}");
                return exit_code_for(&e);
            }
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error reading session: {e}");
            return 4;
        }
    }

    let outcome = match &args.action {
        StepAction::Show => Ok(()),
        StepAction::Advance => facade.advance().map(|_| ()),
        StepAction::Back => facade.go_back().map(|_| ()),
        StepAction::Goto(label) => match MigrationStep::from_str(label) {
            Ok(step) => facade.set_step(step).map(|_| ()),
            Err(msg) => Err(Error::InvalidInput(msg)),
        },
        StepAction::Resolve(path) => facade.mark_manual_resolved(path),
    };

    let code = match &outcome {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {e}");
            exit_code_for(e)
        }
    };

    print!("{}", format_steps(facade.step_machine()));

    if let Err(e) = write_session(session_path, &facade.session_state()) {
        eprintln!("Error saving session: {e}");
        return 4;
    }

    code
}

fn print_help() {
    println!("Spec migration CLI (spec-migrate) - Move a legacy test project to the new layout");
    println!();
    println!("USAGE:");
    println!("    spec-migrate plan <PROJECT> [OPTIONS]");
    println!("    spec-migrate config <PROJECT> [OPTIONS]");
    println!("    spec-migrate apply <PROJECT> [OPTIONS]");
    println!("    spec-migrate step <PROJECT> --session <FILE> [ACTION]");
    println!();
    println!("COMMANDS:");
    println!("    plan      Show which specs will be renamed and which need manual work");
    println!("    config    Print the generated configuration (or the legacy one)");
    println!("    apply     Rename all auto-convertible specs");
    println!("    step      Drive the migration wizard one step at a time");
    println!();
    println!("GLOBAL OPTIONS:");
    println!("    -h, --help                 Show this help message");
    println!("    -v, --version              Show version information");
    println!("    --config <FILE>            Legacy config file (default: cypress.json)");
    println!();
    println!("PLAN OPTIONS:");
    println!("    --json                    Emit machine-readable output");
    println!();
    println!("CONFIG OPTIONS:");
    println!("    --before                  Print the canonical legacy config instead");
    println!();
    println!("APPLY OPTIONS:");
    println!("    --dry-run                 Show the renames without touching files");
    println!("    --write-config            Also write cypress.config.js (never overwrites)");
    println!("    --quiet                   Suppress non-error output");
    println!();
    println!("STEP ACTIONS:");
    println!("    show                      Print wizard progress (default)");
    println!("    advance                   Move to the next step");
    println!("    back                      Move to the previous step");
    println!("    goto <STEP>               Jump to an already reached step");
    println!("    resolve <PATH>            Mark a manual file as handled");
    println!();
    println!("EXAMPLES:");
    println!("    spec-migrate plan ./web --json");
    println!("    spec-migrate apply ./web --write-config");
    println!("    spec-migrate step ./web --session .migration.json advance");
}

fn print_version() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_DATE: &str = env!("GIT_DATE");
    const BUILD_TARGET: &str = env!("BUILD_TARGET");

    println!("spec-migrate {VERSION}");
    println!("Commit: {GIT_HASH} ({GIT_DATE})");
    println!("Target: {BUILD_TARGET}");
    println!("Steps: v{}", MigrationStep::VERSION);

    #[cfg(debug_assertions)]
    println!("Build: debug");
    #[cfg(not(debug_assertions))]
    println!("Build: release");
}
