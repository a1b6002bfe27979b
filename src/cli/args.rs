//! CLI argument parsing

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub command: Command,
}

#[derive(Debug, Clone)]
pub enum Command {
    Plan(PlanArgs),
    Config(ConfigArgs),
    Apply(ApplyArgs),
    Step(StepArgs),
}

#[derive(Debug, Clone, Default)]
pub struct PlanArgs {
    pub path: String,
    pub config: Option<String>,
    pub json: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigArgs {
    pub path: String,
    pub config: Option<String>,
    pub before: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ApplyArgs {
    pub path: String,
    pub config: Option<String>,
    pub dry_run: bool,
    pub write_config: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StepAction {
    #[default]
    Show,
    Advance,
    Back,
    Goto(String),
    Resolve(String),
}

#[derive(Debug, Clone, Default)]
pub struct StepArgs {
    pub path: String,
    pub config: Option<String>,
    pub session: String,
    pub action: StepAction,
}

/// Parse command line arguments
pub fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    if args.len() < 2 {
        return Err("No command specified".to_string());
    }

    let command = match args[1].as_str() {
        "plan" => Command::Plan(parse_plan_args(&args[2..])?),
        "config" => Command::Config(parse_config_args(&args[2..])?),
        "apply" => Command::Apply(parse_apply_args(&args[2..])?),
        "step" => Command::Step(parse_step_args(&args[2..])?),
        _ => return Err(format!("Unknown command: {}", args[1])),
    };

    Ok(CliArgs { command })
}

fn value_of(args: &[String], i: usize, flag: &str) -> Result<String, String> {
    args.get(i)
        .cloned()
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn set_path(path: &mut String, arg: &str) -> Result<(), String> {
    if path.is_empty() {
        *path = arg.to_string();
        Ok(())
    } else {
        Err(format!("Unexpected argument: {arg}"))
    }
}

fn require_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        Err("Missing required argument: PROJECT".to_string())
    } else {
        Ok(())
    }
}

fn parse_plan_args(args: &[String]) -> Result<PlanArgs, String> {
    let mut plan = PlanArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                plan.config = Some(value_of(args, i, "--config")?);
            }
            "--json" => plan.json = true,
            arg if !arg.starts_with("--") => set_path(&mut plan.path, arg)?,
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    require_path(&plan.path)?;
    Ok(plan)
}

fn parse_config_args(args: &[String]) -> Result<ConfigArgs, String> {
    let mut config = ConfigArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                config.config = Some(value_of(args, i, "--config")?);
            }
            "--before" => config.before = true,
            arg if !arg.starts_with("--") => set_path(&mut config.path, arg)?,
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    require_path(&config.path)?;
    Ok(config)
}

fn parse_apply_args(args: &[String]) -> Result<ApplyArgs, String> {
    let mut apply = ApplyArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                apply.config = Some(value_of(args, i, "--config")?);
            }
            "--dry-run" => apply.dry_run = true,
            "--write-config" => apply.write_config = true,
            "--quiet" => apply.quiet = true,
            arg if !arg.starts_with("--") => set_path(&mut apply.path, arg)?,
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    require_path(&apply.path)?;
    Ok(apply)
}

fn parse_step_args(args: &[String]) -> Result<StepArgs, String> {
    let mut step = StepArgs::default();
    let mut action: Option<StepAction> = None;
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                step.config = Some(value_of(args, i, "--config")?);
            }
            "--session" => {
                i += 1;
                step.session = value_of(args, i, "--session")?;
            }
            arg if !arg.starts_with("--") => {
                if step.path.is_empty() {
                    step.path = arg.to_string();
                } else if action.is_none() {
                    action = Some(match arg {
                        "show" => StepAction::Show,
                        "advance" | "next" => StepAction::Advance,
                        "back" => StepAction::Back,
                        "goto" => {
                            i += 1;
                            StepAction::Goto(value_of(args, i, "goto")?)
                        }
                        "resolve" => {
                            i += 1;
                            StepAction::Resolve(value_of(args, i, "resolve")?)
                        }
                        other => return Err(format!("Unknown step action: {other}")),
                    });
                } else {
                    return Err(format!("Unexpected argument: {arg}"));
                }
            }
            _ => return Err(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    require_path(&step.path)?;
    if step.session.is_empty() {
        return Err("--session is required for step command".to_string());
    }
    step.action = action.unwrap_or_default();
    Ok(step)
}
