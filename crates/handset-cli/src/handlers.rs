//! Subcommand handlers

use crate::commands::{CheckArgs, ListArgs, ListFormat, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use console::style;
use handset::{
    DeviceDriver, MockDevice, Scenario, ScenarioReport, ScenarioRunner, SessionConfig,
    StepRegistry, StepStatus,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const INLINE_SCENARIO: &str = "inline";

#[derive(Debug, Serialize)]
struct StepListing<'a> {
    name: &'a str,
    pattern: &'a str,
}

/// Render the registered steps
pub fn render_step_list(registry: &StepRegistry, format: ListFormat) -> CliResult<String> {
    let listings: Vec<StepListing<'_>> = registry
        .definitions()
        .iter()
        .map(|d| StepListing {
            name: d.name(),
            pattern: d.pattern(),
        })
        .collect();

    match format {
        ListFormat::Json => serde_json::to_string_pretty(&listings)
            .map_err(|e| CliError::invalid_argument(format!("cannot encode step list: {e}"))),
        ListFormat::Text => {
            let width = listings.iter().map(|l| l.name.len()).max().unwrap_or(0);
            let mut out = String::new();
            for listing in &listings {
                out.push_str(&format!("{:<width$}  {}\n", listing.name, listing.pattern));
            }
            Ok(out)
        }
    }
}

/// `handset list`
pub fn run_list(args: &ListArgs) -> CliResult<()> {
    print!("{}", render_step_list(StepRegistry::global(), args.format)?);
    Ok(())
}

/// Read a script file into scenarios named after the file
pub fn load_script(path: &Path) -> CliResult<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)?;
    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(INLINE_SCENARIO);
    Ok(Scenario::parse_script(&text, default_name))
}

/// `handset check`
pub fn run_check(config: &CliConfig, args: &CheckArgs) -> CliResult<()> {
    let scenarios = load_script(&args.script)?;
    let runner = ScenarioRunner::default();

    let mut problems = 0;
    let mut steps = 0;
    for scenario in &scenarios {
        steps += scenario.steps.len();
        for (index, error) in runner.check(scenario) {
            problems += 1;
            println!(
                "{} {} step {}: {error}",
                style("✗").red(),
                scenario.name,
                index + 1
            );
        }
    }

    if problems > 0 {
        return Err(CliError::InvalidScript { count: problems });
    }
    if !config.verbosity.is_quiet() {
        println!(
            "{} {} scenario(s), {steps} step(s) resolve",
            style("✓").green(),
            scenarios.len()
        );
    }
    Ok(())
}

/// `handset run`
pub fn run_scenarios(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let mut scenarios = match &args.script {
        Some(path) => load_script(path)?,
        None => Vec::new(),
    };
    if !args.step.is_empty() {
        scenarios.push(Scenario::new(INLINE_SCENARIO, args.step.clone()));
    }
    if scenarios.is_empty() {
        return Err(CliError::invalid_argument("no steps to run"));
    }

    let session = load_session_config(args.config.as_deref())?;
    let report_dir = args
        .report_dir
        .clone()
        .unwrap_or_else(|| session.report_dir.clone());

    let mut device = open_device(args.mock, &session)?;
    let runner = ScenarioRunner::default();

    let mut failed = 0;
    for scenario in &scenarios {
        let report = runner.run(device.as_mut(), scenario);
        if !report.status().is_passed() {
            failed += 1;
        }
        if !config.verbosity.is_quiet() {
            print_report(&report);
        }
        if !args.no_report {
            let path = write_report(&report, &report_dir)?;
            if config.verbosity.is_verbose() {
                println!("  report: {}", path.display());
            }
        }
    }

    if let Err(e) = device.close() {
        warn!(error = %e, "closing device failed");
    }

    let total = scenarios.len();
    if !config.verbosity.is_quiet() {
        let summary = format!("{} passed, {failed} failed", total - failed);
        if failed == 0 {
            println!("\n{}", style(summary).green().bold());
        } else {
            println!("\n{}", style(summary).red().bold());
        }
    }

    if failed > 0 {
        return Err(CliError::ScenarioFailed { failed, total });
    }
    Ok(())
}

fn load_session_config(path: Option<&Path>) -> CliResult<SessionConfig> {
    let config = match path {
        Some(path) => SessionConfig::load(path).map_err(|e| {
            CliError::config(format!("cannot load {}: {e}", path.display()))
        })?,
        None => SessionConfig::new(),
    };
    Ok(config.with_env_overrides())
}

fn open_device(mock: bool, session: &SessionConfig) -> CliResult<Box<dyn DeviceDriver>> {
    if mock {
        info!("using mock device");
        return Ok(Box::new(MockDevice::new()));
    }
    connect_remote(session)
}

#[cfg(feature = "remote")]
fn connect_remote(session: &SessionConfig) -> CliResult<Box<dyn DeviceDriver>> {
    let device = handset::RemoteDevice::connect(session)?;
    info!(session_id = device.session_id(), "connected to device cloud");
    Ok(Box::new(device))
}

#[cfg(not(feature = "remote"))]
fn connect_remote(_session: &SessionConfig) -> CliResult<Box<dyn DeviceDriver>> {
    Err(CliError::config(
        "remote devices not enabled. Rebuild with --features remote or pass --mock",
    ))
}

fn write_report(report: &ScenarioReport, dir: &Path) -> CliResult<PathBuf> {
    Ok(report.write_to(dir)?)
}

fn print_report(report: &ScenarioReport) {
    println!("{} {}", style("Scenario:").bold(), report.scenario);
    for step in &report.steps {
        let millis = step.duration.as_millis();
        match (step.status, step.verified) {
            (StepStatus::Passed, Some(false)) => println!(
                "  {} {} {}",
                style("!").yellow(),
                step.phrase,
                style("(verification failed)").yellow()
            ),
            (StepStatus::Passed, _) => println!(
                "  {} {} {}",
                style("✓").green(),
                step.phrase,
                style(format!("({millis}ms)")).dim()
            ),
            (StepStatus::Failed, _) => println!(
                "  {} {}\n      {}",
                style("✗").red(),
                step.phrase,
                style(step.error.as_deref().unwrap_or("failed")).red()
            ),
            (StepStatus::Skipped, _) => {
                println!("  {} {}", style("-").dim(), style(&step.phrase).dim());
            }
        }
    }
    if !report.attachments.is_empty() {
        println!("  {} screenshot(s) attached", report.attachments.len());
    }
}
