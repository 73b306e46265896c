//! Scenario runner.
//!
//! Runs step phrases in order against one device session. The first hard
//! failure stops the scenario and the remaining steps are skipped; verify
//! mismatches are recorded and the scenario keeps going.

use crate::driver::DeviceDriver;
use crate::registry::{StepContext, StepError, StepOutcome, StepRegistry};
use crate::report::{ScenarioReport, StepRecord};
use std::time::Instant;
use tracing::{info, warn};

const SCENARIO_HEADER: &str = "Scenario:";

/// A named sequence of step phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario name
    pub name: String,
    /// Step phrases, keywords included
    pub steps: Vec<String>,
}

impl Scenario {
    /// Create a scenario
    #[must_use]
    pub fn new(name: impl Into<String>, steps: Vec<String>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    /// Split a step script into scenarios.
    ///
    /// One phrase per line. Blank lines and `#` comments are ignored, and a
    /// `Scenario: <name>` line starts a new scenario. Steps before the first
    /// header belong to a scenario called `default_name`.
    #[must_use]
    pub fn parse_script(text: &str, default_name: &str) -> Vec<Self> {
        let mut scenarios: Vec<Self> = Vec::new();
        let mut current = Self::new(default_name, Vec::new());

        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix(SCENARIO_HEADER) {
                if !current.steps.is_empty() {
                    scenarios.push(current);
                }
                current = Self::new(name.trim(), Vec::new());
                continue;
            }
            current.steps.push(line.to_string());
        }
        if !current.steps.is_empty() {
            scenarios.push(current);
        }
        scenarios
    }
}

/// Executes scenarios through a step registry
#[derive(Debug, Clone, Copy)]
pub struct ScenarioRunner<'r> {
    registry: &'r StepRegistry,
}

impl Default for ScenarioRunner<'static> {
    fn default() -> Self {
        Self::new(StepRegistry::global())
    }
}

impl<'r> ScenarioRunner<'r> {
    /// Create a runner over `registry`
    #[must_use]
    pub const fn new(registry: &'r StepRegistry) -> Self {
        Self { registry }
    }

    /// Run every step of `scenario` against `driver`
    pub fn run(&self, driver: &mut dyn DeviceDriver, scenario: &Scenario) -> ScenarioReport {
        let mut report = ScenarioReport::new(&scenario.name);
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "running scenario");

        let mut aborted = false;
        for phrase in &scenario.steps {
            if aborted {
                report.record_step(StepRecord::skipped(phrase));
                continue;
            }

            let start = Instant::now();
            let outcome = {
                let mut ctx = StepContext {
                    driver: &mut *driver,
                    report: &mut report,
                };
                self.registry.execute(&mut ctx, phrase)
            };
            let elapsed = start.elapsed();

            let record = match outcome {
                Ok(StepOutcome::Done) => StepRecord::passed(phrase, elapsed),
                Ok(StepOutcome::Verified(verified)) => {
                    if !verified {
                        warn!(step = %phrase, "verification did not hold, continuing");
                        let step_index = report.steps.len();
                        let recorded = report
                            .verification_failures
                            .iter()
                            .any(|f| f.step_index == step_index);
                        if !recorded {
                            report.record_verification_failure(format!("'{phrase}' did not hold"));
                        }
                    }
                    StepRecord::passed(phrase, elapsed).with_verified(verified)
                }
                Err(e) => {
                    warn!(step = %phrase, error = %e, "step failed, stopping scenario");
                    aborted = true;
                    StepRecord::failed(phrase, elapsed, e.to_string())
                }
            };
            info!(step = %phrase, status = ?record.status, "step finished");
            report.record_step(record);
        }

        info!(scenario = %scenario.name, status = ?report.status(), "scenario finished");
        report
    }

    /// Resolve every phrase without touching a device. Returns the line
    /// index and error of each phrase that does not match exactly one step.
    pub fn check(&self, scenario: &Scenario) -> Vec<(usize, StepError)> {
        scenario
            .steps
            .iter()
            .enumerate()
            .filter_map(|(i, phrase)| self.registry.find(phrase).err().map(|e| (i, e)))
            .collect()
    }
}
