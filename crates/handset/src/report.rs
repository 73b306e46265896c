//! Scenario Report
//!
//! Collects what happened while a scenario ran: each step's outcome,
//! screenshots attached along the way, and verification mismatches that did
//! not stop the scenario but still fail it.
//!
//! ```text
//! hard failure  ──► step Failed, remaining steps Skipped, scenario Failed
//! verify false  ──► step Passed, mismatch recorded,       scenario Failed
//! ```

use crate::driver::{RepositoryPath, Screenshot};
use crate::result::DeviceResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Step result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step completed
    Passed,
    /// Step failed hard
    Failed,
    /// Step was not run because an earlier step failed
    Skipped,
}

/// Scenario result status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioStatus {
    /// Every step passed and every verification held
    Passed,
    /// A step failed or a verification did not hold
    Failed,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Outcome of one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step phrase as written
    pub phrase: String,
    /// Step status
    pub status: StepStatus,
    /// Execution time
    pub duration: Duration,
    /// Error message if failed
    pub error: Option<String>,
    /// Result of a verify step
    pub verified: Option<bool>,
}

impl StepRecord {
    /// Create a passing step record
    #[must_use]
    pub fn passed(phrase: impl Into<String>, duration: Duration) -> Self {
        Self {
            phrase: phrase.into(),
            status: StepStatus::Passed,
            duration,
            error: None,
            verified: None,
        }
    }

    /// Create a failing step record
    #[must_use]
    pub fn failed(phrase: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            status: StepStatus::Failed,
            duration,
            error: Some(error.into()),
            verified: None,
        }
    }

    /// Create a skipped step record
    #[must_use]
    pub fn skipped(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            status: StepStatus::Skipped,
            duration: Duration::ZERO,
            error: None,
            verified: None,
        }
    }

    /// Attach a verify result
    #[must_use]
    pub const fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }
}

/// Screenshot attached to the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// File name used when the report is written out
    pub name: String,
    /// Repository path the image was also saved to
    pub repository_path: Option<String>,
    /// Capture time
    pub captured_at: DateTime<Utc>,
    /// Image size in bytes
    pub size_bytes: usize,
    /// Width and height read from the PNG header
    pub dimensions: Option<(u32, u32)>,
    /// PNG data
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// A verification that did not hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    /// Index of the step that verified
    pub step_index: usize,
    /// What was expected
    pub message: String,
}

/// Report for a single scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    /// Unique run id
    pub id: Uuid,
    /// Scenario name
    pub scenario: String,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// Step records in execution order
    pub steps: Vec<StepRecord>,
    /// Attached screenshots
    pub attachments: Vec<Attachment>,
    /// Soft verification failures
    pub verification_failures: Vec<VerificationFailure>,
}

impl ScenarioReport {
    /// Create an empty report
    #[must_use]
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            scenario: scenario.into(),
            started_at: Utc::now(),
            steps: Vec::new(),
            attachments: Vec::new(),
            verification_failures: Vec::new(),
        }
    }

    /// Record a finished step
    pub fn record_step(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    /// Record a verification mismatch against the step currently running
    pub fn record_verification_failure(&mut self, message: impl Into<String>) {
        self.verification_failures.push(VerificationFailure {
            step_index: self.steps.len(),
            message: message.into(),
        });
    }

    /// Attach a screenshot
    pub fn attach_screenshot(&mut self, screenshot: Screenshot, saved_to: Option<&RepositoryPath>) {
        let name = format!("screenshot-{:03}.png", self.attachments.len() + 1);
        self.attachments.push(Attachment {
            name,
            repository_path: saved_to.map(ToString::to_string),
            captured_at: DateTime::<Utc>::from(screenshot.timestamp),
            size_bytes: screenshot.size_bytes(),
            dimensions: screenshot.dimensions(),
            data: screenshot.data,
        });
    }

    /// Overall status
    #[must_use]
    pub fn status(&self) -> ScenarioStatus {
        let step_failed = self.steps.iter().any(|s| s.status == StepStatus::Failed);
        let unverified = self.steps.iter().any(|s| s.verified == Some(false));
        if step_failed || unverified || !self.verification_failures.is_empty() {
            ScenarioStatus::Failed
        } else {
            ScenarioStatus::Passed
        }
    }

    /// Count steps with the given status
    #[must_use]
    pub fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }

    /// Total time spent in steps
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> DeviceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write `<id>/report.json` and the attachments under `dir`
    pub fn write_to(&self, dir: &Path) -> DeviceResult<PathBuf> {
        let run_dir = dir.join(self.id.to_string());
        fs::create_dir_all(&run_dir)?;
        for attachment in &self.attachments {
            fs::write(run_dir.join(&attachment.name), &attachment.data)?;
        }
        let report_path = run_dir.join("report.json");
        fs::write(&report_path, self.to_json()?)?;
        Ok(report_path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_empty_report_passes() {
            let report = ScenarioReport::new("empty");
            assert!(report.status().is_passed());
        }

        #[test]
        fn test_failed_step_fails_scenario() {
            let mut report = ScenarioReport::new("s");
            report.record_step(StepRecord::passed("I scroll up", ms(5)));
            report.record_step(StepRecord::failed("I hide keyboard", ms(3), "no keyboard"));
            report.record_step(StepRecord::skipped("I swipe left"));
            assert_eq!(report.status(), ScenarioStatus::Failed);
            assert_eq!(report.count(StepStatus::Passed), 1);
            assert_eq!(report.count(StepStatus::Failed), 1);
            assert_eq!(report.count(StepStatus::Skipped), 1);
            assert_eq!(report.total_duration(), ms(8));
        }

        #[test]
        fn test_verification_failure_fails_scenario() {
            let mut report = ScenarioReport::new("s");
            report.record_verification_failure("timezone should be UTC");
            report.record_step(
                StepRecord::passed("the device timezone should be \"UTC\"", ms(1))
                    .with_verified(false),
            );
            assert_eq!(report.count(StepStatus::Failed), 0);
            assert_eq!(report.status(), ScenarioStatus::Failed);
            assert_eq!(report.verification_failures[0].step_index, 0);
        }

        #[test]
        fn test_unverified_step_alone_fails_scenario() {
            let mut report = ScenarioReport::new("s");
            report.record_step(
                StepRecord::passed("the banner should be shown", ms(1)).with_verified(false),
            );
            assert!(report.verification_failures.is_empty());
            assert_eq!(report.status(), ScenarioStatus::Failed);
        }
    }

    mod attachment_tests {
        use super::*;

        #[test]
        fn test_attach_names_sequentially() {
            let mut report = ScenarioReport::new("s");
            report.attach_screenshot(Screenshot::new(vec![1, 2, 3]), None);
            let path = RepositoryPath::new("PRIVATE:x.png").unwrap();
            report.attach_screenshot(Screenshot::new(vec![4]), Some(&path));

            assert_eq!(report.attachments[0].name, "screenshot-001.png");
            assert_eq!(report.attachments[1].name, "screenshot-002.png");
            assert!(report.attachments[0].repository_path.is_none());
            assert_eq!(
                report.attachments[1].repository_path.as_deref(),
                Some("PRIVATE:x.png")
            );
            assert_eq!(report.attachments[0].size_bytes, 3);
            assert_eq!(report.attachments[0].dimensions, None);
        }

        #[test]
        fn test_attach_reads_png_dimensions() {
            let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
            data.extend_from_slice(b"IHDR");
            data.extend_from_slice(&1080_u32.to_be_bytes());
            data.extend_from_slice(&2400_u32.to_be_bytes());

            let mut report = ScenarioReport::new("s");
            report.attach_screenshot(Screenshot::new(data), None);
            assert_eq!(report.attachments[0].dimensions, Some((1080, 2400)));
            let json = report.to_json().unwrap();
            assert!(json.contains("1080"));
        }
    }

    mod output_tests {
        use super::*;

        #[test]
        fn test_json_omits_image_bytes() {
            let mut report = ScenarioReport::new("json");
            report.attach_screenshot(Screenshot::new(vec![9; 16]), None);
            let json = report.to_json().unwrap();
            assert!(json.contains("\"scenario\": \"json\""));
            assert!(json.contains("screenshot-001.png"));
            assert!(!json.contains("\"data\""));
        }

        #[test]
        fn test_write_to_directory() {
            let tmp = tempfile::tempdir().unwrap();
            let mut report = ScenarioReport::new("files");
            report.attach_screenshot(Screenshot::new(vec![7; 4]), None);
            report.record_step(StepRecord::passed("I take a screenshot", ms(2)));

            let path = report.write_to(tmp.path()).unwrap();
            assert!(path.ends_with("report.json"));
            let run_dir = path.parent().unwrap();
            assert_eq!(
                fs::read(run_dir.join("screenshot-001.png")).unwrap(),
                vec![7; 4]
            );
            let parsed: serde_json::Value =
                serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(parsed["steps"][0]["status"], "Passed");
        }
    }
}
