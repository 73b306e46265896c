//! Step Registry
//!
//! Explicit table mapping compiled step patterns to typed handlers. The
//! built-in table is constructed once on first use and is read-only after
//! that; callers wanting extra steps build their own registry on top of
//! [`StepRegistry::with_builtin_steps`].
//!
//! Phrases are matched after their leading Gherkin keyword (`Given`, `When`,
//! `Then`, `And`, `But`, `*`) has been stripped. A phrase must match exactly
//! one pattern.
//!
//! Every built-in pattern is anchored at both ends. Older step libraries
//! left `I swipe right` and the `set`/`must`/`should` timezone steps open at
//! the end, so phrases with trailing text (`I swipe right twice`,
//! `I set timezone to "UTC" now`) used to bind there. Here they are
//! undefined and `handset check` reports them.

use crate::driver::DeviceDriver;
use crate::report::ScenarioReport;
use crate::result::{DeviceError, DeviceResult};
use crate::steps;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

const KEYWORDS: [&str; 6] = ["Given ", "When ", "Then ", "And ", "But ", "* "];

/// Errors from matching and running a step phrase
#[derive(Debug, Error)]
pub enum StepError {
    /// No pattern matches the phrase
    #[error("No step matches '{phrase}'")]
    Undefined {
        /// Phrase that was looked up
        phrase: String,
    },

    /// More than one pattern matches the phrase
    #[error("Step '{phrase}' is ambiguous, it matches: {}", .candidates.join(", "))]
    Ambiguous {
        /// Phrase that was looked up
        phrase: String,
        /// Names of the matching steps
        candidates: Vec<String>,
    },

    /// A pattern failed to compile
    #[error("Invalid step pattern '{pattern}': {source}")]
    Pattern {
        /// Pattern source
        pattern: String,
        /// Regex error
        #[source]
        source: regex::Error,
    },

    /// The step ran and failed hard
    #[error(transparent)]
    Failed(#[from] DeviceError),
}

/// What a handler produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed
    Done,
    /// Verify step result
    Verified(bool),
}

/// State a step runs against: the session handle and the scenario report
pub struct StepContext<'a> {
    /// Device session
    pub driver: &'a mut dyn DeviceDriver,
    /// Report for the running scenario
    pub report: &'a mut ScenarioReport,
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("scenario", &self.report.scenario)
            .finish_non_exhaustive()
    }
}

/// Values captured from a phrase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs(Vec<String>);

impl StepArgs {
    /// Wrap captured values
    #[must_use]
    pub fn new(values: Vec<String>) -> Self {
        Self(values)
    }

    /// Captured string at `index`
    pub fn string(&self, index: usize) -> DeviceResult<&str> {
        self.0
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| DeviceError::invalid_argument(format!("missing argument {index}")))
    }

    /// Captured non-negative integer at `index`. Whole-number decimals such
    /// as `5.0` are accepted.
    pub fn integer(&self, index: usize) -> DeviceResult<u64> {
        let raw = self.string(index)?.trim();
        if let Ok(value) = raw.parse::<u64>() {
            return Ok(value);
        }
        match raw.parse::<f64>() {
            Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
                Ok(value as u64)
            }
            _ => Err(DeviceError::invalid_argument(format!(
                "'{raw}' is not a whole number"
            ))),
        }
    }

    /// Number of captured values
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Step handler
pub type StepFn = fn(&mut StepContext<'_>, &StepArgs) -> DeviceResult<StepOutcome>;

/// A registered step
#[derive(Clone)]
pub struct StepDefinition {
    name: &'static str,
    pattern: Regex,
    handler: StepFn,
}

impl StepDefinition {
    /// Handler name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Pattern source
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// A phrase resolved to its step
#[derive(Debug)]
pub struct StepMatch<'r> {
    /// Matched step
    pub definition: &'r StepDefinition,
    /// Captured values
    pub args: StepArgs,
}

/// Pattern → handler table
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry holding the built-in device steps
    #[allow(clippy::expect_used)]
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<StepRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| {
            Self::with_builtin_steps().expect("built-in step patterns are valid")
        })
    }

    /// Registry holding the built-in device steps
    pub fn with_builtin_steps() -> Result<Self, StepError> {
        let mut registry = Self::new();
        register_builtin_steps(&mut registry)?;
        Ok(registry)
    }

    /// Add a step
    pub fn register(
        &mut self,
        name: &'static str,
        pattern: &str,
        handler: StepFn,
    ) -> Result<&mut Self, StepError> {
        let pattern = Regex::new(pattern).map_err(|source| StepError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.definitions.push(StepDefinition {
            name,
            pattern,
            handler,
        });
        Ok(self)
    }

    /// Registered steps in registration order
    #[must_use]
    pub fn definitions(&self) -> &[StepDefinition] {
        &self.definitions
    }

    /// Resolve a phrase to exactly one step
    pub fn find(&self, phrase: &str) -> Result<StepMatch<'_>, StepError> {
        let text = strip_keyword(phrase);
        let mut matches = self.definitions.iter().filter_map(|definition| {
            definition.pattern.captures(text).map(|caps| {
                let args = caps
                    .iter()
                    .skip(1)
                    .map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()))
                    .collect();
                (definition, StepArgs::new(args))
            })
        });

        let Some((definition, args)) = matches.next() else {
            return Err(StepError::Undefined {
                phrase: phrase.to_string(),
            });
        };
        let others: Vec<String> = matches.map(|(d, _)| d.name.to_string()).collect();
        if !others.is_empty() {
            let mut candidates = vec![definition.name.to_string()];
            candidates.extend(others);
            return Err(StepError::Ambiguous {
                phrase: phrase.to_string(),
                candidates,
            });
        }
        Ok(StepMatch { definition, args })
    }

    /// Resolve and run a phrase
    pub fn execute(
        &self,
        ctx: &mut StepContext<'_>,
        phrase: &str,
    ) -> Result<StepOutcome, StepError> {
        let step = self.find(phrase)?;
        debug!(step = step.definition.name, args = ?step.args, "executing step");
        Ok((step.definition.handler)(ctx, &step.args)?)
    }
}

/// Remove a leading Gherkin keyword and surrounding whitespace
#[must_use]
pub fn strip_keyword(phrase: &str) -> &str {
    let phrase = phrase.trim();
    KEYWORDS
        .iter()
        .find_map(|kw| phrase.strip_prefix(kw))
        .map_or(phrase, str::trim_start)
}

fn done(result: DeviceResult<()>) -> DeviceResult<StepOutcome> {
    result.map(|()| StepOutcome::Done)
}

fn register_builtin_steps(registry: &mut StepRegistry) -> Result<(), StepError> {
    registry
        .register(
            "rotate_to_landscape",
            r"^I rotate the device to landscape$",
            |ctx, _| done(steps::rotate_to_landscape(ctx.driver)),
        )?
        .register(
            "rotate_to_portrait",
            r"^I rotate the device to portrait$",
            |ctx, _| done(steps::rotate_to_portrait(ctx.driver)),
        )?
        .register("rotate_device", r"^I rotate the device$", |ctx, _| {
            done(steps::rotate_device(ctx.driver))
        })?
        .register(
            "set_location_by_coordinates",
            r#"^I set the device location to the coordinates "(.*?)"$"#,
            |ctx, args| done(steps::set_location_by_coordinates(ctx.driver, args.string(0)?)),
        )?
        .register(
            "set_location_by_address",
            r#"^I set the device location to the address "(.*?)"$"#,
            |ctx, args| done(steps::set_location_by_address(ctx.driver, args.string(0)?)),
        )?
        .register(
            "assert_location_coordinates",
            r#"^the device coordinates must be "(.*?)"$"#,
            |ctx, args| done(steps::assert_location_coordinates(ctx.driver, args.string(0)?)),
        )?
        .register(
            "verify_location_coordinates",
            r#"^the device coordinates should be "(.*?)"$"#,
            |ctx, args| {
                let expected = args.string(0)?;
                let verified = steps::verify_location_coordinates(ctx.driver, expected);
                if !verified {
                    ctx.report.record_verification_failure(format!(
                        "device coordinates should be {expected}"
                    ));
                }
                Ok(StepOutcome::Verified(verified))
            },
        )?
        .register("reset_location", r"^I reset the device location$", |ctx, _| {
            done(steps::reset_location(ctx.driver))
        })?
        .register(
            "go_to_home_screen",
            r"^I go to the device home screen$",
            |ctx, _| done(steps::go_to_home_screen(ctx.driver)),
        )?
        .register("swipe_left", r"^I swipe left$", |ctx, _| {
            done(steps::swipe_left(ctx.driver))
        })?
        .register("swipe_right", r"^I swipe right$", |ctx, _| {
            done(steps::swipe_right(ctx.driver))
        })?
        .register("scroll_up", r"^I scroll up$", |ctx, _| {
            done(steps::scroll_up(ctx.driver))
        })?
        .register("scroll_down", r"^I scroll down$", |ctx, _| {
            done(steps::scroll_down(ctx.driver))
        })?
        .register(
            "lock_device",
            r#"^I lock the device for "(\d*\.?\d*)" seconds$"#,
            |ctx, args| done(steps::lock_device(ctx.driver, args.integer(0)?)),
        )?
        .register("set_timezone", r#"^I set timezone to "(.*?)"$"#, |ctx, args| {
            done(steps::set_timezone(ctx.driver, args.string(0)?))
        })?
        .register(
            "assert_timezone",
            r#"^the device timezone must be "(.*?)"$"#,
            |ctx, args| done(steps::assert_timezone(ctx.driver, args.string(0)?)),
        )?
        .register(
            "verify_timezone",
            r#"^the device timezone should be "(.*?)"$"#,
            |ctx, args| {
                let expected = args.string(0)?;
                let verified = steps::verify_timezone(ctx.driver, expected);
                if !verified {
                    ctx.report.record_verification_failure(format!(
                        "device timezone should be {expected}"
                    ));
                }
                Ok(StepOutcome::Verified(verified))
            },
        )?
        .register("reset_timezone", r"^I reset the device timezone$", |ctx, _| {
            done(steps::reset_timezone(ctx.driver))
        })?
        .register("take_screenshot", r"^I take a screenshot$", |ctx, _| {
            done(steps::take_screenshot(ctx.driver, ctx.report))
        })?
        .register(
            "take_screenshot_and_save",
            r#"^I take a screenshot and save to "(.*?)"$"#,
            |ctx, args| {
                done(steps::take_screenshot_and_save(
                    ctx.driver,
                    ctx.report,
                    args.string(0)?,
                ))
            },
        )?
        .register("hide_keyboard", r"^I hide keyboard$", |ctx, _| {
            done(steps::hide_keyboard(ctx.driver))
        })?;
    Ok(())
}
