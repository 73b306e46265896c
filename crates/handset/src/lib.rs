//! Handset: BDD Step Bindings for Remote Mobile Devices
//!
//! Plain-language step phrases ("I swipe left", "the device timezone should
//! be \"UTC\"") drive a real or mocked handset. Each phrase resolves to one
//! facade function in [`steps`], which delegates to the device utilities in
//! [`device`], which talk to a [`DeviceDriver`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    HANDSET Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Step       │    │ steps::*   │            │
//! │   │ Runner     │───►│ Registry   │───►│ facade     │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │         │                                   ▼                   │
//! │         ▼                             ┌────────────┐            │
//! │   ┌────────────┐                      │ device::*  │            │
//! │   │ Scenario   │◄──── screenshots ────│ utilities  │            │
//! │   │ Report     │                      └─────┬──────┘            │
//! │   └────────────┘                            ▼                   │
//! │                          ┌──────────────────────────────────┐   │
//! │                          │ DeviceDriver                     │   │
//! │                          │  MockDevice | RemoteDevice (HTTP)│   │
//! │                          └──────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use handset::{MockDevice, Scenario, ScenarioRunner};
//!
//! let mut device = MockDevice::new();
//! let scenario = Scenario::new(
//!     "home",
//!     vec![
//!         "Given I go to the device home screen".to_string(),
//!         "Then I set timezone to \"Europe/Paris\"".to_string(),
//!         "And the device timezone should be \"Europe/Paris\"".to_string(),
//!     ],
//! );
//! let report = ScenarioRunner::default().run(&mut device, &scenario);
//! assert!(report.status().is_passed());
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

#[allow(clippy::missing_errors_doc)]
mod config;
/// Device utilities: one call per device capability, assert and verify
/// semantics included.
#[allow(clippy::missing_errors_doc)]
pub mod device;
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod driver;
mod gesture;
#[allow(clippy::missing_errors_doc)]
mod location;
#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
mod registry;
#[cfg(feature = "remote")]
#[allow(clippy::missing_errors_doc)]
mod remote;
#[allow(clippy::missing_errors_doc, clippy::cast_possible_truncation)]
mod report;
mod result;
mod runner;
/// Step facade: the functions step phrases bind to.
#[allow(clippy::missing_errors_doc)]
pub mod steps;

pub use config::{
    SessionConfig, DEFAULT_COMMAND_TIMEOUT_SECS, ENV_REMOTE_URL, ENV_SECURITY_TOKEN,
};
pub use driver::{DeviceDriver, MockDevice, Orientation, RepositoryPath, Rotation, Screenshot};
pub use gesture::{Gesture, Offset, ScreenPoint};
pub use location::{Coordinates, LocationSpec, COORDINATE_EPSILON};
pub use registry::{
    strip_keyword, StepArgs, StepContext, StepDefinition, StepError, StepFn, StepMatch,
    StepOutcome, StepRegistry,
};
#[cfg(feature = "remote")]
pub use remote::{MobileCommand, RemoteDevice};
pub use report::{
    Attachment, ScenarioReport, ScenarioStatus, StepRecord, StepStatus, VerificationFailure,
};
pub use result::{DeviceError, DeviceResult};
pub use runner::{Scenario, ScenarioRunner};

/// Prelude for step definitions and scenario drivers
pub mod prelude {
    pub use crate::{
        DeviceDriver, DeviceError, DeviceResult, MockDevice, Scenario, ScenarioReport,
        ScenarioRunner, SessionConfig, StepRegistry,
    };
    #[cfg(feature = "remote")]
    pub use crate::RemoteDevice;
}
