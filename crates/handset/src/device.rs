//! Device utilities.
//!
//! Comparison logic on top of the primitive driver calls. Functions named
//! `assert_*` return an error on mismatch; `verify_*` never fail and report
//! the outcome as a `bool`.

use crate::driver::{DeviceDriver, RepositoryPath, Rotation};
use crate::gesture::ScreenPoint;
use crate::location::{Coordinates, LocationSpec};
use crate::report::ScenarioReport;
use crate::result::{DeviceError, DeviceResult};
use std::time::Duration;
use tracing::{debug, warn};

/// Rotate the device
pub fn rotate_device(driver: &mut dyn DeviceDriver, rotation: Rotation) -> DeviceResult<()> {
    debug!(?rotation, "rotating device");
    driver.rotate(rotation)
}

/// Mock the location, given as `lat,long` coordinates or as an address
pub fn set_location(driver: &mut dyn DeviceDriver, location: &LocationSpec) -> DeviceResult<()> {
    debug!(kind = location.kind(), value = %location.value(), "setting device location");
    driver.set_location(location)
}

/// Fail unless the device reports `expected` (`lat,long`)
pub fn assert_location(driver: &mut dyn DeviceDriver, expected: &str) -> DeviceResult<()> {
    let expected = Coordinates::parse(expected)?;
    let actual = driver.location()?;
    if actual.matches(&expected) {
        Ok(())
    } else {
        Err(DeviceError::assertion(format!(
            "expected device coordinates {expected}, got {actual}"
        )))
    }
}

/// Check whether the device reports `expected` (`lat,long`)
///
/// Malformed input and driver errors yield `false`.
pub fn verify_location(driver: &mut dyn DeviceDriver, expected: &str) -> bool {
    match assert_location(driver, expected) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "location verification failed");
            false
        }
    }
}

/// Stop mocking the location
pub fn reset_location(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    debug!("resetting device location");
    driver.reset_location()
}

/// Return to the home screen
pub fn go_to_home_screen(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    debug!("going to home screen");
    driver.go_home()
}

/// Swipe between two points
pub fn swipe(
    driver: &mut dyn DeviceDriver,
    start: &ScreenPoint,
    end: &ScreenPoint,
) -> DeviceResult<()> {
    debug!(%start, %end, "swiping");
    driver.swipe(start, end)
}

/// Lock the screen for `seconds`, then unlock
pub fn lock_device(driver: &mut dyn DeviceDriver, seconds: u64) -> DeviceResult<()> {
    debug!(seconds, "locking device");
    driver.lock(Duration::from_secs(seconds))
}

/// Set the timezone id
pub fn set_timezone(driver: &mut dyn DeviceDriver, timezone: &str) -> DeviceResult<()> {
    debug!(timezone, "setting timezone");
    driver.set_timezone(timezone)
}

/// Fail unless the device timezone is `expected`
pub fn assert_timezone(driver: &mut dyn DeviceDriver, expected: &str) -> DeviceResult<()> {
    let actual = driver.timezone()?;
    if actual == expected {
        Ok(())
    } else {
        Err(DeviceError::assertion(format!(
            "expected device timezone {expected}, got {actual}"
        )))
    }
}

/// Check whether the device timezone is `expected`
pub fn verify_timezone(driver: &mut dyn DeviceDriver, expected: &str) -> bool {
    match assert_timezone(driver, expected) {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "timezone verification failed");
            false
        }
    }
}

/// Restore the default timezone
pub fn reset_timezone(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    debug!("resetting timezone");
    driver.reset_timezone()
}

/// Capture the screen and attach it to the report; with `save`, also store
/// it in the repository at `path`
pub fn take_screenshot(
    driver: &mut dyn DeviceDriver,
    report: &mut ScenarioReport,
    path: Option<&RepositoryPath>,
    save: bool,
) -> DeviceResult<()> {
    let saved_to = match (save, path) {
        (true, Some(path)) => {
            debug!(%path, "saving screenshot to repository");
            driver.save_screenshot(path)?;
            Some(path)
        }
        (true, None) => {
            return Err(DeviceError::Screenshot {
                message: "no repository path to save to".to_string(),
            })
        }
        (false, _) => None,
    };
    let screenshot = driver.screenshot()?;
    debug!(bytes = screenshot.size_bytes(), "attaching screenshot");
    report.attach_screenshot(screenshot, saved_to);
    Ok(())
}

/// Hide the virtual keyboard
pub fn hide_keyboard(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    debug!("hiding keyboard");
    driver.hide_keyboard()
}
