//! Device command facade.
//!
//! One function per step phrase. Each delegates once to [`crate::device`]
//! with the session handle the caller passes in.
//!
//! ```text
//! Scenario:
//!   Given I go to the device home screen
//!   Then I set the device location to the coordinates "43.642659,-79.387050"
//!   Then the device coordinates should be "43.642659,-79.387050"
//!   Then I take a screenshot and save to "PRIVATE:dir1/dir2/name.png"
//! ```

use crate::device;
use crate::driver::{DeviceDriver, RepositoryPath, Rotation};
use crate::gesture::Gesture;
use crate::location::{Coordinates, LocationSpec};
use crate::report::ScenarioReport;
use crate::result::DeviceResult;

/// Rotate the device to landscape.
pub fn rotate_to_landscape(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::rotate_device(driver, Rotation::Landscape)
}

/// Rotate the device to portrait.
pub fn rotate_to_portrait(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::rotate_device(driver, Rotation::Portrait)
}

/// Rotate the device to its next orientation.
pub fn rotate_device(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::rotate_device(driver, Rotation::Next)
}

/// Mock the device location from `lat,long` decimal degrees, e.g.
/// `43.642659,-79.387050`.
///
/// The device must have "Allow mock locations" enabled
/// (Settings > Developer options).
pub fn set_location_by_coordinates(
    driver: &mut dyn DeviceDriver,
    coordinates: &str,
) -> DeviceResult<()> {
    let coordinates = Coordinates::parse(coordinates)?;
    device::set_location(driver, &LocationSpec::Coordinates(coordinates))
}

/// Mock the device location from an address, e.g.
/// `1600 Amphitheatre Parkway, Mountain View, CA`. Geocoding happens on the
/// device cloud.
pub fn set_location_by_address(driver: &mut dyn DeviceDriver, address: &str) -> DeviceResult<()> {
    device::set_location(driver, &LocationSpec::Address(address.to_string()))
}

/// Check the device coordinates. Stops the scenario on mismatch.
pub fn assert_location_coordinates(
    driver: &mut dyn DeviceDriver,
    coordinates: &str,
) -> DeviceResult<()> {
    device::assert_location(driver, coordinates)
}

/// Verify the device coordinates. The scenario continues on mismatch.
pub fn verify_location_coordinates(driver: &mut dyn DeviceDriver, coordinates: &str) -> bool {
    device::verify_location(driver, coordinates)
}

/// Stop mocking the location; the device returns to its real position.
pub fn reset_location(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::reset_location(driver)
}

/// Bring the device to its home screen, unlocked and in its default
/// orientation. Use it at the start of a scenario for a known state.
pub fn go_to_home_screen(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::go_to_home_screen(driver)
}

/// Swipe left.
pub fn swipe_left(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    perform(driver, Gesture::SwipeLeft)
}

/// Swipe right.
pub fn swipe_right(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    perform(driver, Gesture::SwipeRight)
}

/// Scroll up.
pub fn scroll_up(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    perform(driver, Gesture::ScrollUp)
}

/// Scroll down.
pub fn scroll_down(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    perform(driver, Gesture::ScrollDown)
}

fn perform(driver: &mut dyn DeviceDriver, gesture: Gesture) -> DeviceResult<()> {
    let (start, end) = gesture.points();
    device::swipe(driver, &start, &end)
}

/// Lock the screen for `seconds`, then unlock. Zero unlocks immediately.
pub fn lock_device(driver: &mut dyn DeviceDriver, seconds: u64) -> DeviceResult<()> {
    device::lock_device(driver, seconds)
}

/// Set the device timezone id.
pub fn set_timezone(driver: &mut dyn DeviceDriver, timezone: &str) -> DeviceResult<()> {
    device::set_timezone(driver, timezone)
}

/// Check the device timezone. Stops the scenario on mismatch.
pub fn assert_timezone(driver: &mut dyn DeviceDriver, timezone: &str) -> DeviceResult<()> {
    device::assert_timezone(driver, timezone)
}

/// Verify the device timezone. The scenario continues on mismatch.
pub fn verify_timezone(driver: &mut dyn DeviceDriver, timezone: &str) -> bool {
    device::verify_timezone(driver, timezone)
}

/// Restore the default timezone.
pub fn reset_timezone(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::reset_timezone(driver)
}

/// Capture the screen and attach it to the report.
pub fn take_screenshot(
    driver: &mut dyn DeviceDriver,
    report: &mut ScenarioReport,
) -> DeviceResult<()> {
    device::take_screenshot(driver, report, None, false)
}

/// Capture the screen, save it to the repository (e.g.
/// `PRIVATE:dir1/dir2/name.png`) and attach it to the report.
pub fn take_screenshot_and_save(
    driver: &mut dyn DeviceDriver,
    report: &mut ScenarioReport,
    repository_path: &str,
) -> DeviceResult<()> {
    let path = RepositoryPath::new(repository_path)?;
    device::take_screenshot(driver, report, Some(&path), true)
}

/// Hide the virtual keyboard.
pub fn hide_keyboard(driver: &mut dyn DeviceDriver) -> DeviceResult<()> {
    device::hide_keyboard(driver)
}
