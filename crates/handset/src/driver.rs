//! DeviceDriver - Device Automation Capability
//!
//! The handle every step operates on. A driver is owned by whoever opened the
//! session (the remote device cloud client or a test) and is passed to each
//! operation explicitly; steps never look it up from global state.
//!
//! # Implementations
//!
//! - `RemoteDevice` - W3C WebDriver session on a device cloud (`remote` feature)
//! - `MockDevice` - In-memory device for unit tests and dry runs

use crate::gesture::ScreenPoint;
use crate::location::{Coordinates, LocationSpec};
use crate::result::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime};

/// PNG file signature
const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rotation {
    /// Rotate to landscape
    Landscape,
    /// Rotate to portrait
    Portrait,
    /// Rotate to the next orientation
    Next,
}

impl Rotation {
    /// Command parameter as `(mode, target)`, e.g. `("state", "landscape")`
    #[must_use]
    pub const fn param(self) -> (&'static str, &'static str) {
        match self {
            Self::Landscape => ("state", "landscape"),
            Self::Portrait => ("state", "portrait"),
            Self::Next => ("operation", "next"),
        }
    }
}

/// Screen orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Portrait
    #[default]
    Portrait,
    /// Landscape
    Landscape,
}

/// Captured screen image
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when the screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the data carries a PNG signature
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.data.starts_with(&PNG_MAGIC)
    }

    /// Width and height from the PNG header, if present
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        if !self.is_png() || self.data.len() < 24 || &self.data[12..16] != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes(self.data[16..20].try_into().ok()?);
        let height = u32::from_be_bytes(self.data[20..24].try_into().ok()?);
        Some((width, height))
    }
}

/// Storage location for an artifact in the device cloud repository,
/// such as `PRIVATE:dir1/dir2/name.png`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryPath(String);

impl RepositoryPath {
    /// Wrap a repository path. Only emptiness is checked here; the
    /// repository validates the rest.
    pub fn new(path: impl Into<String>) -> DeviceResult<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(DeviceError::invalid_argument("repository path is empty"));
        }
        Ok(Self(path))
    }

    /// Namespace prefix before the first `:` (e.g. `PRIVATE`)
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once(':').map(|(ns, _)| ns)
    }

    /// Path after the namespace prefix
    #[must_use]
    pub fn path(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(_, p)| p)
    }

    /// Full path as given
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device automation capability
///
/// Each method performs a single blocking call to the device. Failures are
/// returned as-is; deciding whether they abort a scenario is the caller's job.
pub trait DeviceDriver {
    /// Rotate the screen
    fn rotate(&mut self, rotation: Rotation) -> DeviceResult<()>;

    /// Mock the device location
    fn set_location(&mut self, location: &LocationSpec) -> DeviceResult<()>;

    /// Read the current device location
    fn location(&mut self) -> DeviceResult<Coordinates>;

    /// Stop mocking and return to the real location
    fn reset_location(&mut self) -> DeviceResult<()>;

    /// Unlock and return to the home screen
    fn go_home(&mut self) -> DeviceResult<()>;

    /// Swipe from `start` to `end`
    fn swipe(&mut self, start: &ScreenPoint, end: &ScreenPoint) -> DeviceResult<()>;

    /// Lock the screen for `duration`, then unlock
    fn lock(&mut self, duration: Duration) -> DeviceResult<()>;

    /// Set the timezone id
    fn set_timezone(&mut self, timezone: &str) -> DeviceResult<()>;

    /// Read the timezone id
    fn timezone(&mut self) -> DeviceResult<String>;

    /// Restore the default timezone
    fn reset_timezone(&mut self) -> DeviceResult<()>;

    /// Capture the screen
    fn screenshot(&mut self) -> DeviceResult<Screenshot>;

    /// Capture the screen into the device cloud repository
    fn save_screenshot(&mut self, path: &RepositoryPath) -> DeviceResult<()>;

    /// Hide the virtual keyboard
    fn hide_keyboard(&mut self) -> DeviceResult<()>;

    /// End the session
    fn close(&mut self) -> DeviceResult<()>;
}

/// Mock device for unit testing
#[derive(Debug)]
pub struct MockDevice {
    /// Current orientation
    pub orientation: Orientation,
    /// Mocked location, if any
    pub mocked_location: Option<Coordinates>,
    /// Location reported when nothing is mocked
    pub real_location: Coordinates,
    /// "Allow mock locations" developer setting
    pub mock_location_enabled: bool,
    /// Addresses the mock geocoder knows
    pub address_book: HashMap<String, Coordinates>,
    /// Current timezone id
    pub timezone: String,
    /// Timezone restored by reset
    pub default_timezone: String,
    /// Virtual keyboard shown
    pub keyboard_visible: bool,
    /// Screen locked
    pub locked: bool,
    /// Durations of every lock
    pub lock_history: Vec<Duration>,
    /// Home screen shown
    pub on_home_screen: bool,
    /// Every swipe performed
    pub swipes: Vec<(ScreenPoint, ScreenPoint)>,
    /// Image returned by `screenshot`
    pub screenshot_data: Vec<u8>,
    /// Screenshots saved to the repository
    pub repository: HashMap<RepositoryPath, Vec<u8>>,
    /// Call history for verification
    pub call_history: Vec<String>,
    failures: HashMap<&'static str, String>,
    closed: bool,
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDevice {
    /// Create a mock device in portrait on UTC with mock locations allowed
    #[must_use]
    pub fn new() -> Self {
        let mut address_book = HashMap::new();
        address_book.insert(
            "1600 Amphitheatre Parkway, Mountain View, CA".to_string(),
            Coordinates {
                latitude: 37.422_0,
                longitude: -122.084_1,
            },
        );
        let real_location = Coordinates {
            latitude: 43.642_659,
            longitude: -79.387_050,
        };

        Self {
            orientation: Orientation::Portrait,
            mocked_location: None,
            real_location,
            mock_location_enabled: true,
            address_book,
            timezone: "UTC".to_string(),
            default_timezone: "UTC".to_string(),
            keyboard_visible: false,
            locked: false,
            lock_history: Vec::new(),
            on_home_screen: false,
            swipes: Vec::new(),
            screenshot_data: PNG_MAGIC.to_vec(),
            repository: HashMap::new(),
            call_history: Vec::new(),
            failures: HashMap::new(),
            closed: false,
        }
    }

    /// Make every call to `command` fail with `message`
    pub fn fail_on(&mut self, command: &'static str, message: impl Into<String>) {
        self.failures.insert(command, message.into());
    }

    /// Stop failing `command`
    pub fn clear_failure(&mut self, command: &str) {
        self.failures.remove(command);
    }

    /// Add an address to the mock geocoder
    pub fn add_address(&mut self, address: impl Into<String>, coordinates: Coordinates) {
        self.address_book.insert(address.into(), coordinates);
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.call_history
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history.iter().any(|c| c.starts_with(method))
    }

    /// Check if the session was closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&mut self, command: &'static str, detail: impl fmt::Display) -> DeviceResult<()> {
        self.call_history.push(format!("{command}:{detail}"));
        if self.closed {
            return Err(DeviceError::Session {
                message: "session is closed".to_string(),
            });
        }
        match self.failures.get(command) {
            Some(message) => Err(DeviceError::driver(command, message.clone())),
            None => Ok(()),
        }
    }
}

impl DeviceDriver for MockDevice {
    fn rotate(&mut self, rotation: Rotation) -> DeviceResult<()> {
        let (mode, target) = rotation.param();
        self.record("rotate", format_args!("{mode}={target}"))?;
        self.orientation = match (rotation, self.orientation) {
            (Rotation::Landscape, _) | (Rotation::Next, Orientation::Portrait) => {
                Orientation::Landscape
            }
            (Rotation::Portrait, _) | (Rotation::Next, Orientation::Landscape) => {
                Orientation::Portrait
            }
        };
        Ok(())
    }

    fn set_location(&mut self, location: &LocationSpec) -> DeviceResult<()> {
        self.record("set_location", format_args!("{}={}", location.kind(), location.value()))?;
        if !self.mock_location_enabled {
            return Err(DeviceError::MockLocationDisabled);
        }
        let coordinates = match location {
            LocationSpec::Coordinates(c) => *c,
            LocationSpec::Address(address) => {
                *self
                    .address_book
                    .get(address)
                    .ok_or_else(|| DeviceError::Geocoding {
                        address: address.clone(),
                    })?
            }
        };
        self.mocked_location = Some(coordinates);
        Ok(())
    }

    fn location(&mut self) -> DeviceResult<Coordinates> {
        self.record("location", "")?;
        Ok(self.mocked_location.unwrap_or(self.real_location))
    }

    fn reset_location(&mut self) -> DeviceResult<()> {
        self.record("reset_location", "")?;
        self.mocked_location = None;
        Ok(())
    }

    fn go_home(&mut self) -> DeviceResult<()> {
        self.record("go_home", "")?;
        self.locked = false;
        self.keyboard_visible = false;
        self.orientation = Orientation::Portrait;
        self.on_home_screen = true;
        Ok(())
    }

    fn swipe(&mut self, start: &ScreenPoint, end: &ScreenPoint) -> DeviceResult<()> {
        self.record("swipe", format_args!("{start}->{end}"))?;
        self.on_home_screen = false;
        self.swipes.push((*start, *end));
        Ok(())
    }

    fn lock(&mut self, duration: Duration) -> DeviceResult<()> {
        self.record("lock", duration.as_secs())?;
        // Simulated: the lock period elapses instantly
        self.locked = true;
        self.lock_history.push(duration);
        self.locked = false;
        Ok(())
    }

    fn set_timezone(&mut self, timezone: &str) -> DeviceResult<()> {
        self.record("set_timezone", timezone)?;
        self.timezone = timezone.to_string();
        Ok(())
    }

    fn timezone(&mut self) -> DeviceResult<String> {
        self.record("timezone", "")?;
        Ok(self.timezone.clone())
    }

    fn reset_timezone(&mut self) -> DeviceResult<()> {
        self.record("reset_timezone", "")?;
        self.timezone = self.default_timezone.clone();
        Ok(())
    }

    fn screenshot(&mut self) -> DeviceResult<Screenshot> {
        self.record("screenshot", "")?;
        if self.screenshot_data.is_empty() {
            return Err(DeviceError::Screenshot {
                message: "No mock screenshot set".to_string(),
            });
        }
        Ok(Screenshot::new(self.screenshot_data.clone()))
    }

    fn save_screenshot(&mut self, path: &RepositoryPath) -> DeviceResult<()> {
        self.record("save_screenshot", path)?;
        self.repository.insert(path.clone(), self.screenshot_data.clone());
        Ok(())
    }

    fn hide_keyboard(&mut self) -> DeviceResult<()> {
        self.record("hide_keyboard", "")?;
        if !self.keyboard_visible {
            return Err(DeviceError::NoKeyboard);
        }
        self.keyboard_visible = false;
        Ok(())
    }

    fn close(&mut self) -> DeviceResult<()> {
        self.record("close", "")?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod screenshot_tests {
        use super::*;

        fn png_header(width: u32, height: u32) -> Vec<u8> {
            let mut data = PNG_MAGIC.to_vec();
            data.extend_from_slice(&13u32.to_be_bytes());
            data.extend_from_slice(b"IHDR");
            data.extend_from_slice(&width.to_be_bytes());
            data.extend_from_slice(&height.to_be_bytes());
            data
        }

        #[test]
        fn test_screenshot_size_bytes() {
            let screenshot = Screenshot::new(vec![0; 1024]);
            assert_eq!(screenshot.size_bytes(), 1024);
            assert!(!screenshot.is_png());
        }

        #[test]
        fn test_screenshot_dimensions() {
            let screenshot = Screenshot::new(png_header(1170, 2532));
            assert!(screenshot.is_png());
            assert_eq!(screenshot.dimensions(), Some((1170, 2532)));
        }

        #[test]
        fn test_screenshot_without_header() {
            let screenshot = Screenshot::new(PNG_MAGIC.to_vec());
            assert_eq!(screenshot.dimensions(), None);
        }
    }

    mod repository_path_tests {
        use super::*;

        #[test]
        fn test_namespace_and_path() {
            let path = RepositoryPath::new("PRIVATE:dir1/dir2/name.png").unwrap();
            assert_eq!(path.namespace(), Some("PRIVATE"));
            assert_eq!(path.path(), "dir1/dir2/name.png");
            assert_eq!(path.to_string(), "PRIVATE:dir1/dir2/name.png");
        }

        #[test]
        fn test_path_without_namespace() {
            let path = RepositoryPath::new("shots/home.png").unwrap();
            assert_eq!(path.namespace(), None);
            assert_eq!(path.path(), "shots/home.png");
        }

        #[test]
        fn test_empty_path_rejected() {
            assert!(RepositoryPath::new("  ").is_err());
        }
    }

    mod rotation_tests {
        use super::*;

        #[test]
        fn test_rotation_params() {
            assert_eq!(Rotation::Landscape.param(), ("state", "landscape"));
            assert_eq!(Rotation::Portrait.param(), ("state", "portrait"));
            assert_eq!(Rotation::Next.param(), ("operation", "next"));
        }
    }

    mod mock_device_tests {
        use super::*;

        #[test]
        fn test_mock_device_creation() {
            let device = MockDevice::new();
            assert_eq!(device.orientation, Orientation::Portrait);
            assert!(device.history().is_empty());
            assert!(!device.is_closed());
        }

        #[test]
        fn test_rotate_next_toggles() {
            let mut device = MockDevice::new();
            device.rotate(Rotation::Next).unwrap();
            assert_eq!(device.orientation, Orientation::Landscape);
            device.rotate(Rotation::Next).unwrap();
            assert_eq!(device.orientation, Orientation::Portrait);
            assert!(device.was_called("rotate:operation=next"));
        }

        #[test]
        fn test_location_falls_back_to_real() {
            let mut device = MockDevice::new();
            let real = device.real_location;
            assert!(device.location().unwrap().matches(&real));
        }

        #[test]
        fn test_set_location_requires_mock_setting() {
            let mut device = MockDevice::new();
            device.mock_location_enabled = false;
            let spec = LocationSpec::Coordinates(Coordinates::new(1.0, 2.0).unwrap());
            let err = device.set_location(&spec).unwrap_err();
            assert!(matches!(err, DeviceError::MockLocationDisabled));
        }

        #[test]
        fn test_unknown_address_fails_geocoding() {
            let mut device = MockDevice::new();
            let err = device
                .set_location(&LocationSpec::Address("nowhere".to_string()))
                .unwrap_err();
            assert!(matches!(err, DeviceError::Geocoding { .. }));
        }

        #[test]
        fn test_injected_failure() {
            let mut device = MockDevice::new();
            device.fail_on("go_home", "device offline");
            assert!(device.go_home().is_err());
            device.clear_failure("go_home");
            device.go_home().unwrap();
            assert!(device.on_home_screen);
        }

        #[test]
        fn test_hide_keyboard_needs_keyboard() {
            let mut device = MockDevice::new();
            assert!(matches!(
                device.hide_keyboard().unwrap_err(),
                DeviceError::NoKeyboard
            ));
            device.keyboard_visible = true;
            device.hide_keyboard().unwrap();
            assert!(!device.keyboard_visible);
        }

        #[test]
        fn test_calls_after_close_fail() {
            let mut device = MockDevice::new();
            device.close().unwrap();
            assert!(device.is_closed());
            assert!(matches!(
                device.timezone().unwrap_err(),
                DeviceError::Session { .. }
            ));
        }

        #[test]
        fn test_save_screenshot_stores_in_repository() {
            let mut device = MockDevice::new();
            let path = RepositoryPath::new("PRIVATE:a/b.png").unwrap();
            device.save_screenshot(&path).unwrap();
            assert!(device.repository.contains_key(&path));
        }
    }
}
