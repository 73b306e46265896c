//! Touch gestures and screen points.

use crate::result::{DeviceError, DeviceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One axis of a screen point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Offset {
    /// Percentage of the screen dimension (0-100)
    Percent(u8),
    /// Absolute pixels
    Pixels(u32),
}

impl Offset {
    fn parse(raw: &str) -> DeviceResult<Self> {
        let raw = raw.trim();
        if let Some(pct) = raw.strip_suffix('%') {
            let value = pct
                .trim()
                .parse::<u8>()
                .map_err(|_| DeviceError::invalid_argument(format!("bad percentage '{raw}'")))?;
            if value > 100 {
                return Err(DeviceError::invalid_argument(format!(
                    "percentage '{raw}' exceeds 100%"
                )));
            }
            Ok(Self::Percent(value))
        } else {
            raw.parse::<u32>()
                .map(Self::Pixels)
                .map_err(|_| DeviceError::invalid_argument(format!("bad pixel offset '{raw}'")))
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Percent(p) => write!(f, "{p}%"),
            Self::Pixels(px) => write!(f, "{px}"),
        }
    }
}

/// A point on the device screen, written as `x,y` (e.g. `60%,50%`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal offset
    pub x: Offset,
    /// Vertical offset
    pub y: Offset,
}

impl ScreenPoint {
    /// Point given in percentages of the screen
    #[must_use]
    pub const fn percent(x: u8, y: u8) -> Self {
        Self {
            x: Offset::Percent(x),
            y: Offset::Percent(y),
        }
    }

    /// Point given in pixels
    #[must_use]
    pub const fn pixels(x: u32, y: u32) -> Self {
        Self {
            x: Offset::Pixels(x),
            y: Offset::Pixels(y),
        }
    }
}

impl FromStr for ScreenPoint {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| DeviceError::invalid_argument(format!("bad screen point '{s}'")))?;
        Ok(Self {
            x: Offset::parse(x)?,
            y: Offset::parse(y)?,
        })
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Built-in swipe and scroll gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    /// Swipe from right to left
    SwipeLeft,
    /// Swipe from left to right
    SwipeRight,
    /// Scroll content up (finger moves down)
    ScrollUp,
    /// Scroll content down (finger moves up)
    ScrollDown,
}

impl Gesture {
    /// All gestures
    pub const ALL: [Self; 4] = [
        Self::SwipeLeft,
        Self::SwipeRight,
        Self::ScrollUp,
        Self::ScrollDown,
    ];

    /// Default start and end points
    #[must_use]
    pub const fn points(self) -> (ScreenPoint, ScreenPoint) {
        match self {
            Self::SwipeLeft => (ScreenPoint::percent(60, 50), ScreenPoint::percent(10, 50)),
            Self::SwipeRight => (ScreenPoint::percent(40, 50), ScreenPoint::percent(90, 50)),
            Self::ScrollUp => (ScreenPoint::percent(50, 40), ScreenPoint::percent(50, 60)),
            Self::ScrollDown => (ScreenPoint::percent(50, 60), ScreenPoint::percent(50, 40)),
        }
    }
}
