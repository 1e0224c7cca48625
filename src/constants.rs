//! Limits, HID usages and driver status codes.
//!
//! Everything in here is static data shared by the report buffer, the driver
//! binding and the device session. Ranges are inclusive.
//!
//! ## Value conventions
//! - **Axes:** `0x0000..=0x8000`, with `0x4000` as center.
//! - **Buttons:** numbered `1..=128`.
//! - **Discrete POV:** `-1` = neutral, `0..=3` = North, East, South, West.
//! - **Continuous POV:** `-1` = neutral, `0..=35999` = angle in 1/100 degree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// File name of the vJoy interface library.
pub const DLL_FILENAME: &str = "vJoyInterface.dll";

pub const MIN_DEVICE_ID: u32 = 1;
pub const MAX_DEVICE_ID: u32 = 16;

pub const MAX_BUTTONS: u32 = 128;
pub const MAX_POVS: u32 = 4;

pub const AXIS_MIN: i32 = 0x0000;
pub const AXIS_MAX: i32 = 0x8000;
pub const AXIS_MID: i32 = 0x4000;

/// Value that puts a POV hat (discrete or continuous) in its neutral position.
pub const POV_NEUTRAL: i32 = -1;
pub const DISC_POV_MIN: i32 = 0;
pub const DISC_POV_MAX: i32 = 3;
pub const CONT_POV_MIN: i32 = 0;
pub const CONT_POV_MAX: i32 = 35999;

/// All bits set: how the report record encodes a neutral hat.
pub const POV_NEUTRAL_RAW: u32 = 0xFFFF_FFFF;

pub const HID_USAGE_X: u32 = 0x30;
pub const HID_USAGE_Y: u32 = 0x31;
pub const HID_USAGE_Z: u32 = 0x32;
pub const HID_USAGE_RX: u32 = 0x33;
pub const HID_USAGE_RY: u32 = 0x34;
pub const HID_USAGE_RZ: u32 = 0x35;
pub const HID_USAGE_SL0: u32 = 0x36;
pub const HID_USAGE_SL1: u32 = 0x37;
pub const HID_USAGE_WHL: u32 = 0x38;
pub const HID_USAGE_POV: u32 = 0x39;

/// Lowest axis usage the driver accepts.
pub const HID_USAGE_LOW: u32 = HID_USAGE_X;
/// Highest axis usage the driver accepts.
pub const HID_USAGE_HIGH: u32 = HID_USAGE_POV;

pub const VJD_STAT_OWN: i32 = 0;
pub const VJD_STAT_FREE: i32 = 1;
pub const VJD_STAT_BUSY: i32 = 2;
pub const VJD_STAT_MISS: i32 = 3;
pub const VJD_STAT_UNKN: i32 = 4;

/// HID Generic Desktop usages that `SetAxis` understands.
///
/// Any `u32` in [`HID_USAGE_LOW`]..=[`HID_USAGE_HIGH`] is forwarded to the
/// driver; this enum just names them. `Pov` is accepted by the driver's axis
/// call but has no axis field in the report record.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HidUsage {
    X = HID_USAGE_X,
    Y = HID_USAGE_Y,
    Z = HID_USAGE_Z,
    Rx = HID_USAGE_RX,
    Ry = HID_USAGE_RY,
    Rz = HID_USAGE_RZ,
    Slider = HID_USAGE_SL0,
    Dial = HID_USAGE_SL1,
    Wheel = HID_USAGE_WHL,
    Pov = HID_USAGE_POV,
}

impl HidUsage {
    pub const ALL: [HidUsage; 10] = [
        HidUsage::X,
        HidUsage::Y,
        HidUsage::Z,
        HidUsage::Rx,
        HidUsage::Ry,
        HidUsage::Rz,
        HidUsage::Slider,
        HidUsage::Dial,
        HidUsage::Wheel,
        HidUsage::Pov,
    ];

    /// Look up a usage by its raw code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.code() == code)
    }

    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Short label for logs and UIs.
    pub fn name(self) -> &'static str {
        match self {
            HidUsage::X => "X",
            HidUsage::Y => "Y",
            HidUsage::Z => "Z",
            HidUsage::Rx => "Rx",
            HidUsage::Ry => "Ry",
            HidUsage::Rz => "Rz",
            HidUsage::Slider => "Slider",
            HidUsage::Dial => "Dial",
            HidUsage::Wheel => "Wheel",
            HidUsage::Pov => "POV",
        }
    }
}

impl From<HidUsage> for u32 {
    fn from(usage: HidUsage) -> Self {
        usage.code()
    }
}

impl fmt::Display for HidUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.code())
    }
}

/// Whether `code` is inside the contiguous usage range the driver accepts.
#[inline]
pub fn is_supported_usage(code: u32) -> bool {
    (HID_USAGE_LOW..=HID_USAGE_HIGH).contains(&code)
}

/// Ownership status of a device slot as reported by the driver.
///
/// Queried on demand; it can change between two calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    /// Owned by this process.
    Own,
    /// Not owned by anyone.
    Free,
    /// Owned by another process.
    Busy,
    /// Slot missing, or the driver is down.
    Missing,
    Unknown,
}

impl DeviceStatus {
    /// Map a raw driver status. Codes outside the known table become `Unknown`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            VJD_STAT_OWN => DeviceStatus::Own,
            VJD_STAT_FREE => DeviceStatus::Free,
            VJD_STAT_BUSY => DeviceStatus::Busy,
            VJD_STAT_MISS => DeviceStatus::Missing,
            _ => DeviceStatus::Unknown,
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            DeviceStatus::Own => VJD_STAT_OWN,
            DeviceStatus::Free => VJD_STAT_FREE,
            DeviceStatus::Busy => VJD_STAT_BUSY,
            DeviceStatus::Missing => VJD_STAT_MISS,
            DeviceStatus::Unknown => VJD_STAT_UNKN,
        }
    }

    /// Human-readable description used in diagnostics.
    pub fn description(self) -> &'static str {
        match self {
            DeviceStatus::Own => "Owned by this application",
            DeviceStatus::Free => "Free",
            DeviceStatus::Busy => "Owned by another application",
            DeviceStatus::Missing => "Missing",
            DeviceStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
