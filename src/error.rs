//! Error types.
//!
//! Every failure carries the device it concerns and the offending value where
//! one exists, so callers can branch on the variant instead of parsing text.

use crate::constants::DeviceStatus;
use crate::device::{DeviceId, SessionState};
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Coarse grouping of [`Error`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The driver library could not be loaded. Nothing else can work.
    Fatal,
    /// The driver refused to hand over a device.
    Construction,
    /// Bad input, caught before any driver call.
    Validation,
    /// The driver rejected a call.
    Driver,
    /// `reacquire` could not recover the device.
    Recovery,
    /// The session was used after it stopped owning its device.
    Usage,
}

/// Which POV encoding a value was checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PovKind {
    Discrete,
    Continuous,
}

/// Why an axis call failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AxisFault {
    /// Usage outside the range the driver accepts, or without a report field.
    UnsupportedUsage,
    /// The driver call itself returned failure.
    DriverRejected,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unable to load vJoy interface from {}: {reason}", .path.display())]
    DriverLoad { path: PathBuf, reason: String },

    #[error("vJoy is not installed or not enabled")]
    DriverNotEnabled,

    #[error("vJoy interface version {dll:#06x} does not match driver version {driver:#06x}")]
    DriverVersionMismatch { dll: u16, driver: u16 },

    #[error("cannot acquire device {device}: already owned by this application")]
    AlreadyOwnedBySelf { device: DeviceId },

    #[error("cannot acquire device {device}: owned by another application")]
    OwnedByOther { device: DeviceId },

    #[error("cannot acquire device {device}: missing or driver is down")]
    DeviceMissing { device: DeviceId },

    #[error("cannot acquire device {device} (status: {status})")]
    AcquireFailed {
        device: DeviceId,
        status: DeviceStatus,
    },

    #[error("failed to relinquish device {device}")]
    RelinquishFailed { device: DeviceId },

    #[error("failed to set button {button} on device {device}")]
    ButtonOperationFailed { device: DeviceId, button: u8 },

    #[error("invalid axis 0x{axis:02X} on device {device} ({fault:?})")]
    InvalidAxis {
        device: DeviceId,
        axis: u32,
        fault: AxisFault,
    },

    #[error("axis usage 0x{axis:02X} has no field in the report record")]
    UnmappedAxis { axis: u32 },

    #[error("{kind:?} POV value {value} is out of range")]
    InvalidPovValue {
        device: Option<DeviceId>,
        kind: PovKind,
        value: i32,
    },

    #[error("POV id {pov} must be between 1 and 4")]
    InvalidPovId { device: Option<DeviceId>, pov: u32 },

    #[error("device id {value} must be between 1 and 16")]
    InvalidDeviceId { value: u32 },

    #[error("button id {button} must be between 1 and 128")]
    InvalidButton {
        device: Option<DeviceId>,
        button: u32,
    },

    #[error("axis value {value:#06x} for axis 0x{axis:02X} must be between 0x0000 and 0x8000")]
    AxisValueOutOfRange {
        device: Option<DeviceId>,
        axis: u32,
        value: i32,
    },

    #[error("device {device} is not acquired (session is {state:?})")]
    NotAcquired { device: DeviceId, state: SessionState },

    #[error("failed to reacquire device {device}: {source}")]
    FailedToAcquire {
        device: DeviceId,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::DriverLoad { .. } => ErrorCategory::Fatal,
            Error::DriverNotEnabled
            | Error::DriverVersionMismatch { .. }
            | Error::AlreadyOwnedBySelf { .. }
            | Error::OwnedByOther { .. }
            | Error::DeviceMissing { .. }
            | Error::AcquireFailed { .. } => ErrorCategory::Construction,
            Error::InvalidAxis {
                fault: AxisFault::UnsupportedUsage,
                ..
            }
            | Error::UnmappedAxis { .. }
            | Error::InvalidPovValue { .. }
            | Error::InvalidPovId { .. }
            | Error::InvalidDeviceId { .. }
            | Error::InvalidButton { .. }
            | Error::AxisValueOutOfRange { .. } => ErrorCategory::Validation,
            Error::RelinquishFailed { .. }
            | Error::ButtonOperationFailed { .. }
            | Error::InvalidAxis {
                fault: AxisFault::DriverRejected,
                ..
            } => ErrorCategory::Driver,
            Error::FailedToAcquire { .. } => ErrorCategory::Recovery,
            Error::NotAcquired { .. } => ErrorCategory::Usage,
        }
    }

    /// Bad input rejected before reaching the driver.
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// The driver itself answered with failure.
    pub fn is_driver_failure(&self) -> bool {
        self.category() == ErrorCategory::Driver
    }

    /// Device the error concerns, when there is one.
    ///
    /// Range errors raised while staging a bare
    /// [`JoystickPosition`](crate::report::JoystickPosition) have no device.
    pub fn device(&self) -> Option<DeviceId> {
        match self {
            Error::InvalidButton { device, .. }
            | Error::AxisValueOutOfRange { device, .. }
            | Error::InvalidPovValue { device, .. }
            | Error::InvalidPovId { device, .. } => *device,
            Error::AlreadyOwnedBySelf { device }
            | Error::OwnedByOther { device }
            | Error::DeviceMissing { device }
            | Error::AcquireFailed { device, .. }
            | Error::RelinquishFailed { device }
            | Error::ButtonOperationFailed { device, .. }
            | Error::InvalidAxis { device, .. }
            | Error::NotAcquired { device, .. }
            | Error::FailedToAcquire { device, .. } => Some(*device),
            _ => None,
        }
    }
}

/// Failure to read or interpret a feeder configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
