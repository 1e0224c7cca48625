//! Write joystick reports into vJoy virtual devices.
//!
//! Acquire a numbered vJoy device, stage or send axis/button/POV state, and
//! give the device back when done.
//!
//! ```no_run
//! use vjoy_feeder::{Binding, HidUsage, VJoyDevice};
//!
//! # fn main() -> vjoy_feeder::Result<()> {
//! let binding = Binding::global()?;
//! VJoyDevice::scoped(binding, 1, |joystick| -> vjoy_feeder::Result<()> {
//!     joystick.set_axis(HidUsage::X, 0x4000)?;
//!     joystick.set_button(1, true)?;
//!     Ok(())
//! })??;
//! # Ok(())
//! # }
//! ```
//!
//! Layers, bottom up: [`constants`], [`report`], [`backends`] + [`binding`],
//! [`device`].

pub mod backends;
pub mod binding;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod report;

pub use backends::{DriverService, DriverVersions};
pub use binding::Binding;
pub use config::FeederConfig;
pub use constants::{DeviceStatus, HidUsage};
pub use device::{DeviceId, SessionOptions, SessionState, VJoyDevice};
pub use error::{ConfigError, Error, ErrorCategory, Result};
pub use report::JoystickPosition;
