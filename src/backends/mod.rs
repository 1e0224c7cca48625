//! Driver service backends for `vjoy-feeder`.
//!
//! A backend implements [`DriverService`]: the raw vJoy primitives, one method
//! per driver entry point, returning exactly what the driver returns. No
//! validation and no error classification happens here; that is the job of
//! [`Binding`](crate::binding::Binding).
//!
//! # Feature flags
//! - **`dynamic`**: [`dynamic::VJoyInterface`], which loads `vJoyInterface`
//!   at runtime (default in this build).
//!
//! [`mock::MockDriver`] is always available so applications can test their
//! feeding logic without the driver installed.

use crate::report::JoystickPosition;

#[cfg(feature = "dynamic")]
#[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
pub mod dynamic;
pub mod mock;

/// Interface and driver versions as reported by `DriverMatch`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriverVersions {
    pub dll: u16,
    pub driver: u16,
}

/// The raw vJoy primitives.
///
/// Device ids are passed through unchecked, and `bool` means the driver
/// reported success. Every call blocks until the driver answers.
pub trait DriverService: Send + Sync {
    fn enabled(&self) -> bool;

    /// Whether the interface library and driver versions match, plus both versions.
    fn driver_match(&self) -> (bool, DriverVersions);

    /// Raw `VjdStat` value for a slot.
    fn status(&self, device: u32) -> i32;

    fn acquire(&self, device: u32) -> bool;

    fn relinquish(&self, device: u32) -> bool;

    fn set_button(&self, device: u32, button: u8, pressed: bool) -> bool;

    fn set_axis(&self, device: u32, usage: u32, value: i32) -> bool;

    fn set_discrete_pov(&self, device: u32, pov: u8, value: i32) -> bool;

    fn set_continuous_pov(&self, device: u32, pov: u8, value: i32) -> bool;

    fn reset(&self, device: u32) -> bool;

    fn reset_buttons(&self, device: u32) -> bool;

    fn reset_povs(&self, device: u32) -> bool;

    /// Send a whole report. The driver may write into the record.
    fn update(&self, device: u32, report: &mut JoystickPosition) -> bool;
}
