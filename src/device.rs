//! Device session: one owned vJoy device.
//!
//! [`VJoyDevice`] ties a [`DeviceId`] to an acquisition state and a staged
//! [`JoystickPosition`]. Constructing one acquires the device; there is no
//! half-built session.
//!
//! ## Two ways to write
//! - **Immediate:** `set_button`, `set_axis`, `set_*_pov` and the resets each
//!   make one driver round trip. Whatever the driver accepts is mirrored into
//!   the staged report, so a later `update` does not undo it.
//! - **Staged:** edit [`VJoyDevice::data_mut`] and send everything at once
//!   with [`VJoyDevice::update`].
//!
//! ## Lifetime
//! Release is part of the contract: call [`VJoyDevice::relinquish`], or run
//! the work inside [`VJoyDevice::scoped`]. `Drop` also tries to release the
//! device, but only as a safety net. It does not run for leaked values, on
//! `panic = "abort"` or `std::process::exit`.
//!
//! Once relinquished, every operation fails with [`Error::NotAcquired`]
//! without contacting the driver. A release the driver refuses leaves the
//! session acquired, so it can be retried.

use crate::binding::Binding;
use crate::config::DEFAULT_SETTLE_DELAY_MS;
use crate::constants::{
    DeviceStatus, AXIS_MAX, AXIS_MIN, MAX_BUTTONS, MAX_DEVICE_ID, MIN_DEVICE_ID,
};
use crate::error::{Error, Result};
use crate::report::JoystickPosition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A vJoy device slot number, 1..=16.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DeviceId(u8);

impl DeviceId {
    pub fn new(value: u32) -> Result<Self> {
        if (MIN_DEVICE_ID..=MAX_DEVICE_ID).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidDeviceId { value })
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// All sixteen slots in order.
    pub fn all() -> impl Iterator<Item = DeviceId> {
        (MIN_DEVICE_ID..=MAX_DEVICE_ID).map(|n| DeviceId(n as u8))
    }
}

impl TryFrom<u32> for DeviceId {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DeviceId> for u32 {
    fn from(id: DeviceId) -> Self {
        u32::from(id.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a session is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// The driver confirmed we own the device.
    Acquired,
    /// A `reacquire` failed; the device is not ours. `reacquire` may be retried.
    Lost,
    /// Released on purpose. Terminal.
    Relinquished,
}

/// Knobs for opening a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Pause between release and acquire in [`VJoyDevice::reacquire`].
    pub settle_delay: Duration,
    /// Also run the interface/driver version check before acquiring.
    pub check_version: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            check_version: false,
        }
    }
}

/// An acquired vJoy device.
pub struct VJoyDevice {
    id: DeviceId,
    binding: Binding,
    state: SessionState,
    options: SessionOptions,
    data: JoystickPosition,
}

impl fmt::Debug for VJoyDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VJoyDevice")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl VJoyDevice {
    /// Acquire device `id` with default options.
    pub fn new(binding: Binding, id: u32) -> Result<Self> {
        Self::open(binding, id, SessionOptions::default())
    }

    /// Acquire device `id`.
    ///
    /// Checks the id range before touching the driver, then requires the
    /// driver to be enabled (and versions to match, if asked) and the device
    /// to be acquired. Any failure is returned and no session exists.
    pub fn open(binding: Binding, id: u32, options: SessionOptions) -> Result<Self> {
        let id = DeviceId::new(id)?;
        binding.is_enabled()?;
        if options.check_version {
            binding.check_version()?;
        }
        binding.acquire(id)?;
        info!(device = %id, "session opened");

        Ok(Self {
            id,
            binding,
            state: SessionState::Acquired,
            options,
            data: JoystickPosition::new(id),
        })
    }

    /// Acquire device `id`, run `f`, then release the device.
    ///
    /// Release happens whether `f` returns normally or not. A failing release
    /// is logged, not returned, and `Drop` makes one more attempt.
    pub fn scoped<R>(binding: Binding, id: u32, f: impl FnOnce(&mut VJoyDevice) -> R) -> Result<R> {
        let mut dev = Self::new(binding, id)?;
        let out = f(&mut dev);
        dev.release_quietly();
        Ok(out)
    }

    /// Install a pre-built report. Its `device` byte is rewritten to this id.
    pub fn with_data(mut self, data: JoystickPosition) -> Self {
        self.data = data;
        self.data.device = self.id.get();
        self
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_acquired(&self) -> bool {
        self.state == SessionState::Acquired
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Live status of this slot, straight from the driver.
    pub fn status(&self) -> DeviceStatus {
        self.binding.query_status(self.id)
    }

    /// The staged report.
    pub fn data(&self) -> &JoystickPosition {
        &self.data
    }

    /// Edit the staged report. Nothing reaches the driver until [`update`](Self::update).
    pub fn data_mut(&mut self) -> &mut JoystickPosition {
        &mut self.data
    }

    fn ensure_acquired(&self) -> Result<()> {
        if self.is_acquired() {
            Ok(())
        } else {
            Err(Error::NotAcquired {
                device: self.id,
                state: self.state,
            })
        }
    }

    /// Press or release button `button` (1..=128) right away.
    pub fn set_button(&mut self, button: u32, pressed: bool) -> Result<()> {
        self.ensure_acquired()?;
        if !(1..=MAX_BUTTONS).contains(&button) {
            return Err(Error::InvalidButton {
                device: Some(self.id),
                button,
            });
        }
        self.binding.set_button(self.id, button as u8, pressed)?;
        self.data.set_button(button, pressed)
    }

    /// Set an axis right away. `value` must be within `0x0000..=0x8000`; the
    /// binding checks the usage itself.
    pub fn set_axis(&mut self, usage: impl Into<u32>, value: i32) -> Result<()> {
        self.ensure_acquired()?;
        let usage = usage.into();
        if !(AXIS_MIN..=AXIS_MAX).contains(&value) {
            return Err(Error::AxisValueOutOfRange {
                device: Some(self.id),
                axis: usage,
                value,
            });
        }
        self.binding.set_axis(self.id, usage, value)?;
        match self.data.set_axis(usage, value) {
            // POV usage has no axis field to mirror into.
            Ok(()) | Err(Error::UnmappedAxis { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn set_discrete_pov(&mut self, pov: u32, value: i32) -> Result<bool> {
        self.ensure_acquired()?;
        let ok = self.binding.set_discrete_pov(self.id, pov, value)?;
        if ok {
            self.data.set_discrete_pov(pov, value)?;
        }
        Ok(ok)
    }

    pub fn set_continuous_pov(&mut self, pov: u32, value: i32) -> Result<bool> {
        self.ensure_acquired()?;
        let ok = self.binding.set_continuous_pov(self.id, pov, value)?;
        if ok {
            self.data.set_continuous_pov(pov, value)?;
        }
        Ok(ok)
    }

    /// Reset axes, buttons and hats on the device to their defaults.
    pub fn reset(&mut self) -> Result<bool> {
        self.ensure_acquired()?;
        let ok = self.binding.reset_device(self.id);
        if ok {
            self.data = JoystickPosition::new(self.id);
        }
        Ok(ok)
    }

    pub fn reset_buttons(&mut self) -> Result<bool> {
        self.ensure_acquired()?;
        let ok = self.binding.reset_buttons(self.id);
        if ok {
            self.data.clear_buttons();
        }
        Ok(ok)
    }

    pub fn reset_povs(&mut self) -> Result<bool> {
        self.ensure_acquired()?;
        let ok = self.binding.reset_povs(self.id);
        if ok {
            self.data.clear_povs();
        }
        Ok(ok)
    }

    /// Throw away staged changes. The device itself is untouched.
    pub fn reset_data(&mut self) -> Result<()> {
        self.ensure_acquired()?;
        self.data = JoystickPosition::new(self.id);
        Ok(())
    }

    /// Send the staged report in one driver call.
    pub fn update(&mut self) -> Result<bool> {
        self.ensure_acquired()?;
        Ok(self.binding.bulk_update(self.id, &mut self.data))
    }

    /// Release and acquire the device again, then reset it.
    ///
    /// Recovers a session whose device was taken away behind its back. The
    /// release step may fail (the device might not be ours any more) and that
    /// failure is ignored. If acquiring fails the session becomes
    /// [`SessionState::Lost`] and the cause is wrapped in
    /// [`Error::FailedToAcquire`]. Not available once relinquished.
    pub fn reacquire(&mut self) -> Result<()> {
        if self.state == SessionState::Relinquished {
            return Err(Error::NotAcquired {
                device: self.id,
                state: self.state,
            });
        }
        if self.state == SessionState::Acquired {
            if let Err(e) = self.binding.relinquish(self.id) {
                debug!(device = %self.id, error = %e, "release before reacquire failed");
            }
        }

        std::thread::sleep(self.options.settle_delay);

        match self.binding.acquire(self.id) {
            Ok(()) => {
                self.state = SessionState::Acquired;
                let reset = self.binding.reset_device(self.id);
                if reset {
                    self.data = JoystickPosition::new(self.id);
                }
                info!(device = %self.id, reset, "device reacquired");
                Ok(())
            }
            Err(source) => {
                self.state = SessionState::Lost;
                warn!(device = %self.id, error = %source, "reacquire failed");
                Err(Error::FailedToAcquire {
                    device: self.id,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Give the device back to the driver.
    ///
    /// Does nothing unless the device is currently acquired, so calling it
    /// twice is fine. If the driver refuses, the error is returned and the
    /// session stays acquired; a later call (or `Drop`) tries again.
    pub fn relinquish(&mut self) -> Result<()> {
        if !self.is_acquired() {
            return Ok(());
        }
        self.binding.relinquish(self.id)?;
        self.state = SessionState::Relinquished;
        Ok(())
    }

    fn release_quietly(&mut self) {
        if let Err(e) = self.relinquish() {
            warn!(device = %self.id, error = %e, "release on scope exit failed");
        }
    }
}

impl Drop for VJoyDevice {
    fn drop(&mut self) {
        self.release_quietly();
    }
}
