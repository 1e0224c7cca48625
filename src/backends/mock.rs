//! In-process stand-in for the vJoy driver.
//!
//! [`MockDriver`] keeps a status per slot, follows the acquire/relinquish
//! protocol the way the real driver does, and records every call so tests can
//! assert on exactly what reached "the driver". Outcomes can be scripted:
//!
//! ```
//! use std::sync::Arc;
//! use vjoy_feeder::backends::mock::MockDriver;
//! use vjoy_feeder::{Binding, DeviceStatus, VJoyDevice};
//!
//! let driver = Arc::new(MockDriver::new());
//! driver.set_status(2, DeviceStatus::Busy);
//!
//! let binding = Binding::new(driver.clone());
//! assert!(VJoyDevice::new(binding, 2).is_err());
//! ```

use super::{DriverService, DriverVersions};
use crate::constants::{DeviceStatus, MAX_DEVICE_ID, MIN_DEVICE_ID};
use crate::report::JoystickPosition;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One primitive call as seen by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Enabled,
    DriverMatch,
    Status { device: u32 },
    Acquire { device: u32 },
    Relinquish { device: u32 },
    SetButton { device: u32, button: u8, pressed: bool },
    SetAxis { device: u32, usage: u32, value: i32 },
    SetDiscretePov { device: u32, pov: u8, value: i32 },
    SetContinuousPov { device: u32, pov: u8, value: i32 },
    Reset { device: u32 },
    ResetButtons { device: u32 },
    ResetPovs { device: u32 },
    Update { device: u32, report: JoystickPosition },
}

struct MockState {
    enabled: bool,
    versions_match: bool,
    versions: DriverVersions,
    statuses: HashMap<u32, DeviceStatus>,
    acquire_override: Option<bool>,
    relinquish_ok: bool,
    writes_ok: bool,
    calls: Vec<DriverCall>,
}

/// Scriptable, recording [`DriverService`].
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Enabled driver, matching versions, all 16 slots free.
    pub fn new() -> Self {
        let statuses = (MIN_DEVICE_ID..=MAX_DEVICE_ID)
            .map(|id| (id, DeviceStatus::Free))
            .collect();
        Self {
            state: Mutex::new(MockState {
                enabled: true,
                versions_match: true,
                versions: DriverVersions {
                    dll: 0x0219,
                    driver: 0x0219,
                },
                statuses,
                acquire_override: None,
                relinquish_ok: true,
                writes_ok: true,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn set_versions(&self, dll: u16, driver: u16) {
        let mut s = self.lock();
        s.versions = DriverVersions { dll, driver };
        s.versions_match = dll == driver;
    }

    /// Put a slot into a given status, e.g. `Busy` to simulate another feeder.
    pub fn set_status(&self, device: u32, status: DeviceStatus) {
        self.lock().statuses.insert(device, status);
    }

    /// Force every `acquire` to return `result`; `None` restores normal behavior.
    pub fn set_acquire_override(&self, result: Option<bool>) {
        self.lock().acquire_override = result;
    }

    /// When `false`, `relinquish` fails and the slot stays owned.
    pub fn set_relinquish_ok(&self, ok: bool) {
        self.lock().relinquish_ok = ok;
    }

    /// When `false`, every button/axis/POV/reset/update call reports failure.
    pub fn set_writes_ok(&self, ok: bool) {
        self.lock().writes_ok = ok;
    }

    /// Simulate another process force-releasing our device.
    pub fn drop_ownership(&self, device: u32) {
        self.set_status(device, DeviceStatus::Free);
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Last report passed to `update`.
    pub fn last_report(&self) -> Option<JoystickPosition> {
        self.lock().calls.iter().rev().find_map(|c| match c {
            DriverCall::Update { report, .. } => Some(*report),
            _ => None,
        })
    }

    fn write(&self, call: DriverCall) -> bool {
        let mut s = self.lock();
        s.calls.push(call);
        s.writes_ok
    }
}

impl MockState {
    fn status_of(&self, device: u32) -> DeviceStatus {
        self.statuses
            .get(&device)
            .copied()
            .unwrap_or(DeviceStatus::Missing)
    }
}

impl DriverService for MockDriver {
    fn enabled(&self) -> bool {
        let mut s = self.lock();
        s.calls.push(DriverCall::Enabled);
        s.enabled
    }

    fn driver_match(&self) -> (bool, DriverVersions) {
        let mut s = self.lock();
        s.calls.push(DriverCall::DriverMatch);
        (s.versions_match, s.versions)
    }

    fn status(&self, device: u32) -> i32 {
        let mut s = self.lock();
        s.calls.push(DriverCall::Status { device });
        s.status_of(device).as_raw()
    }

    fn acquire(&self, device: u32) -> bool {
        let mut s = self.lock();
        s.calls.push(DriverCall::Acquire { device });
        let ok = s
            .acquire_override
            .unwrap_or_else(|| s.status_of(device) == DeviceStatus::Free);
        if ok {
            s.statuses.insert(device, DeviceStatus::Own);
        }
        ok
    }

    fn relinquish(&self, device: u32) -> bool {
        let mut s = self.lock();
        s.calls.push(DriverCall::Relinquish { device });
        if !s.relinquish_ok {
            return false;
        }
        if s.status_of(device) == DeviceStatus::Own {
            s.statuses.insert(device, DeviceStatus::Free);
        }
        true
    }

    fn set_button(&self, device: u32, button: u8, pressed: bool) -> bool {
        self.write(DriverCall::SetButton {
            device,
            button,
            pressed,
        })
    }

    fn set_axis(&self, device: u32, usage: u32, value: i32) -> bool {
        self.write(DriverCall::SetAxis {
            device,
            usage,
            value,
        })
    }

    fn set_discrete_pov(&self, device: u32, pov: u8, value: i32) -> bool {
        self.write(DriverCall::SetDiscretePov { device, pov, value })
    }

    fn set_continuous_pov(&self, device: u32, pov: u8, value: i32) -> bool {
        self.write(DriverCall::SetContinuousPov { device, pov, value })
    }

    fn reset(&self, device: u32) -> bool {
        self.write(DriverCall::Reset { device })
    }

    fn reset_buttons(&self, device: u32) -> bool {
        self.write(DriverCall::ResetButtons { device })
    }

    fn reset_povs(&self, device: u32) -> bool {
        self.write(DriverCall::ResetPovs { device })
    }

    fn update(&self, device: u32, report: &mut JoystickPosition) -> bool {
        self.write(DriverCall::Update {
            device,
            report: *report,
        })
    }
}
