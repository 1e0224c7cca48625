//! Driver binding: raw vJoy primitives in, typed results out.
//!
//! [`Binding`] is a cheap, cloneable handle to a [`DriverService`]. Each method
//! performs one driver round trip and turns the raw answer into either a value
//! or a classified [`Error`]. Range checks that the driver would otherwise
//! reject silently (axis usage, POV id and value) happen here, before the call.
//!
//! The reset family and bulk update hand back the driver's boolean as-is.

use crate::backends::{DriverService, DriverVersions};
#[cfg(feature = "dynamic")]
use crate::config::FeederConfig;
use crate::constants::{is_supported_usage, DeviceStatus};
use crate::device::DeviceId;
use crate::error::{AxisFault, Error, PovKind, Result};
use crate::report::{check_pov_id, check_pov_value, JoystickPosition};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shared handle to the driver service.
#[derive(Clone)]
pub struct Binding {
    service: Arc<dyn DriverService>,
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding").finish_non_exhaustive()
    }
}

#[cfg(feature = "dynamic")]
static GLOBAL: std::sync::OnceLock<std::result::Result<Binding, (std::path::PathBuf, String)>> =
    std::sync::OnceLock::new();

impl Binding {
    /// Wrap any driver service, e.g. [`MockDriver`](crate::backends::mock::MockDriver).
    pub fn new(service: Arc<dyn DriverService>) -> Self {
        Self { service }
    }

    /// The process-wide binding to the installed vJoy interface.
    ///
    /// The library is loaded on first use, at the default location. A failed
    /// load is remembered: every later call reports the same
    /// [`Error::DriverLoad`] without trying again.
    #[cfg(feature = "dynamic")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
    pub fn global() -> Result<Self> {
        Self::global_with(&FeederConfig::default())
    }

    /// Like [`Binding::global`], loading from `config.library_path()` if this
    /// is the first call in the process. Later calls ignore `config`.
    #[cfg(feature = "dynamic")]
    #[cfg_attr(docsrs, doc(cfg(feature = "dynamic")))]
    pub fn global_with(config: &FeederConfig) -> Result<Self> {
        use crate::backends::dynamic::VJoyInterface;

        let slot = GLOBAL.get_or_init(|| {
            let path = config.library_path();
            match VJoyInterface::load(&path) {
                Ok(lib) => Ok(Binding::new(Arc::new(lib))),
                Err(Error::DriverLoad { path, reason }) => {
                    tracing::error!(path = %path.display(), %reason, "vJoy interface unavailable");
                    Err((path, reason))
                }
                Err(other) => Err((path, other.to_string())),
            }
        });
        match slot {
            Ok(binding) => Ok(binding.clone()),
            Err((path, reason)) => Err(Error::DriverLoad {
                path: path.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Fails with [`Error::DriverNotEnabled`] unless vJoy is installed and enabled.
    pub fn is_enabled(&self) -> Result<()> {
        if self.service.enabled() {
            Ok(())
        } else {
            Err(Error::DriverNotEnabled)
        }
    }

    /// Fails with [`Error::DriverVersionMismatch`] unless the interface library
    /// and the driver are the same version.
    pub fn check_version(&self) -> Result<DriverVersions> {
        let (ok, versions) = self.service.driver_match();
        debug!(dll = versions.dll, driver = versions.driver, ok, "driver match");
        if ok {
            Ok(versions)
        } else {
            Err(Error::DriverVersionMismatch {
                dll: versions.dll,
                driver: versions.driver,
            })
        }
    }

    pub fn query_status(&self, device: DeviceId) -> DeviceStatus {
        DeviceStatus::from_raw(self.service.status(device.into()))
    }

    /// Take exclusive ownership of `device`.
    ///
    /// The driver only answers yes or no, so a refusal is followed by a status
    /// query to say why.
    #[instrument(level = "debug", skip_all, fields(device = %device))]
    pub fn acquire(&self, device: DeviceId) -> Result<()> {
        if self.service.acquire(device.into()) {
            info!("acquired");
            return Ok(());
        }
        let status = self.query_status(device);
        debug!(%status, "acquire refused");
        Err(match status {
            DeviceStatus::Own => Error::AlreadyOwnedBySelf { device },
            DeviceStatus::Busy => Error::OwnedByOther { device },
            DeviceStatus::Missing => Error::DeviceMissing { device },
            status => Error::AcquireFailed { device, status },
        })
    }

    #[instrument(level = "debug", skip_all, fields(device = %device))]
    pub fn relinquish(&self, device: DeviceId) -> Result<()> {
        if self.service.relinquish(device.into()) {
            info!("relinquished");
            Ok(())
        } else {
            Err(Error::RelinquishFailed { device })
        }
    }

    /// Press or release `button`. The caller has range-checked it.
    pub fn set_button(&self, device: DeviceId, button: u8, pressed: bool) -> Result<()> {
        debug!(device = %device, button, pressed, "set button");
        if self.service.set_button(device.into(), button, pressed) {
            Ok(())
        } else {
            Err(Error::ButtonOperationFailed { device, button })
        }
    }

    /// Set the axis with HID usage `usage` (0x30..=0x39).
    pub fn set_axis(&self, device: DeviceId, usage: u32, value: i32) -> Result<()> {
        if !is_supported_usage(usage) {
            return Err(Error::InvalidAxis {
                device,
                axis: usage,
                fault: AxisFault::UnsupportedUsage,
            });
        }
        debug!(device = %device, usage, value, "set axis");
        if self.service.set_axis(device.into(), usage, value) {
            Ok(())
        } else {
            Err(Error::InvalidAxis {
                device,
                axis: usage,
                fault: AxisFault::DriverRejected,
            })
        }
    }

    /// Write a discrete hat. `value` is checked before `pov`.
    pub fn set_discrete_pov(&self, device: DeviceId, pov: u32, value: i32) -> Result<bool> {
        check_pov_value(PovKind::Discrete, value, Some(device))?;
        let pov = check_pov_id(pov, Some(device))?;
        debug!(device = %device, pov, value, "set discrete pov");
        Ok(self.service.set_discrete_pov(device.into(), pov, value))
    }

    /// Write a continuous hat. `value` is checked before `pov`.
    pub fn set_continuous_pov(&self, device: DeviceId, pov: u32, value: i32) -> Result<bool> {
        check_pov_value(PovKind::Continuous, value, Some(device))?;
        let pov = check_pov_id(pov, Some(device))?;
        debug!(device = %device, pov, value, "set continuous pov");
        Ok(self.service.set_continuous_pov(device.into(), pov, value))
    }

    pub fn reset_device(&self, device: DeviceId) -> bool {
        self.service.reset(device.into())
    }

    pub fn reset_buttons(&self, device: DeviceId) -> bool {
        self.service.reset_buttons(device.into())
    }

    pub fn reset_povs(&self, device: DeviceId) -> bool {
        self.service.reset_povs(device.into())
    }

    /// Send a whole report in one call.
    pub fn bulk_update(&self, device: DeviceId, report: &mut JoystickPosition) -> bool {
        debug!(device = %device, "bulk update");
        self.service.update(device.into(), report)
    }
}
