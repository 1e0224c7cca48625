//! Runtime-loaded `vJoyInterface` library.
//!
//! Every entry point is resolved by name when the library is loaded, so a
//! stripped or mismatched build fails once, up front, instead of on first
//! use. Signatures follow `vJoyInterface.h` (`__cdecl`, `BOOL` = `i32`,
//! `UINT` = `u32`, `UCHAR` = `u8`).

use super::{DriverService, DriverVersions};
use crate::constants::VJD_STAT_OWN;
use crate::error::{Error, Result};
use crate::report::JoystickPosition;
use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type EnabledFn = unsafe extern "C" fn() -> i32;
type DriverMatchFn = unsafe extern "C" fn(*mut u16, *mut u16) -> i32;
type DeviceFn = unsafe extern "C" fn(u32) -> i32;
type RelinquishFn = unsafe extern "C" fn(u32);
type SetBtnFn = unsafe extern "C" fn(i32, u32, u8) -> i32;
type SetAxisFn = unsafe extern "C" fn(i32, u32, u32) -> i32;
type SetDiscPovFn = unsafe extern "C" fn(i32, u32, u8) -> i32;
type SetContPovFn = unsafe extern "C" fn(u32, u32, u8) -> i32;
type UpdateFn = unsafe extern "C" fn(u32, *mut c_void) -> i32;

struct EntryPoints {
    enabled: EnabledFn,
    driver_match: DriverMatchFn,
    status: DeviceFn,
    acquire: DeviceFn,
    relinquish: RelinquishFn,
    set_btn: SetBtnFn,
    set_axis: SetAxisFn,
    set_disc_pov: SetDiscPovFn,
    set_cont_pov: SetContPovFn,
    reset: DeviceFn,
    reset_buttons: DeviceFn,
    reset_povs: DeviceFn,
    update: UpdateFn,
}

impl EntryPoints {
    fn resolve(lib: &Library) -> std::result::Result<Self, String> {
        Ok(Self {
            enabled: symbol(lib, "vJoyEnabled")?,
            driver_match: symbol(lib, "DriverMatch")?,
            status: symbol(lib, "GetVJDStatus")?,
            acquire: symbol(lib, "AcquireVJD")?,
            relinquish: symbol(lib, "RelinquishVJD")?,
            set_btn: symbol(lib, "SetBtn")?,
            set_axis: symbol(lib, "SetAxis")?,
            set_disc_pov: symbol(lib, "SetDiscPov")?,
            set_cont_pov: symbol(lib, "SetContPov")?,
            reset: symbol(lib, "ResetVJD")?,
            reset_buttons: symbol(lib, "ResetButtons")?,
            reset_povs: symbol(lib, "ResetPovs")?,
            update: symbol(lib, "UpdateVJD")?,
        })
    }
}

fn symbol<T: Copy>(lib: &Library, name: &str) -> std::result::Result<T, String> {
    // SAFETY: every call site pairs `name` with the signature declared for it
    // in vJoyInterface.h, and the pointer is only used while `lib` is alive.
    unsafe { lib.get::<T>(name.as_bytes()) }
        .map(|sym| *sym)
        .map_err(|e| format!("missing entry point `{name}`: {e}"))
}

/// The vJoy interface library, loaded and resolved.
pub struct VJoyInterface {
    path: PathBuf,
    fns: EntryPoints,
    // Declared after `fns` so the pointers are gone before the library unloads.
    _library: Library,
}

impl VJoyInterface {
    /// Load the library at `path` and resolve all entry points.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "loading vJoy interface");

        // SAFETY: loading runs the library's initialisers; vJoyInterface only
        // sets up its own driver handle there.
        let library = unsafe { Library::new(&path) }.map_err(|e| Error::DriverLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let fns = EntryPoints::resolve(&library).map_err(|reason| Error::DriverLoad {
            path: path.clone(),
            reason,
        })?;

        info!(path = %path.display(), "vJoy interface loaded");
        Ok(Self {
            path,
            fns,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DriverService for VJoyInterface {
    fn enabled(&self) -> bool {
        // SAFETY: resolved with its declared signature; takes no arguments.
        unsafe { (self.fns.enabled)() != 0 }
    }

    fn driver_match(&self) -> (bool, DriverVersions) {
        let mut v = DriverVersions::default();
        // SAFETY: both out-pointers are valid for a u16 write for the whole call.
        let ok = unsafe { (self.fns.driver_match)(&mut v.dll, &mut v.driver) != 0 };
        (ok, v)
    }

    fn status(&self, device: u32) -> i32 {
        // SAFETY: plain integer in, plain integer out.
        unsafe { (self.fns.status)(device) }
    }

    fn acquire(&self, device: u32) -> bool {
        // SAFETY: plain integer in, plain integer out.
        unsafe { (self.fns.acquire)(device) != 0 }
    }

    /// `RelinquishVJD` returns nothing, so success is read back from the slot
    /// status: still owned by us afterwards means it failed.
    fn relinquish(&self, device: u32) -> bool {
        // SAFETY: plain integer in, nothing out.
        unsafe { (self.fns.relinquish)(device) };
        self.status(device) != VJD_STAT_OWN
    }

    fn set_button(&self, device: u32, button: u8, pressed: bool) -> bool {
        // SAFETY: plain integers in, plain integer out.
        unsafe { (self.fns.set_btn)(i32::from(pressed), device, button) != 0 }
    }

    fn set_axis(&self, device: u32, usage: u32, value: i32) -> bool {
        // SAFETY: plain integers in, plain integer out.
        unsafe { (self.fns.set_axis)(value, device, usage) != 0 }
    }

    fn set_discrete_pov(&self, device: u32, pov: u8, value: i32) -> bool {
        // SAFETY: plain integers in, plain integer out.
        unsafe { (self.fns.set_disc_pov)(value, device, pov) != 0 }
    }

    fn set_continuous_pov(&self, device: u32, pov: u8, value: i32) -> bool {
        // The driver takes a DWORD; -1 (neutral) becomes 0xFFFFFFFF.
        // SAFETY: plain integers in, plain integer out.
        unsafe { (self.fns.set_cont_pov)(value as u32, device, pov) != 0 }
    }

    fn reset(&self, device: u32) -> bool {
        // SAFETY: plain integer in, plain integer out.
        unsafe { (self.fns.reset)(device) != 0 }
    }

    fn reset_buttons(&self, device: u32) -> bool {
        // SAFETY: plain integer in, plain integer out.
        unsafe { (self.fns.reset_buttons)(device) != 0 }
    }

    fn reset_povs(&self, device: u32) -> bool {
        // SAFETY: plain integer in, plain integer out.
        unsafe { (self.fns.reset_povs)(device) != 0 }
    }

    fn update(&self, device: u32, report: &mut JoystickPosition) -> bool {
        let data = (report as *mut JoystickPosition).cast::<c_void>();
        // SAFETY: `JoystickPosition` is `#[repr(C)]` with the exact
        // JOYSTICK_POSITION_V2 layout and is exclusively borrowed for the call.
        unsafe { (self.fns.update)(device, data) != 0 }
    }
}
