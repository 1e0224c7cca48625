//! The report record handed to the driver by `UpdateVJD`.
//!
//! [`JoystickPosition`] mirrors `JOYSTICK_POSITION_V2` from the vJoy SDK field
//! for field. The driver reads it straight out of our memory, so the layout is
//! part of the ABI: `#[repr(C)]`, 108 bytes, 4-byte aligned, three padding
//! bytes after `device`. The asserts below fail the build if that drifts.
//!
//! Staging changes here never talks to the driver. Send the record with
//! [`VJoyDevice::update`](crate::device::VJoyDevice::update).

use crate::constants::*;
use crate::device::DeviceId;
use crate::error::{Error, PovKind, Result};
use serde::{Deserialize, Serialize};
use std::mem::{align_of, offset_of, size_of};

/// Size in bytes of the wire record.
pub const REPORT_SIZE: usize = 108;

const _: [(); REPORT_SIZE] = [(); size_of::<JoystickPosition>()];
const _: [(); 4] = [(); align_of::<JoystickPosition>()];
const _: [(); 4] = [(); offset_of!(JoystickPosition, throttle)];
const _: [(); 16] = [(); offset_of!(JoystickPosition, axis_x)];
const _: [(); 76] = [(); offset_of!(JoystickPosition, buttons)];
const _: [(); 80] = [(); offset_of!(JoystickPosition, hats)];
const _: [(); 96] = [(); offset_of!(JoystickPosition, buttons_ex1)];

/// Complete instantaneous state of one virtual device.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoystickPosition {
    /// Report id; the device identifier (1..=16).
    pub device: u8,
    pub throttle: i32,
    pub rudder: i32,
    pub aileron: i32,
    pub axis_x: i32,
    pub axis_y: i32,
    pub axis_z: i32,
    pub axis_x_rot: i32,
    pub axis_y_rot: i32,
    pub axis_z_rot: i32,
    pub slider: i32,
    pub dial: i32,
    pub wheel: i32,
    pub axis_vx: i32,
    pub axis_vy: i32,
    pub axis_vz: i32,
    pub axis_vbrx: i32,
    pub axis_vbry: i32,
    pub axis_vbrz: i32,
    /// Buttons 1..=32. Bit 0 is button 1, bit 31 is button 32.
    pub buttons: i32,
    /// POV 1. Low 4 bits for a discrete hat, low 16 bits for a continuous one.
    pub hats: u32,
    pub hats_ex1: u32,
    pub hats_ex2: u32,
    pub hats_ex3: u32,
    /// Buttons 33..=64.
    pub buttons_ex1: i32,
    /// Buttons 65..=96.
    pub buttons_ex2: i32,
    /// Buttons 97..=128.
    pub buttons_ex3: i32,
}

impl JoystickPosition {
    /// A record for `device` with every hat neutral and everything else zero.
    pub fn new(device: DeviceId) -> Self {
        Self {
            device: device.get(),
            throttle: 0,
            rudder: 0,
            aileron: 0,
            axis_x: 0,
            axis_y: 0,
            axis_z: 0,
            axis_x_rot: 0,
            axis_y_rot: 0,
            axis_z_rot: 0,
            slider: 0,
            dial: 0,
            wheel: 0,
            axis_vx: 0,
            axis_vy: 0,
            axis_vz: 0,
            axis_vbrx: 0,
            axis_vbry: 0,
            axis_vbrz: 0,
            buttons: 0,
            hats: POV_NEUTRAL_RAW,
            hats_ex1: POV_NEUTRAL_RAW,
            hats_ex2: POV_NEUTRAL_RAW,
            hats_ex3: POV_NEUTRAL_RAW,
            buttons_ex1: 0,
            buttons_ex2: 0,
            buttons_ex3: 0,
        }
    }

    fn axis_slot(&mut self, usage: u32) -> Option<&mut i32> {
        let slot = match HidUsage::from_code(usage)? {
            HidUsage::X => &mut self.axis_x,
            HidUsage::Y => &mut self.axis_y,
            HidUsage::Z => &mut self.axis_z,
            HidUsage::Rx => &mut self.axis_x_rot,
            HidUsage::Ry => &mut self.axis_y_rot,
            HidUsage::Rz => &mut self.axis_z_rot,
            HidUsage::Slider => &mut self.slider,
            HidUsage::Dial => &mut self.dial,
            HidUsage::Wheel => &mut self.wheel,
            HidUsage::Pov => return None,
        };
        Some(slot)
    }

    /// Stage an axis value by HID usage (`X` through `Wheel`).
    pub fn set_axis(&mut self, usage: impl Into<u32>, value: i32) -> Result<()> {
        let usage = usage.into();
        if !(AXIS_MIN..=AXIS_MAX).contains(&value) {
            return Err(Error::AxisValueOutOfRange {
                device: None,
                axis: usage,
                value,
            });
        }
        let slot = self
            .axis_slot(usage)
            .ok_or(Error::UnmappedAxis { axis: usage })?;
        *slot = value;
        Ok(())
    }

    /// Staged value of an axis, or `None` if the usage has no field.
    pub fn axis(&self, usage: impl Into<u32>) -> Option<i32> {
        let value = match HidUsage::from_code(usage.into())? {
            HidUsage::X => self.axis_x,
            HidUsage::Y => self.axis_y,
            HidUsage::Z => self.axis_z,
            HidUsage::Rx => self.axis_x_rot,
            HidUsage::Ry => self.axis_y_rot,
            HidUsage::Rz => self.axis_z_rot,
            HidUsage::Slider => self.slider,
            HidUsage::Dial => self.dial,
            HidUsage::Wheel => self.wheel,
            HidUsage::Pov => return None,
        };
        Some(value)
    }

    fn button_slot(&mut self, button: u32) -> Result<(&mut i32, u32)> {
        if !(1..=MAX_BUTTONS).contains(&button) {
            return Err(Error::InvalidButton {
                device: None,
                button,
            });
        }
        let bit = (button - 1) % 32;
        let mask = match (button - 1) / 32 {
            0 => &mut self.buttons,
            1 => &mut self.buttons_ex1,
            2 => &mut self.buttons_ex2,
            _ => &mut self.buttons_ex3,
        };
        Ok((mask, bit))
    }

    /// Stage button `button` (1..=128).
    pub fn set_button(&mut self, button: u32, pressed: bool) -> Result<()> {
        let (mask, bit) = self.button_slot(button)?;
        let flag = 1i32 << bit;
        if pressed {
            *mask |= flag;
        } else {
            *mask &= !flag;
        }
        Ok(())
    }

    pub fn button(&self, button: u32) -> Result<bool> {
        if !(1..=MAX_BUTTONS).contains(&button) {
            return Err(Error::InvalidButton {
                device: None,
                button,
            });
        }
        let mask = match (button - 1) / 32 {
            0 => self.buttons,
            1 => self.buttons_ex1,
            2 => self.buttons_ex2,
            _ => self.buttons_ex3,
        };
        Ok(mask & (1i32 << ((button - 1) % 32)) != 0)
    }

    fn pov_slot(&mut self, pov: u32) -> Result<&mut u32> {
        match pov {
            1 => Ok(&mut self.hats),
            2 => Ok(&mut self.hats_ex1),
            3 => Ok(&mut self.hats_ex2),
            4 => Ok(&mut self.hats_ex3),
            _ => Err(Error::InvalidPovId { device: None, pov }),
        }
    }

    /// Stage a discrete hat: `-1` neutral, `0..=3` N/E/S/W.
    pub fn set_discrete_pov(&mut self, pov: u32, value: i32) -> Result<()> {
        check_pov_value(PovKind::Discrete, value, None)?;
        *self.pov_slot(pov)? = encode_pov(value);
        Ok(())
    }

    /// Stage a continuous hat: `-1` neutral, `0..=35999` hundredths of a degree.
    pub fn set_continuous_pov(&mut self, pov: u32, value: i32) -> Result<()> {
        check_pov_value(PovKind::Continuous, value, None)?;
        *self.pov_slot(pov)? = encode_pov(value);
        Ok(())
    }

    /// Raw hat field; [`POV_NEUTRAL_RAW`] when neutral.
    pub fn pov(&self, pov: u32) -> Result<u32> {
        match pov {
            1 => Ok(self.hats),
            2 => Ok(self.hats_ex1),
            3 => Ok(self.hats_ex2),
            4 => Ok(self.hats_ex3),
            _ => Err(Error::InvalidPovId { device: None, pov }),
        }
    }

    /// Release all 128 buttons.
    pub fn clear_buttons(&mut self) {
        self.buttons = 0;
        self.buttons_ex1 = 0;
        self.buttons_ex2 = 0;
        self.buttons_ex3 = 0;
    }

    /// Put all four hats in neutral.
    pub fn clear_povs(&mut self) {
        self.hats = POV_NEUTRAL_RAW;
        self.hats_ex1 = POV_NEUTRAL_RAW;
        self.hats_ex2 = POV_NEUTRAL_RAW;
        self.hats_ex3 = POV_NEUTRAL_RAW;
    }

    /// Little-endian image of the record exactly as the driver sees it on x86.
    /// Padding bytes are zero.
    pub fn to_bytes(&self) -> [u8; REPORT_SIZE] {
        let mut b = [0u8; REPORT_SIZE];
        b[0] = self.device;

        let words: [u32; 26] = [
            self.throttle as u32,
            self.rudder as u32,
            self.aileron as u32,
            self.axis_x as u32,
            self.axis_y as u32,
            self.axis_z as u32,
            self.axis_x_rot as u32,
            self.axis_y_rot as u32,
            self.axis_z_rot as u32,
            self.slider as u32,
            self.dial as u32,
            self.wheel as u32,
            self.axis_vx as u32,
            self.axis_vy as u32,
            self.axis_vz as u32,
            self.axis_vbrx as u32,
            self.axis_vbry as u32,
            self.axis_vbrz as u32,
            self.buttons as u32,
            self.hats,
            self.hats_ex1,
            self.hats_ex2,
            self.hats_ex3,
            self.buttons_ex1 as u32,
            self.buttons_ex2 as u32,
            self.buttons_ex3 as u32,
        ];
        for (i, w) in words.iter().enumerate() {
            let at = 4 + i * 4;
            b[at..at + 4].copy_from_slice(&w.to_le_bytes());
        }
        b
    }
}

/// Range check shared by the report record and the driver binding.
/// `device` is only used to label the error.
pub(crate) fn check_pov_value(kind: PovKind, value: i32, device: Option<DeviceId>) -> Result<()> {
    let max = match kind {
        PovKind::Discrete => DISC_POV_MAX,
        PovKind::Continuous => CONT_POV_MAX,
    };
    if value == POV_NEUTRAL || (0..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidPovValue {
            device,
            kind,
            value,
        })
    }
}

pub(crate) fn check_pov_id(pov: u32, device: Option<DeviceId>) -> Result<u8> {
    if (1..=MAX_POVS).contains(&pov) {
        Ok(pov as u8)
    } else {
        Err(Error::InvalidPovId { device, pov })
    }
}

#[inline]
fn encode_pov(value: i32) -> u32 {
    if value == POV_NEUTRAL {
        POV_NEUTRAL_RAW
    } else {
        value as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(n: u32) -> DeviceId {
        DeviceId::new(n).unwrap()
    }

    #[test]
    fn fresh_record_defaults() {
        let r = JoystickPosition::new(dev(3));
        assert_eq!(r.device, 3);
        for pov in 1..=4 {
            assert_eq!(r.pov(pov).unwrap(), POV_NEUTRAL_RAW);
        }
        for usage in HidUsage::ALL.iter().filter(|u| **u != HidUsage::Pov) {
            assert_eq!(r.axis(*usage), Some(0));
        }
        assert_eq!(
            (r.throttle, r.rudder, r.aileron, r.axis_vx, r.axis_vbrz),
            (0, 0, 0, 0, 0)
        );
        assert_eq!(
            (r.buttons, r.buttons_ex1, r.buttons_ex2, r.buttons_ex3),
            (0, 0, 0, 0)
        );
    }

    #[test]
    fn wire_image_offsets() {
        let mut r = JoystickPosition::new(dev(7));
        r.set_axis(HidUsage::X, 0x4000).unwrap();
        r.set_button(1, true).unwrap();
        r.set_button(128, true).unwrap();
        r.set_continuous_pov(2, 9000).unwrap();

        let b = r.to_bytes();
        assert_eq!(b.len(), REPORT_SIZE);
        assert_eq!(b[0], 7);
        assert_eq!(&b[1..4], &[0, 0, 0]);
        assert_eq!(&b[16..20], &0x4000i32.to_le_bytes());
        assert_eq!(&b[76..80], &1i32.to_le_bytes());
        assert_eq!(&b[80..84], &[0xFF; 4]);
        assert_eq!(&b[84..88], &9000u32.to_le_bytes());
        assert_eq!(&b[104..108], &i32::MIN.to_le_bytes());
    }

    #[test]
    fn button_bits_land_in_the_right_mask() {
        let mut r = JoystickPosition::new(dev(1));
        r.set_button(32, true).unwrap();
        r.set_button(33, true).unwrap();
        r.set_button(66, true).unwrap();
        assert_eq!(r.buttons, i32::MIN);
        assert_eq!(r.buttons_ex1, 1);
        assert_eq!(r.buttons_ex2, 2);
        assert!(r.button(66).unwrap());

        r.set_button(66, false).unwrap();
        assert_eq!(r.buttons_ex2, 0);
        assert!(!r.button(66).unwrap());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let mut r = JoystickPosition::new(dev(1));
        assert!(matches!(
            r.set_button(0, true),
            Err(Error::InvalidButton {
                device: None,
                button: 0
            })
        ));
        assert!(matches!(
            r.set_axis(HidUsage::Y, AXIS_MAX + 1),
            Err(Error::AxisValueOutOfRange { .. })
        ));
        assert!(matches!(
            r.set_axis(HidUsage::Pov, AXIS_MID),
            Err(Error::UnmappedAxis { axis: HID_USAGE_POV })
        ));
        assert!(matches!(
            r.set_discrete_pov(1, 4),
            Err(Error::InvalidPovValue {
                device: None,
                kind: PovKind::Discrete,
                value: 4
            })
        ));
        assert!(matches!(
            r.set_continuous_pov(5, 0),
            Err(Error::InvalidPovId {
                device: None,
                pov: 5
            })
        ));
        assert_eq!(r.set_button(200, true).unwrap_err().device(), None);
        assert_eq!(r, JoystickPosition::new(dev(1)));
    }

    #[test]
    fn neutral_pov_restores_sentinel() {
        let mut r = JoystickPosition::new(dev(1));
        r.set_discrete_pov(4, 2).unwrap();
        assert_eq!(r.hats_ex3, 2);
        r.set_discrete_pov(4, POV_NEUTRAL).unwrap();
        assert_eq!(r.hats_ex3, POV_NEUTRAL_RAW);
    }

    #[test]
    fn serializes_with_serde() {
        let mut r = JoystickPosition::new(dev(2));
        r.set_axis(HidUsage::Wheel, 123).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let back: JoystickPosition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
