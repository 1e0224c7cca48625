//! Device session lifecycle against the recording mock.

use std::sync::Arc;
use std::time::Duration;
use vjoy_feeder::backends::mock::{DriverCall, MockDriver};
use vjoy_feeder::constants::POV_NEUTRAL_RAW;
use vjoy_feeder::{
    Binding, DeviceId, DeviceStatus, Error, ErrorCategory, FeederConfig, HidUsage,
    JoystickPosition, SessionOptions, SessionState, VJoyDevice,
};

fn setup() -> (Arc<MockDriver>, Binding) {
    let driver = Arc::new(MockDriver::new());
    let binding = Binding::new(driver.clone());
    (driver, binding)
}

fn fast() -> SessionOptions {
    SessionOptions {
        settle_delay: Duration::from_millis(1),
        ..SessionOptions::default()
    }
}

fn relinquish_calls(driver: &MockDriver) -> usize {
    driver.count(|c| matches!(c, DriverCall::Relinquish { .. }))
}

#[test]
fn invalid_device_id_never_reaches_the_driver() {
    let (driver, binding) = setup();
    for raw in [0, 17, 255, u32::MAX] {
        let err = VJoyDevice::new(binding.clone(), raw).unwrap_err();
        assert!(matches!(err, Error::InvalidDeviceId { value } if value == raw));
        assert!(err.is_validation());
    }
    assert!(driver.calls().is_empty());
}

#[test]
fn axis_update_relinquish_scenario() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 3).unwrap();
    assert_eq!(dev.state(), SessionState::Acquired);
    assert_eq!(dev.status(), DeviceStatus::Own);

    dev.set_axis(HidUsage::X, 0x4000).unwrap();
    assert!(dev.update().unwrap());

    let sent = driver.last_report().unwrap();
    let mut expected = JoystickPosition::new(dev.id());
    expected.axis_x = 0x4000;
    assert_eq!(sent, expected);
    assert_eq!(sent.device, 3);
    assert_eq!(sent.hats, POV_NEUTRAL_RAW);

    dev.relinquish().unwrap();
    assert_eq!(dev.state(), SessionState::Relinquished);
    assert_eq!(relinquish_calls(&driver), 1);

    drop(dev);
    assert_eq!(relinquish_calls(&driver), 1);
}

#[test]
fn owned_by_other_is_reported_specifically() {
    let (driver, binding) = setup();
    driver.set_status(5, DeviceStatus::Busy);
    let err = VJoyDevice::new(binding, 5).unwrap_err();
    assert!(matches!(err, Error::OwnedByOther { .. }));
    assert_eq!(err.device().map(|d| d.get()), Some(5));
}

#[test]
fn construction_stops_at_first_failure() {
    let (driver, binding) = setup();
    driver.set_enabled(false);
    assert!(matches!(
        VJoyDevice::new(binding.clone(), 1),
        Err(Error::DriverNotEnabled)
    ));
    assert_eq!(driver.count(|c| matches!(c, DriverCall::Acquire { .. })), 0);

    driver.set_enabled(true);
    driver.set_versions(1, 2);
    // Version is only checked when asked for.
    let dev = VJoyDevice::new(binding.clone(), 1).unwrap();
    drop(dev);

    let opts = SessionOptions {
        check_version: true,
        ..fast()
    };
    assert!(matches!(
        VJoyDevice::open(binding, 2, opts),
        Err(Error::DriverVersionMismatch { .. })
    ));
    assert_eq!(
        driver.count(|c| matches!(c, DriverCall::Acquire { device: 2 })),
        0
    );
}

#[test]
fn relinquish_is_idempotent() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 1).unwrap();
    dev.relinquish().unwrap();
    driver.clear_calls();
    dev.relinquish().unwrap();
    assert!(driver.calls().is_empty());
}

#[test]
fn operations_after_relinquish_fail_fast() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 1).unwrap();
    dev.relinquish().unwrap();
    driver.clear_calls();

    let results = [
        dev.set_button(1, true).map(|_| ()),
        dev.set_axis(HidUsage::Y, 0).map(|_| ()),
        dev.set_discrete_pov(1, 0).map(|_| ()),
        dev.set_continuous_pov(1, 0).map(|_| ()),
        dev.reset().map(|_| ()),
        dev.reset_buttons().map(|_| ()),
        dev.reset_povs().map(|_| ()),
        dev.reset_data(),
        dev.update().map(|_| ()),
        dev.reacquire(),
    ];
    for r in results {
        let err = r.unwrap_err();
        assert!(matches!(
            err,
            Error::NotAcquired {
                state: SessionState::Relinquished,
                ..
            }
        ));
        assert_eq!(err.category(), ErrorCategory::Usage);
    }
    assert!(driver.calls().is_empty());
}

#[test]
fn button_and_axis_ranges_are_checked_locally() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 1).unwrap();
    driver.clear_calls();

    assert!(matches!(
        dev.set_button(0, true),
        Err(Error::InvalidButton { button: 0, .. })
    ));
    let err = dev.set_button(129, true).unwrap_err();
    assert!(matches!(err, Error::InvalidButton { button: 129, .. }));
    assert_eq!(err.device(), Some(dev.id()));
    assert!(matches!(
        dev.set_axis(HidUsage::Z, -1),
        Err(Error::AxisValueOutOfRange { value: -1, .. })
    ));
    let err = dev.set_axis(HidUsage::Z, 0x8001).unwrap_err();
    assert!(matches!(err, Error::AxisValueOutOfRange { value: 0x8001, .. }));
    assert_eq!(err.device(), Some(dev.id()));
    let err = dev.set_continuous_pov(9, 0).unwrap_err();
    assert!(matches!(err, Error::InvalidPovId { pov: 9, .. }));
    assert_eq!(err.device(), Some(dev.id()));
    assert!(driver.calls().is_empty());

    // Value is fine, usage is not: the binding catches it.
    assert!(matches!(
        dev.set_axis(0x60u32, 0x100),
        Err(Error::InvalidAxis { axis: 0x60, .. })
    ));
    assert!(driver.calls().is_empty());

    dev.set_button(128, true).unwrap();
    assert_eq!(
        driver.calls(),
        vec![DriverCall::SetButton {
            device: 1,
            button: 128,
            pressed: true
        }]
    );
}

#[test]
fn pov_usage_axis_write_skips_the_staged_report() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 14).unwrap();
    dev.set_axis(HidUsage::Pov, 0x100).unwrap();
    assert_eq!(*dev.data(), JoystickPosition::new(dev.id()));
    assert_eq!(
        driver.count(|c| matches!(c, DriverCall::SetAxis { usage: 0x39, .. })),
        1
    );

    dev.set_axis(HidUsage::Rz, 0x100).unwrap();
    assert_eq!(dev.data().axis_z_rot, 0x100);
}

#[test]
fn resets_delegate_and_reset_data_stays_local() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding, 9).unwrap();
    dev.data_mut().set_button(7, true).unwrap();
    driver.clear_calls();

    assert!(dev.reset().unwrap());
    assert!(dev.reset_buttons().unwrap());
    assert!(dev.reset_povs().unwrap());
    dev.reset_data().unwrap();
    assert_eq!(*dev.data(), JoystickPosition::new(dev.id()));
    assert_eq!(
        driver.calls(),
        vec![
            DriverCall::Reset { device: 9 },
            DriverCall::ResetButtons { device: 9 },
            DriverCall::ResetPovs { device: 9 },
        ]
    );

    driver.set_writes_ok(false);
    assert!(!dev.reset().unwrap());
}

#[test]
fn reacquire_ignores_failed_release() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::open(binding, 4, fast()).unwrap();
    driver.set_relinquish_ok(false);
    driver.set_acquire_override(Some(true));
    driver.clear_calls();

    dev.reacquire().unwrap();
    assert!(dev.is_acquired());
    assert_eq!(driver.count(|c| matches!(c, DriverCall::Reset { .. })), 1);
    assert_eq!(relinquish_calls(&driver), 1);

    let calls = driver.calls();
    let acquire_at = calls
        .iter()
        .position(|c| matches!(c, DriverCall::Acquire { .. }))
        .unwrap();
    let reset_at = calls
        .iter()
        .position(|c| matches!(c, DriverCall::Reset { .. }))
        .unwrap();
    assert!(acquire_at < reset_at);

    driver.set_relinquish_ok(true);
}

#[test]
fn reacquire_recovers_a_dropped_device() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::open(binding, 6, fast()).unwrap();
    driver.drop_ownership(6);

    dev.reacquire().unwrap();
    assert!(dev.is_acquired());
    assert_eq!(dev.status(), DeviceStatus::Own);
}

#[test]
fn failed_reacquire_marks_the_session_lost() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::open(binding, 2, fast()).unwrap();
    // Another feeder grabs the slot the moment we let go.
    driver.set_acquire_override(Some(false));
    driver.set_status(2, DeviceStatus::Busy);

    let err = dev.reacquire().unwrap_err();
    match &err {
        Error::FailedToAcquire { source, .. } => {
            assert!(matches!(**source, Error::OwnedByOther { .. }))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Recovery);
    assert_eq!(dev.state(), SessionState::Lost);
    assert!(matches!(
        dev.set_button(1, true),
        Err(Error::NotAcquired {
            state: SessionState::Lost,
            ..
        })
    ));

    // Lost sessions can try again, and do not release what they do not own.
    driver.set_acquire_override(None);
    driver.set_status(2, DeviceStatus::Free);
    driver.clear_calls();
    dev.reacquire().unwrap();
    assert!(dev.is_acquired());
    assert_eq!(relinquish_calls(&driver), 0);
}

#[test]
fn scoped_releases_on_exit() {
    let (driver, binding) = setup();
    let out = VJoyDevice::scoped(binding.clone(), 7, |dev| {
        dev.set_button(2, true).unwrap();
        dev.id().get()
    })
    .unwrap();
    assert_eq!(out, 7);
    assert_eq!(relinquish_calls(&driver), 1);
    assert_eq!(binding.query_status(DeviceId::new(7).unwrap()), DeviceStatus::Free);
}

#[test]
fn scoped_swallows_release_errors() {
    let (driver, binding) = setup();
    driver.set_relinquish_ok(false);
    let out = VJoyDevice::scoped(binding, 7, |_| 42).unwrap();
    assert_eq!(out, 42);
    // Once on scope exit, once more from drop.
    assert_eq!(relinquish_calls(&driver), 2);
}

#[test]
fn scoped_construction_failure_skips_the_closure() {
    let (driver, binding) = setup();
    driver.set_status(8, DeviceStatus::Missing);
    let mut ran = false;
    let res = VJoyDevice::scoped(binding, 8, |_| ran = true);
    assert!(matches!(res, Err(Error::DeviceMissing { .. })));
    assert!(!ran);
}

#[test]
fn refused_release_keeps_the_session() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding.clone(), 11).unwrap();
    driver.set_relinquish_ok(false);

    let err = dev.relinquish().unwrap_err();
    assert!(matches!(err, Error::RelinquishFailed { .. }));
    assert_eq!(dev.state(), SessionState::Acquired);
    assert_eq!(dev.status(), DeviceStatus::Own);
    dev.set_button(1, true).unwrap();

    driver.set_relinquish_ok(true);
    dev.relinquish().unwrap();
    assert_eq!(relinquish_calls(&driver), 2);
    assert_eq!(dev.state(), SessionState::Relinquished);
    assert_eq!(binding.query_status(dev.id()), DeviceStatus::Free);
}

#[test]
fn drop_retries_a_refused_release() {
    let (driver, binding) = setup();
    let mut dev = VJoyDevice::new(binding.clone(), 13).unwrap();
    driver.set_relinquish_ok(false);
    assert!(dev.relinquish().is_err());

    driver.set_relinquish_ok(true);
    drop(dev);
    assert_eq!(relinquish_calls(&driver), 2);
    assert_eq!(binding.query_status(DeviceId::new(13).unwrap()), DeviceStatus::Free);
}

#[test]
fn drop_is_a_safety_net() {
    let (driver, binding) = setup();
    {
        let _dev = VJoyDevice::new(binding, 10).unwrap();
    }
    assert_eq!(relinquish_calls(&driver), 1);
    assert_eq!(driver.calls().last(), Some(&DriverCall::Relinquish { device: 10 }));
}

#[test]
fn with_data_rewrites_the_device_byte() {
    let (driver, binding) = setup();
    let mut staged = JoystickPosition::new(DeviceId::new(1).unwrap());
    staged.set_button(3, true).unwrap();

    let mut dev = VJoyDevice::new(binding, 12).unwrap().with_data(staged);
    assert_eq!(dev.data().device, 12);
    assert!(dev.data().button(3).unwrap());
    dev.update().unwrap();
    assert_eq!(driver.last_report().unwrap().device, 12);
}

#[test]
fn config_feeds_session_options() {
    let cfg = FeederConfig::from_toml_str("settle_delay_ms = 3\ncheck_version = true").unwrap();
    let (driver, binding) = setup();
    let dev = VJoyDevice::open(binding, 1, cfg.session_options()).unwrap();
    assert_eq!(dev.options().settle_delay, Duration::from_millis(3));
    assert_eq!(driver.count(|c| matches!(c, DriverCall::DriverMatch)), 1);
}
