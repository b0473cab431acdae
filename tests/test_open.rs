mod common;

use common::{SocketPairControl, Step};
use utun_rs::{Context, DeviceBuilder, DeviceState, Error, MAX_KCTL_NAME};

#[test]
fn requested_mtu_is_applied() {
    common::init_log();
    for mtu in [576, 1280, 1400, 1500, 9000] {
        let control = SocketPairControl::default();
        let context = Context::new(&control);
        let device = context.open(0, mtu).unwrap();
        assert_eq!(device.mtu(), mtu);
        assert_eq!(*control.mtu_set.lock().unwrap(), Some(mtu));
    }
}

#[test]
fn zero_mtu_reports_kernel_default() {
    let control = SocketPairControl::with_default_mtu(1380);
    let context = Context::new(&control);
    let device = context.open(0, 0).unwrap();
    assert_eq!(device.mtu(), 1380);
    assert!(device.mtu() > 0);
    assert_eq!(*control.mtu_set.lock().unwrap(), None);
}

#[test]
fn non_positive_kernel_mtu_is_a_config_error() {
    let control = SocketPairControl::with_default_mtu(0);
    let context = Context::new(&control);
    let err = context.open(0, 0).unwrap_err();
    assert!(matches!(err, Error::DeviceConfig(_)));
    assert_eq!(control.allocated(), 1);
    assert_eq!(control.released(), 1);
}

#[test]
fn opened_device_is_ready() {
    let control = SocketPairControl::default();
    let context = Context::new(&control);
    let device = context.open(0, 1500).unwrap();
    assert_eq!(device.address().to_string(), "utun7");
    assert_eq!(device.name(), "utun7");
    assert_eq!(device.state(), DeviceState::Open);
    assert!(device.handle().unwrap() >= 0);
    assert!(device.is_nonblocking().unwrap());
    assert!(device.ignore_packet_info());
    assert_eq!(*control.connected_unit.lock().unwrap(), Some(0));
    assert_eq!(control.allocated(), 1);
    assert_eq!(control.released(), 0);
}

#[test]
fn exhaustion_allocates_nothing() {
    let control = SocketPairControl::failing_at(Step::Socket);
    let context = Context::new(&control);
    let err = context.open(0, 1500).unwrap_err();
    assert!(matches!(err, Error::ResourceExhausted(_)));
    assert_eq!(err.raw_os_error(), Some(libc::EMFILE));
    assert_eq!(control.allocated(), 0);
}

#[test]
fn every_failure_rolls_back() {
    let cases = [
        (Step::CtlInfo, "io"),
        (Step::Connect, "io"),
        (Step::IfName, "io"),
        (Step::SetMtu, "config"),
    ];
    for (step, kind) in cases {
        let control = SocketPairControl::failing_at(step);
        let context = Context::new(&control);
        let err = context.open(0, 1500).unwrap_err();
        match kind {
            "io" => assert!(matches!(err, Error::Io(_)), "{step:?}: {err:?}"),
            _ => assert!(matches!(err, Error::DeviceConfig(_)), "{step:?}: {err:?}"),
        }
        assert_eq!(control.allocated(), 1, "{step:?}");
        assert_eq!(control.released(), 1, "{step:?} leaked its socket");
    }

    let control = SocketPairControl::failing_at(Step::Mtu);
    let context = Context::new(&control);
    assert!(matches!(context.open(0, 0), Err(Error::DeviceConfig(_))));
    assert_eq!(control.released(), 1);
}

#[test]
fn control_name_too_long() {
    let control = SocketPairControl::with_control_name("c".repeat(MAX_KCTL_NAME));
    let context = Context::new(&control);
    assert!(matches!(context.open(0, 1500), Err(Error::NameTooLong)));
    assert_eq!(control.allocated(), 1);
    assert_eq!(control.released(), 1);
}

#[test]
fn builder_maps_name_to_unit() {
    let control = SocketPairControl::default();
    let context = Context::new(&control);
    let device = DeviceBuilder::new()
        .name("utun3")
        .mtu(1400)
        .packet_information(true)
        .build_with(&context)
        .unwrap();
    assert_eq!(*control.connected_unit.lock().unwrap(), Some(4));
    assert_eq!(device.mtu(), 1400);
    assert!(!device.ignore_packet_info());
}

#[test]
fn builder_rejects_bad_name_before_allocating() {
    let control = SocketPairControl::default();
    let context = Context::new(&control);
    let err = DeviceBuilder::new()
        .name("eth0")
        .build_with(&context)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidName));
    assert_eq!(control.allocated(), 0);
}

#[test]
fn dropping_an_open_device_releases_it() {
    let control = SocketPairControl::default();
    let context = Context::new(&control);
    let device = context.open(0, 1500).unwrap();
    assert_eq!(control.released(), 0);
    drop(device);
    assert_eq!(control.released(), 1);
}
