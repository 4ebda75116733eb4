//! Sequential MAC assignment across a device's network interfaces.

use revpi_provisioning::error::{Error, MacAddressError, NetworkEepromError};
use revpi_provisioning::network::{InterfaceKind, NetworkInterface};
use revpi_provisioning::product::extract_product;
use revpi_provisioning::sysfs::Sysfs;
use revpi_provisioning::{MacAddress, RevPi};

use crate::mock_hw::{Fixture, MockGpio, MockRunner};

fn device(fx: &Fixture, interfaces: &[(InterfaceKind, &str, bool)]) -> RevPi<MockGpio> {
    let mut revpi = RevPi::new(extract_product("PR100359R01").unwrap())
        .with_sysfs(Sysfs::new(fx.sysfs_root()));
    for (kind, path, eeprom) in interfaces {
        revpi.add_network_interface(NetworkInterface::new(*kind, *path, *eeprom));
    }
    revpi
}

fn mac(s: &str) -> MacAddress {
    MacAddress::parse(s).unwrap()
}

#[test]
fn interfaces_without_eeprom_still_consume_an_address() {
    let fx = Fixture::new();
    fx.add_net_device("usb", "1-1.1:1.0", "eth1");
    fx.add_net_device("usb", "1-1.2:1.0", "eth2");
    let revpi = device(
        &fx,
        &[
            (InterfaceKind::Lan95xx, "1-1.1:1.0", true),
            (InterfaceKind::Bcm2711, "", false),
            (InterfaceKind::Lan78xx, "1-1.2:1.0", true),
        ],
    );
    let mut runner = MockRunner::new();

    let assigned = revpi
        .assign_sequential_mac_addresses(mac("aa:bb:cc:dd:ee:ff"), &mut runner)
        .unwrap();

    assert_eq!(
        assigned,
        vec![mac("aabbccddeeff"), mac("aabbccddef00"), mac("aabbccddef01")]
    );
    assert_eq!(
        runner.helper_calls(),
        vec![
            (
                "/usr/sbin/lan95xx-set-mac".to_owned(),
                vec!["eth1".to_owned(), "aabbccddeeff".to_owned()]
            ),
            (
                "/usr/sbin/lan78xx-set-mac".to_owned(),
                vec!["eth2".to_owned(), "aabbccddef01".to_owned()]
            ),
        ]
    );
}

#[test]
fn no_interfaces_assigns_nothing() {
    let fx = Fixture::new();
    let revpi = device(&fx, &[]);
    let mut runner = MockRunner::new();

    let assigned = revpi
        .assign_sequential_mac_addresses(mac("c83ea7000000"), &mut runner)
        .unwrap();
    assert!(assigned.is_empty());
    assert!(runner.calls.is_empty());
}

#[test]
fn overflow_is_detected_before_any_helper_runs() {
    let fx = Fixture::new();
    fx.add_net_device("usb", "1-1.1:1.0", "eth0");
    let revpi = device(
        &fx,
        &[
            (InterfaceKind::Lan95xx, "1-1.1:1.0", true),
            (InterfaceKind::Lan95xx, "1-1.1:1.0", true),
        ],
    );
    let mut runner = MockRunner::new();

    let err = revpi
        .assign_sequential_mac_addresses(mac("ff:ff:ff:ff:ff:ff"), &mut runner)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::MacAddress(MacAddressError::OutOfRange { op: '+', offset: 1, .. })
    ));
    assert_eq!(err.exit_code(), 4);
    assert!(runner.calls.is_empty());
}

#[test]
fn failure_part_way_keeps_earlier_ports_programmed() {
    let fx = Fixture::new();
    fx.add_net_device("usb", "1-1.1:1.0", "eth1");
    fx.add_net_device("pci", "0000:01:00.0", "eth2");
    let revpi = device(
        &fx,
        &[
            (InterfaceKind::Lan95xx, "1-1.1:1.0", true),
            (InterfaceKind::Lan743x, "0000:01:00.0", true),
        ],
    );
    let mut runner = MockRunner::new();
    runner.failing.push("/usr/sbin/lan743x-set-mac".to_owned());

    let err = revpi
        .assign_sequential_mac_addresses(mac("c83ea7010203"), &mut runner)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::NetworkEeprom(NetworkEepromError::HelperFailed { ref interface, .. })
            if interface == "eth2"
    ));
    assert_eq!(runner.helper_calls().len(), 2);
}

#[test]
fn missing_helper_binary() {
    let fx = Fixture::new();
    fx.add_net_device("pci", "0000:01:00.0", "eth0");
    let revpi = device(&fx, &[(InterfaceKind::Lan87xx, "0000:01:00.0", true)]);
    let mut runner = MockRunner::new();
    runner.missing.push("/usr/sbin/lan87xx-set-mac".to_owned());

    let err = revpi
        .assign_sequential_mac_addresses(mac("c83ea7010203"), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::NetworkEeprom(NetworkEepromError::Spawn { .. })));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn unknown_bus_path_is_interface_not_found() {
    let fx = Fixture::new();
    let revpi = device(&fx, &[(InterfaceKind::Lan78xx, "1-1.3:1.0", true)]);
    let mut runner = MockRunner::new();

    let err = revpi
        .assign_sequential_mac_addresses(mac("c83ea7010203"), &mut runner)
        .unwrap_err();

    assert!(matches!(err, Error::InterfaceNotFound(ref p) if p == "1-1.3:1.0"));
    assert_eq!(err.exit_code(), 2);
}
