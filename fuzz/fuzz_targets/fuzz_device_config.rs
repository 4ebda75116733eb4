//! Fuzz target: device configuration parser
//!
//! Arbitrary YAML must be rejected with an error, never a panic. Accepted
//! configurations only name registered interface types.
//!
//! cargo fuzz run fuzz_device_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use revpi_provisioning::config::DeviceConfig;
use revpi_provisioning::network::find_interface_kind;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = DeviceConfig::from_yaml(text) else {
        return;
    };

    for interface in &config.network_interfaces {
        assert_eq!(find_interface_kind(interface.kind.name()).ok(), Some(interface.kind));
    }
});
