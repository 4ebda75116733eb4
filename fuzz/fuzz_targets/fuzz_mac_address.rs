//! Fuzz target: MAC address parsing and arithmetic
//!
//! Any string either fails to parse or yields an address whose renderings
//! parse back to it. Increments never panic and never wrap.
//!
//! cargo fuzz run fuzz_mac_address

#![no_main]

use libfuzzer_sys::fuzz_target;
use revpi_provisioning::MacAddress;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(mac) = MacAddress::parse(text) else {
        return;
    };

    assert_eq!(MacAddress::parse(&mac.to_string()).ok(), Some(mac));
    assert_eq!(MacAddress::parse(&mac.format_colon()).ok(), Some(mac));
    assert_eq!(MacAddress::parse(&mac.format_dash()).ok(), Some(mac));

    let n = data.len() as u64;
    if let Ok(next) = mac.increment(n) {
        assert!(next >= mac);
        assert_eq!(next.decrement(n).ok(), Some(mac));
    }
});
