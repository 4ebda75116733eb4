//! Fuzz target: `dtoverlay -l` output parser
//!
//! Never panics; every returned name is trimmed and non-empty.
//!
//! cargo fuzz run fuzz_overlay_list

#![no_main]

use libfuzzer_sys::fuzz_target;
use revpi_provisioning::hat::parse_overlay_list;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    for name in parse_overlay_list(&text) {
        assert!(!name.is_empty());
        assert_eq!(name.trim(), name);
    }
});
