//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one subsystem against the mock adapters in
//! `mock_hw` and a fake sysfs tree. No hardware required.

mod hat_eeprom_tests;
mod network_tests;
