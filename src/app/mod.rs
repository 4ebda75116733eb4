//! Application core: provisioning orchestration, no direct I/O.
//!
//! The service turns a CLI command into the provisioning sequence: load
//! the device configuration, build the device, run the HAT EEPROM
//! operation, assign MAC addresses. All interaction with the OS happens
//! through **port traits** defined in [`ports`], keeping this layer
//! testable without real hardware.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
