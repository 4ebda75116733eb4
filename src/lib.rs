//! End-of-line provisioning for Revolution Pi devices.
//!
//! Given a product number, a first MAC address and a HAT EEPROM image,
//! this crate loads the product's device configuration, writes and
//! verifies the HAT EEPROM and burns sequential MAC addresses into the
//! network interface EEPROMs.
//!
//! ```text
//!   main.rs ──▶ AppService ──▶ RevPi ─┬─▶ HatEeprom        (GpioPort, dtoverlay)
//!                                     └─▶ NetworkInterface (vendor *-set-mac tools)
//! ```
//!
//! Hardware access goes through the port traits in [`app::ports`], so
//! everything except the adapters runs on a development host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod device;
pub mod error;
pub mod hat;
pub mod mac;
pub mod network;
pub mod product;
pub mod sysfs;

pub use device::RevPi;
pub use error::{Error, Result};
pub use hat::{EepromImage, HatEeprom};
pub use mac::MacAddress;
pub use network::{InterfaceKind, NetworkInterface};
pub use product::{ProductIdentity, extract_product};
