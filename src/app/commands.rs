//! Inbound commands to the application service.
//!
//! One variant per CLI subcommand. The CLI parses arguments into these and
//! the [`AppService`](super::service::AppService) carries them out.

use std::path::PathBuf;

/// Commands the outside world can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Write the HAT EEPROM image and program MAC addresses starting at
    /// `first_mac`.
    Provision {
        product: String,
        first_mac: String,
        image: PathBuf,
    },

    /// Overwrite the whole HAT EEPROM with `0xff`.
    ClearHat { product: String },

    /// Copy the HAT EEPROM contents into `output`.
    DumpHat { product: String, output: PathBuf },

    /// Load and schema-check a configuration file by path.
    ValidateConfig { path: PathBuf },
}

/// What a successfully completed [`AppCommand`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppOutcome {
    /// Addresses handed out, one per configured interface, in order.
    Provisioned(Vec<crate::mac::MacAddress>),
    /// `true` if the product has a HAT EEPROM and it was cleared.
    Cleared(bool),
    /// `true` if the product has a HAT EEPROM and it was dumped.
    Dumped(bool),
    /// Path of the configuration file that passed validation.
    Validated(PathBuf),
}
