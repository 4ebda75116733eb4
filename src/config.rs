//! Device configuration files.
//!
//! One YAML file per product number (`PR100359R01.yaml`) describes the
//! hardware that needs provisioning:
//!
//! ```yaml
//! hat_eeprom:
//!   wp_gpio: 28
//!   wp_gpiochip: gpiochip0
//!   overlay: revpi-hat-eeprom
//! network_interfaces:
//!   - type: lan95xx
//!     path: 1-1.1:1.0
//!     eeprom: true
//!   - type: bcm2711
//!     path: ""
//!     eeprom: false
//! ```
//!
//! The schema is strict: unknown keys, unknown interface types and unknown
//! overlays are rejected while parsing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::{debug, warn};
use regex::Regex;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::hat::{DEFAULT_GPIO_CHIP, Overlay};
use crate::network::InterfaceKind;
use crate::product::ProductIdentity;

/// Where packaged device configurations are installed.
pub const DEFAULT_DEVICES_DIR: &str = "/usr/share/revpi-provisioning/devices";

static CONFIG_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PR[0-9]{6}R[0-9]{2}\.yaml$")
        .unwrap_or_else(|e| unreachable!("static config file name pattern: {e}"))
});

/// Parsed device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    #[serde(default)]
    pub hat_eeprom: Option<HatEepromConfig>,
    /// Order matters: it is the MAC assignment order.
    pub network_interfaces: Vec<InterfaceConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HatEepromConfig {
    /// Write-protect GPIO line number.
    pub wp_gpio: u32,
    #[serde(default = "default_gpio_chip")]
    pub wp_gpiochip: String,
    #[serde(default)]
    pub overlay: Overlay,
    /// EEPROM node to use instead of scanning `/sys/bus/i2c/devices`. May
    /// contain `?` and `*` wildcards, e.g. `/sys/bus/i2c/devices/?-0050/eeprom`.
    #[serde(default)]
    pub eeprom_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InterfaceConfig {
    #[serde(rename = "type")]
    pub kind: InterfaceKind,
    /// Bus-specific device path (empty for onboard interfaces).
    pub path: String,
    /// Whether a MAC address is burnt into an EEPROM on this port.
    pub eeprom: bool,
}

fn default_gpio_chip() -> String {
    DEFAULT_GPIO_CHIP.to_owned()
}

impl<'de> Deserialize<'de> for InterfaceKind {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> core::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::try_from(name).map_err(serde::de::Error::custom)
    }
}

impl DeviceConfig {
    /// Parse and validate YAML text. Malformed YAML is a
    /// [`ConfigError::Parse`], well-formed YAML that does not fit the
    /// schema a [`ConfigError::Schema`].
    pub fn from_yaml(text: &str) -> Result<Self> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        serde_yaml::from_value(document).map_err(|e| ConfigError::Schema(e.to_string()).into())
    }
}

/// Load a configuration file by path.
pub fn load_config_file(path: &Path) -> Result<DeviceConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()).into());
    }

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config = DeviceConfig::from_yaml(&text)?;
    debug!(
        "{}: {} network interface(s), HAT EEPROM: {}",
        path.display(),
        config.network_interfaces.len(),
        if config.hat_eeprom.is_some() { "yes" } else { "no" }
    );
    Ok(config)
}

/// Path of the configuration for `product` below `devices_dir`.
pub fn config_path(devices_dir: &Path, product: &ProductIdentity) -> PathBuf {
    devices_dir.join(format!("{}.yaml", product.number()))
}

/// Load the configuration for `product` from `devices_dir`.
pub fn load_config(devices_dir: &Path, product: &ProductIdentity) -> Result<DeviceConfig> {
    load_config_file(&config_path(devices_dir, product))
}

/// Whether a file name follows the `PRxxxxxxRxx.yaml` convention used for
/// packaged configurations.
pub fn is_config_file_name(name: &str) -> bool {
    CONFIG_FILE_NAME.is_match(name)
}

/// [`load_config_file`] plus a warning when the file name would not be
/// found by product number lookup.
pub fn validate_config_file(path: &Path) -> Result<DeviceConfig> {
    let config = load_config_file(path)?;

    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if !is_config_file_name(name) {
        warn!("'{name}' does not match PRxxxxxxRxx.yaml and will not be found by product number");
    }

    Ok(config)
}
