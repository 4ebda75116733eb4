//! sysfs lookups.
//!
//! Both the HAT EEPROM node and the kernel name of a network port only
//! exist once the kernel has enumerated the device, so they are looked up
//! on demand rather than configured. The root is injectable so the lookups
//! can run against a fake tree on a host.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// `<bus>-0050` with a one- or two-digit I2C bus number.
static HAT_EEPROM_DEVICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{1,2}-0050$")
        .unwrap_or_else(|e| unreachable!("static i2c device pattern: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysfs {
    root: PathBuf,
}

impl Default for Sysfs {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl Sysfs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every `bus/i2c/devices/<bus>-0050/eeprom` node that currently exists,
    /// one-digit buses first, then in name order.
    pub fn hat_eeprom_candidates(&self) -> io::Result<Vec<PathBuf>> {
        let devices = self.root.join("bus/i2c/devices");

        let mut names: Vec<String> = fs::read_dir(&devices)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| HAT_EEPROM_DEVICE.is_match(name))
            .collect();
        names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        Ok(names
            .into_iter()
            .map(|name| devices.join(name).join("eeprom"))
            .filter(|path| path.exists())
            .collect())
    }

    /// Kernel name (`eth0`, ...) of the net device below
    /// `bus/<bus>/devices/<device_path>/net/`. First entry in name order.
    pub fn net_device_name(&self, bus: &str, device_path: &str) -> Option<String> {
        let net = self
            .root
            .join("bus")
            .join(bus)
            .join("devices")
            .join(device_path)
            .join("net");

        let mut names: Vec<String> = fs::read_dir(net)
            .ok()?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names.into_iter().next()
    }
}

/// Existing paths matching `pattern`, where `?` in a component stands for
/// one character and `*` for any run of characters. Within one wildcard
/// component shorter names sort first, then name order. A pattern without
/// wildcards yields itself if it exists.
pub fn match_pattern(pattern: &Path) -> Vec<PathBuf> {
    let mut matches = vec![PathBuf::new()];

    for component in pattern.components() {
        let part = component.as_os_str();
        let wildcard = match component {
            Component::Normal(name) => name.to_str().and_then(component_regex),
            _ => None,
        };

        matches = match wildcard {
            None => matches.into_iter().map(|base| base.join(part)).collect(),
            Some(re) => matches
                .into_iter()
                .flat_map(|base| matching_children(&base, &re))
                .collect(),
        };
    }

    matches.retain(|path| path.exists());
    matches
}

fn component_regex(name: &str) -> Option<Regex> {
    if !name.contains(['?', '*']) {
        return None;
    }
    let body: String = name
        .chars()
        .map(|c| match c {
            '?' => ".".to_owned(),
            '*' => ".*".to_owned(),
            c => regex::escape(&c.to_string()),
        })
        .collect();
    Regex::new(&format!("^{body}$")).ok()
}

fn matching_children(dir: &Path, re: &Regex) -> Vec<PathBuf> {
    let listing = if dir.as_os_str().is_empty() {
        fs::read_dir(".")
    } else {
        fs::read_dir(dir)
    };
    let Ok(entries) = listing else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| re.is_match(name))
        .collect();
    names.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    names.into_iter().map(|name| dir.join(name)).collect()
}
