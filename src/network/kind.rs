//! Network interface types and the type-string registry.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// How a network chip is attached to the SoC. Decides where its kernel
/// net device shows up in sysfs and how its MAC EEPROM is programmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bus {
    Usb,
    Pci,
    Spi,
    /// Part of the SoC itself; no MAC EEPROM.
    Board,
}

impl Bus {
    /// Directory name below `/sys/bus/`.
    pub fn sysfs_name(self) -> &'static str {
        match self {
            Self::Usb => "usb",
            Self::Pci => "pci",
            Self::Spi => "spi",
            Self::Board => "platform",
        }
    }
}

/// Every supported network chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceKind {
    /// Microchip LAN95xx USB Ethernet.
    Lan95xx,
    /// Microchip LAN78xx USB Ethernet.
    Lan78xx,
    /// Microchip LAN87xx PCIe Ethernet.
    Lan87xx,
    /// Microchip LAN743x PCIe Ethernet.
    Lan743x,
    /// Microchip KSZ8851 SPI Ethernet.
    Ksz8851,
    /// BCM2711 GENET (Compute Module 4).
    Bcm2711,
    /// RP1 MACB (Raspberry Pi 5).
    Rp1,
}

/// Type string → kind. Config files and the CLI both resolve through this.
pub const INTERFACE_TYPES: [(&str, InterfaceKind); 7] = [
    ("lan95xx", InterfaceKind::Lan95xx),
    ("lan78xx", InterfaceKind::Lan78xx),
    ("lan87xx", InterfaceKind::Lan87xx),
    ("lan743x", InterfaceKind::Lan743x),
    ("ksz8851", InterfaceKind::Ksz8851),
    ("bcm2711", InterfaceKind::Bcm2711),
    ("rp1", InterfaceKind::Rp1),
];

/// Resolve a type string (case-insensitive).
pub fn find_interface_kind(interface_type: &str) -> Result<InterfaceKind> {
    let wanted = interface_type.to_ascii_lowercase();

    INTERFACE_TYPES
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, kind)| *kind)
        .ok_or(Error::InvalidInterfaceType(wanted))
}

impl InterfaceKind {
    /// Registry key of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lan95xx => "lan95xx",
            Self::Lan78xx => "lan78xx",
            Self::Lan87xx => "lan87xx",
            Self::Lan743x => "lan743x",
            Self::Ksz8851 => "ksz8851",
            Self::Bcm2711 => "bcm2711",
            Self::Rp1 => "rp1",
        }
    }

    pub fn bus(self) -> Bus {
        match self {
            Self::Lan95xx | Self::Lan78xx => Bus::Usb,
            Self::Lan87xx | Self::Lan743x => Bus::Pci,
            Self::Ksz8851 => Bus::Spi,
            Self::Bcm2711 | Self::Rp1 => Bus::Board,
        }
    }

    /// Vendor helper that burns a MAC address into the chip's EEPROM.
    /// Called as `<tool> <interface name> <mac>`.
    pub fn eeprom_tool(self) -> Option<&'static str> {
        match self {
            Self::Lan95xx => Some("/usr/sbin/lan95xx-set-mac"),
            Self::Lan78xx => Some("/usr/sbin/lan78xx-set-mac"),
            Self::Lan87xx => Some("/usr/sbin/lan87xx-set-mac"),
            Self::Lan743x => Some("/usr/sbin/lan743x-set-mac"),
            Self::Ksz8851 | Self::Bcm2711 | Self::Rp1 => None,
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InterfaceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        find_interface_kind(s)
    }
}

impl TryFrom<String> for InterfaceKind {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        find_interface_kind(&s)
    }
}
