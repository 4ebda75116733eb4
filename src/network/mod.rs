//! Network interfaces and MAC address programming.
//!
//! A [`NetworkInterface`] is one physical Ethernet port from the device
//! configuration. USB and PCIe chips keep their MAC address in a small
//! EEPROM that a vendor helper program writes; the SoC-internal ports
//! (BCM2711, RP1) take their address from elsewhere and ignore the request.

mod kind;

use log::{debug, info};

use crate::app::ports::CommandRunner;
use crate::error::{Error, NetworkEepromError, Result};
use crate::mac::MacAddress;
use crate::sysfs::Sysfs;

pub use kind::{Bus, INTERFACE_TYPES, InterfaceKind, find_interface_kind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    kind: InterfaceKind,
    /// Bus location below `/sys/bus/<bus>/devices/`, e.g. `1-1.1:1.0`.
    path: String,
    has_eeprom: bool,
}

impl NetworkInterface {
    pub fn new(kind: InterfaceKind, path: impl Into<String>, has_eeprom: bool) -> Self {
        Self {
            kind,
            path: path.into(),
            has_eeprom,
        }
    }

    pub fn kind(&self) -> InterfaceKind {
        self.kind
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn has_eeprom(&self) -> bool {
        self.has_eeprom
    }

    /// Give this port `mac`. Without an EEPROM there is nothing to program
    /// and this is a no-op.
    pub fn assign_mac(
        &self,
        mac: MacAddress,
        sysfs: &Sysfs,
        runner: &mut impl CommandRunner,
    ) -> Result<()> {
        if !self.has_eeprom {
            debug!("{} '{}': no EEPROM, skipping {}", self.kind, self.path, mac);
            return Ok(());
        }

        self.program_eeprom(mac, sysfs, runner)
    }

    fn program_eeprom(
        &self,
        mac: MacAddress,
        sysfs: &Sysfs,
        runner: &mut impl CommandRunner,
    ) -> Result<()> {
        let bus = self.kind.bus();

        match (bus, self.kind.eeprom_tool()) {
            (Bus::Usb | Bus::Pci, Some(tool)) => {
                let interface = self.interface_name(sysfs)?;
                self.run_helper(tool, &interface, mac, runner)
            }
            // SoC MACs are fused / derived by firmware.
            (Bus::Board, _) => {
                debug!("{}: onboard interface, MAC not programmable", self.kind);
                Ok(())
            }
            _ => Err(NetworkEepromError::Unsupported {
                kind: self.kind.name(),
                path: self.path.clone(),
            }
            .into()),
        }
    }

    /// Kernel name of this port (`eth0`, ...).
    pub fn interface_name(&self, sysfs: &Sysfs) -> Result<String> {
        sysfs
            .net_device_name(self.kind.bus().sysfs_name(), &self.path)
            .ok_or_else(|| Error::InterfaceNotFound(self.path.clone()))
    }

    fn run_helper(
        &self,
        tool: &str,
        interface: &str,
        mac: MacAddress,
        runner: &mut impl CommandRunner,
    ) -> Result<()> {
        let mac = mac.to_string();
        info!("{interface}: writing MAC {mac} with {tool}");

        let output = runner
            .run(tool, &[interface, mac.as_str()])
            .map_err(|source| NetworkEepromError::Spawn {
                interface: interface.to_owned(),
                tool: tool.to_owned(),
                source,
            })?;

        if !output.success() {
            return Err(NetworkEepromError::HelperFailed {
                interface: interface.to_owned(),
                tool: tool.to_owned(),
                status: output.status(),
                output: output.combined(),
            }
            .into());
        }

        debug!("{tool}: {}", output.combined());
        Ok(())
    }
}
