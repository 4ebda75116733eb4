//! The device being provisioned.
//!
//! A [`RevPi`] owns at most one HAT EEPROM and the ordered list of its
//! network interfaces. Interface order is configuration order and decides
//! which MAC address each port gets.

use std::path::Path;
use std::time::Duration;

use log::info;

use crate::app::ports::{CommandRunner, GpioPort};
use crate::config::DeviceConfig;
use crate::error::Result;
use crate::hat::{EepromImage, HatEeprom};
use crate::mac::MacAddress;
use crate::network::NetworkInterface;
use crate::product::ProductIdentity;
use crate::sysfs::Sysfs;

pub struct RevPi<G: GpioPort> {
    product: ProductIdentity,
    hat_eeprom: Option<HatEeprom<G>>,
    network_interfaces: Vec<NetworkInterface>,
    sysfs: Sysfs,
}

impl<G: GpioPort> RevPi<G> {
    pub fn new(product: ProductIdentity) -> Self {
        Self {
            product,
            hat_eeprom: None,
            network_interfaces: Vec::new(),
            sysfs: Sysfs::default(),
        }
    }

    /// Build a device from its configuration. `gpio` is only used if the
    /// configuration has a `hat_eeprom` section; `settle_delay` is the wait
    /// after loading the HAT EEPROM overlay.
    pub fn from_config(
        product: ProductIdentity,
        config: &DeviceConfig,
        gpio: G,
        sysfs: Sysfs,
        settle_delay: Duration,
    ) -> Self {
        let mut device = Self::new(product).with_sysfs(sysfs.clone());

        if let Some(hat) = &config.hat_eeprom {
            let mut eeprom = HatEeprom::new(hat.wp_gpio, gpio)
                .with_gpio_chip(hat.wp_gpiochip.clone())
                .with_overlay(hat.overlay)
                .with_sysfs(sysfs)
                .with_settle_delay(settle_delay);
            if let Some(path) = &hat.eeprom_path {
                eeprom = eeprom.with_eeprom_path(path);
            }
            device.set_hat_eeprom(eeprom);
        }

        for interface in &config.network_interfaces {
            device.add_network_interface(NetworkInterface::new(
                interface.kind,
                interface.path.clone(),
                interface.eeprom,
            ));
        }

        device
    }

    pub fn with_sysfs(mut self, sysfs: Sysfs) -> Self {
        self.sysfs = sysfs;
        self
    }

    pub fn product(&self) -> &ProductIdentity {
        &self.product
    }

    pub fn hat_eeprom(&self) -> Option<&HatEeprom<G>> {
        self.hat_eeprom.as_ref()
    }

    pub fn hat_eeprom_mut(&mut self) -> Option<&mut HatEeprom<G>> {
        self.hat_eeprom.as_mut()
    }

    /// Attach the HAT EEPROM, replacing any previous one.
    pub fn set_hat_eeprom(&mut self, eeprom: HatEeprom<G>) {
        self.hat_eeprom = Some(eeprom);
    }

    pub fn network_interfaces(&self) -> &[NetworkInterface] {
        &self.network_interfaces
    }

    pub fn add_network_interface(&mut self, interface: NetworkInterface) {
        self.network_interfaces.push(interface);
    }

    // ── HAT EEPROM ────────────────────────────────────────────

    /// No-op without a HAT EEPROM.
    pub fn write_hat_eeprom(
        &mut self,
        image: &EepromImage,
        runner: &mut impl CommandRunner,
    ) -> Result<()> {
        match self.hat_eeprom.as_mut() {
            Some(eeprom) => eeprom.write(image, runner),
            None => Ok(()),
        }
    }

    /// No-op without a HAT EEPROM.
    pub fn clear_hat_eeprom(&mut self, runner: &mut impl CommandRunner) -> Result<()> {
        match self.hat_eeprom.as_mut() {
            Some(eeprom) => eeprom.clear_content(runner),
            None => Ok(()),
        }
    }

    /// No-op without a HAT EEPROM.
    pub fn dump_hat_eeprom(&self, output: &Path, runner: &mut impl CommandRunner) -> Result<()> {
        match self.hat_eeprom.as_ref() {
            Some(eeprom) => eeprom.dump(output, runner),
            None => Ok(()),
        }
    }

    // ── MAC addresses ─────────────────────────────────────────

    /// The addresses [`assign_sequential_mac_addresses`] would hand out:
    /// `first + i` for interface `i`.
    ///
    /// [`assign_sequential_mac_addresses`]: Self::assign_sequential_mac_addresses
    pub fn sequential_mac_addresses(&self, first: MacAddress) -> Result<Vec<MacAddress>> {
        (0..self.network_interfaces.len() as u64)
            .map(|offset| first.increment(offset).map_err(Into::into))
            .collect()
    }

    /// Give interface `i` the address `first + i`. Interfaces without a
    /// programmable EEPROM still use up their address, so later ports keep
    /// the same address regardless of which chips burn one.
    ///
    /// All addresses are computed before the first one is programmed. A
    /// failure part-way leaves earlier interfaces programmed.
    pub fn assign_sequential_mac_addresses(
        &self,
        first: MacAddress,
        runner: &mut impl CommandRunner,
    ) -> Result<Vec<MacAddress>> {
        let addresses = self.sequential_mac_addresses(first)?;

        for (interface, mac) in self.network_interfaces.iter().zip(&addresses) {
            interface.assign_mac(*mac, &self.sysfs, runner)?;
        }

        info!(
            "{}: assigned {} mac addresses starting at {}",
            self.product,
            addresses.len(),
            first.format_colon()
        );
        Ok(addresses)
    }
}
