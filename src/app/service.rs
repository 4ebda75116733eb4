//! Application service, the hexagonal core.
//!
//! [`AppService`] turns an [`AppCommand`] into the provisioning sequence
//! and reports progress through an [`EventSink`]. All OS access flows
//! through the injected [`CommandRunner`] and the per-command [`GpioPort`],
//! making the whole service testable with mock adapters.
//!
//! ```text
//!  CommandRunner ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                    │       AppService         │
//!       GpioPort ──▶ │ config · RevPi · steps   │
//!                    └─────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;

use crate::config::{self, DEFAULT_DEVICES_DIR};
use crate::device::RevPi;
use crate::error::Result;
use crate::hat::{DEFAULT_SETTLE_DELAY, EepromImage};
use crate::mac::MacAddress;
use crate::product::{ProductIdentity, extract_product};
use crate::sysfs::Sysfs;

use super::commands::{AppCommand, AppOutcome};
use super::events::{ProvisionEvent, Step};
use super::ports::{CommandRunner, EventSink, GpioPort};

// ───────────────────────────────────────────────────────────────
// Settings
// ───────────────────────────────────────────────────────────────

/// Where the service finds things on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Directory holding `PRxxxxxxRxx.yaml` device configurations.
    pub devices_dir: PathBuf,
    pub sysfs: Sysfs,
    /// Wait after loading the HAT EEPROM overlay.
    pub settle_delay: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            devices_dir: PathBuf::from(DEFAULT_DEVICES_DIR),
            sysfs: Sysfs::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<R: CommandRunner> {
    settings: ServiceSettings,
    runner: R,
}

impl<R: CommandRunner> AppService<R> {
    pub fn new(settings: ServiceSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Carry out one command. `gpio` provides the HAT EEPROM write-protect
    /// line if the product has one.
    pub fn handle<G: GpioPort>(
        &mut self,
        cmd: AppCommand,
        gpio: G,
        sink: &mut impl EventSink,
    ) -> Result<AppOutcome> {
        match cmd {
            AppCommand::Provision {
                product,
                first_mac,
                image,
            } => self.provision(&product, &first_mac, &image, gpio, sink),
            AppCommand::ClearHat { product } => self.clear_hat(&product, gpio, sink),
            AppCommand::DumpHat { product, output } => self.dump_hat(&product, &output, gpio, sink),
            AppCommand::ValidateConfig { path } => {
                run_step(sink, Step::LoadConfig, || config::validate_config_file(&path))?;
                Ok(AppOutcome::Validated(path))
            }
        }
    }

    // ── Commands ──────────────────────────────────────────────

    fn provision<G: GpioPort>(
        &mut self,
        product: &str,
        first_mac: &str,
        image: &Path,
        gpio: G,
        sink: &mut impl EventSink,
    ) -> Result<AppOutcome> {
        sink.emit(&ProvisionEvent::Started { product });

        let identity = extract_product(product)?;
        let first = MacAddress::parse(first_mac)?;
        let mut device = self.load_device(identity, gpio, sink)?;

        sink.emit(&ProvisionEvent::RegisteringInterfaces { first_mac: first });
        for (index, interface) in device.network_interfaces().iter().enumerate() {
            sink.emit(&ProvisionEvent::InterfaceRegistered {
                index,
                kind: interface.kind(),
                path: interface.path(),
            });
        }

        // Overflow shows up here, before anything is written.
        device.sequential_mac_addresses(first)?;

        if device.hat_eeprom().is_some() {
            sink.emit(&ProvisionEvent::HatEepromFound { image });
            let image = EepromImage::from(image);
            run_step(sink, Step::WriteHatEeprom, || {
                device.write_hat_eeprom(&image, &mut self.runner)
            })?;
        } else {
            sink.emit(&ProvisionEvent::StepSkipped(Step::WriteHatEeprom));
        }

        let addresses = run_step(sink, Step::WriteMacAddresses, || {
            device.assign_sequential_mac_addresses(first, &mut self.runner)
        })?;
        sink.emit(&ProvisionEvent::MacAddressesAssigned(&addresses));

        info!("{}: provisioning complete", device.product());
        Ok(AppOutcome::Provisioned(addresses))
    }

    fn clear_hat<G: GpioPort>(
        &mut self,
        product: &str,
        gpio: G,
        sink: &mut impl EventSink,
    ) -> Result<AppOutcome> {
        sink.emit(&ProvisionEvent::Started { product });

        let identity = extract_product(product)?;
        let mut device = self.load_device(identity, gpio, sink)?;

        if device.hat_eeprom().is_none() {
            sink.emit(&ProvisionEvent::StepSkipped(Step::ClearHatEeprom));
            return Ok(AppOutcome::Cleared(false));
        }

        run_step(sink, Step::ClearHatEeprom, || device.clear_hat_eeprom(&mut self.runner))?;
        Ok(AppOutcome::Cleared(true))
    }

    fn dump_hat<G: GpioPort>(
        &mut self,
        product: &str,
        output: &Path,
        gpio: G,
        sink: &mut impl EventSink,
    ) -> Result<AppOutcome> {
        sink.emit(&ProvisionEvent::Started { product });

        let identity = extract_product(product)?;
        let device = self.load_device(identity, gpio, sink)?;

        if device.hat_eeprom().is_none() {
            sink.emit(&ProvisionEvent::StepSkipped(Step::DumpHatEeprom));
            return Ok(AppOutcome::Dumped(false));
        }

        run_step(sink, Step::DumpHatEeprom, || device.dump_hat_eeprom(output, &mut self.runner))?;
        Ok(AppOutcome::Dumped(true))
    }

    // ── Internal ──────────────────────────────────────────────

    fn load_device<G: GpioPort>(
        &self,
        product: ProductIdentity,
        gpio: G,
        sink: &mut impl EventSink,
    ) -> Result<RevPi<G>> {
        let config = run_step(sink, Step::LoadConfig, || {
            config::load_config(&self.settings.devices_dir, &product)
        })?;

        Ok(RevPi::from_config(
            product,
            &config,
            gpio,
            self.settings.sysfs.clone(),
            self.settings.settle_delay,
        ))
    }
}

/// Run `op` bracketed by step events.
fn run_step<T>(
    sink: &mut impl EventSink,
    step: Step,
    op: impl FnOnce() -> Result<T>,
) -> Result<T> {
    sink.emit(&ProvisionEvent::StepStarted(step));
    match op() {
        Ok(value) => {
            sink.emit(&ProvisionEvent::StepSucceeded(step));
            Ok(value)
        }
        Err(e) => {
            sink.emit(&ProvisionEvent::StepFailed(step));
            Err(e)
        }
    }
}
