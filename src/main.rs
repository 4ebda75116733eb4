//! `revpi-provisioning`: end-of-line provisioning command line.
//!
//! ```text
//! revpi-provisioning [-v] provision PR100359R01 c8:3e:a7:01:02:03 hat.eep
//! revpi-provisioning [-v] clear-hat PR100359R01
//! revpi-provisioning [-v] dump-hat PR100359R01 dump.eep
//! revpi-provisioning validate-config devices/PR100359R01.yaml
//! ```
//!
//! Exit codes: 0 success, 1 configuration, 2 interface not found,
//! 3 HAT EEPROM, 4 MAC address programming.

#![deny(unused_must_use)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use log::debug;
use tracing_subscriber::EnvFilter;

use revpi_provisioning::Error;
use revpi_provisioning::adapters::command::SystemCommandRunner;
use revpi_provisioning::adapters::console::ConsoleSink;
use revpi_provisioning::adapters::gpio::CdevGpio;
use revpi_provisioning::app::commands::{AppCommand, AppOutcome};
use revpi_provisioning::app::service::{AppService, ServiceSettings};
use revpi_provisioning::config::DEFAULT_DEVICES_DIR;
use revpi_provisioning::hat::DEFAULT_SETTLE_DELAY;
use revpi_provisioning::sysfs::{DEFAULT_SYSFS_ROOT, Sysfs};

// ── Command line ──────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(version, about = "End-of-line provisioning for Revolution Pi devices")]
struct Cli {
    /// Print progress while working.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory with the PRxxxxxxRxx.yaml device configurations.
    #[arg(
        long,
        global = true,
        env = "REVPI_PROVISIONING_DEVICES",
        default_value = DEFAULT_DEVICES_DIR
    )]
    devices_dir: PathBuf,

    #[arg(long, global = true, hide = true, default_value = DEFAULT_SYSFS_ROOT)]
    sysfs_root: PathBuf,

    /// Wait after loading the HAT EEPROM overlay, in milliseconds.
    #[arg(long, global = true, hide = true)]
    settle_delay_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the HAT EEPROM and the MAC addresses of a device.
    Provision {
        /// Product number, e.g. PR100359R01.
        #[arg(value_name = "PRODUCT-NUMBER")]
        product: String,
        /// MAC address of the first network interface.
        #[arg(value_name = "FIRST-MAC")]
        first_mac: String,
        /// HAT EEPROM image (.eep).
        #[arg(value_name = "EEPROM-IMAGE")]
        image: PathBuf,
    },
    /// Overwrite the HAT EEPROM with 0xff.
    ClearHat {
        #[arg(value_name = "PRODUCT-NUMBER")]
        product: String,
    },
    /// Copy the HAT EEPROM contents to a file.
    DumpHat {
        #[arg(value_name = "PRODUCT-NUMBER")]
        product: String,
        #[arg(value_name = "OUTPUT-FILE")]
        output: PathBuf,
    },
    /// Check a device configuration file.
    ValidateConfig {
        #[arg(value_name = "CONFIG-FILE")]
        path: PathBuf,
    },
}

impl From<Command> for AppCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Provision {
                product,
                first_mac,
                image,
            } => Self::Provision {
                product,
                first_mac,
                image,
            },
            Command::ClearHat { product } => Self::ClearHat { product },
            Command::DumpHat { product, output } => Self::DumpHat { product, output },
            Command::ValidateConfig { path } => Self::ValidateConfig { path },
        }
    }
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("{e:#}");
    }

    let settings = ServiceSettings {
        devices_dir: cli.devices_dir,
        sysfs: Sysfs::new(cli.sysfs_root),
        settle_delay: cli
            .settle_delay_ms
            .map_or(DEFAULT_SETTLE_DELAY, Duration::from_millis),
    };
    debug!("{settings:?}");

    let command = AppCommand::from(cli.command);

    let mut service = AppService::new(settings, SystemCommandRunner::new());
    let mut sink = ConsoleSink::stdout(cli.verbose);

    match service.handle(command.clone(), CdevGpio::new(), &mut sink) {
        Ok(outcome) => {
            if let Err(e) = report(&outcome, &mut io::stdout()) {
                debug!("stdout: {e}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("{e:?}");
            if let Err(write) = report_failure(&command, &e, &mut io::stderr()) {
                debug!("stderr: {write}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("cannot install logger")
}

/// Leading phrase of the error message, by command and error class.
fn failure_context(command: &AppCommand, e: &Error) -> &'static str {
    match (command, e) {
        (AppCommand::ValidateConfig { .. }, _) => "Device configuration is invalid",
        (AppCommand::Provision { .. }, Error::HatEeprom(_)) => {
            "Could not write image to HAT EEPROM"
        }
        (AppCommand::ClearHat { .. }, Error::HatEeprom(_)) => "Could not clear HAT EEPROM",
        (AppCommand::DumpHat { .. }, Error::HatEeprom(_)) => "Could not dump HAT EEPROM",
        (_, Error::InterfaceNotFound(_)) => "Could not find network interface",
        (_, Error::MacAddress(_) | Error::InvalidInterfaceType(_) | Error::NetworkEeprom(_)) => {
            "Could not write mac address"
        }
        (_, Error::Config(_) | Error::InvalidProductNumber(_)) => "Could not load configuration",
    }
}

/// `FAILED` followed by `<context>: <error>`.
fn report_failure(command: &AppCommand, e: &Error, out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "FAILED")?;
    writeln!(out, "{}: {e}", failure_context(command, e))
}

fn report(outcome: &AppOutcome, out: &mut impl Write) -> io::Result<()> {
    match outcome {
        AppOutcome::Provisioned(addresses) => {
            for mac in addresses {
                writeln!(out, "{}", mac.format_colon())?;
            }
            Ok(())
        }
        AppOutcome::Cleared(true) => writeln!(out, "HAT EEPROM cleared"),
        AppOutcome::Dumped(true) => writeln!(out, "HAT EEPROM dumped"),
        AppOutcome::Cleared(false) | AppOutcome::Dumped(false) => {
            writeln!(out, "Device has no HAT EEPROM, nothing to do")
        }
        AppOutcome::Validated(path) => writeln!(
            out,
            "Device configuration file '{}' has been validated successfully",
            path.display()
        ),
    }
}
