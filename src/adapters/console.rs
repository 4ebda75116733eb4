//! Console event sink adapter.
//!
//! Implements [`EventSink`] by printing progress lines to stdout when
//! verbose output is requested:
//!
//! ```text
//! Starting device provisioning for product 'PR100359R01'
//! Loading device configuration ... OK
//! Registering network interfaces. Base mac address will be 'c8:3e:a7:01:02:03'
//!   Ethernet 0: type=lan95xx path=1-1.1:1.0 ... OK
//! Writing mac addresses ... OK
//! Successfully wrote 1 mac addresses
//! ```
//!
//! A failed step completes its line with `FAILED`. The error itself is
//! reported on stderr by the caller; diagnostics go through `log`.

use std::io::{self, Stdout, Write};

use log::trace;

use crate::app::events::{ProvisionEvent, Step};
use crate::app::ports::EventSink;

pub struct ConsoleSink<W: Write = Stdout> {
    verbose: bool,
    out: W,
}

impl ConsoleSink {
    pub fn stdout(verbose: bool) -> Self {
        Self::new(verbose, io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(verbose: bool, out: W) -> Self {
        Self { verbose, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn verbose(&mut self, text: &str, newline: bool) {
        if !self.verbose {
            return;
        }
        let written = if newline {
            writeln!(self.out, "{text}")
        } else {
            write!(self.out, "{text}").and_then(|()| self.out.flush())
        };
        if let Err(e) = written {
            trace!("console write failed: {e}");
        }
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: &ProvisionEvent<'_>) {
        match event {
            ProvisionEvent::Started { product } => {
                self.verbose(
                    &format!("Starting device provisioning for product '{product}'"),
                    true,
                );
            }
            ProvisionEvent::StepStarted(step) => {
                self.verbose(&format!("{} ... ", step.label()), false);
            }
            ProvisionEvent::StepSucceeded(_) => self.verbose("OK", true),
            ProvisionEvent::StepFailed(_) => self.verbose("FAILED", true),
            ProvisionEvent::StepSkipped(Step::WriteHatEeprom) => {}
            ProvisionEvent::StepSkipped(step) => {
                self.verbose(&format!("{}: no HAT EEPROM configured, skipped", step.label()), true);
            }
            ProvisionEvent::HatEepromFound { image } => {
                self.verbose(
                    &format!(
                        "Found HAT EEPROM definition in config file. Will write image '{}'",
                        image.display()
                    ),
                    true,
                );
            }
            ProvisionEvent::RegisteringInterfaces { first_mac } => {
                self.verbose(
                    &format!(
                        "Registering network interfaces. Base mac address will be '{}'",
                        first_mac.format_colon()
                    ),
                    true,
                );
            }
            ProvisionEvent::InterfaceRegistered { index, kind, path } => {
                let mut line = format!("  Ethernet {index}: type={kind} ");
                if !path.is_empty() {
                    line.push_str(&format!("path={path} "));
                }
                line.push_str("... OK");
                self.verbose(&line, true);
            }
            ProvisionEvent::MacAddressesAssigned(addresses) => {
                self.verbose(
                    &format!("Successfully wrote {} mac addresses", addresses.len()),
                    true,
                );
            }
        }
    }
}
