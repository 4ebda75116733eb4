//! Outbound progress events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port while it works through a
//! command. Adapters on the other side decide what to do with them: print
//! verbose progress lines, record them in a test, etc.

use std::path::Path;

use crate::mac::MacAddress;
use crate::network::InterfaceKind;

/// The coarse steps of a provisioning run, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoadConfig,
    WriteHatEeprom,
    ClearHatEeprom,
    DumpHatEeprom,
    WriteMacAddresses,
}

impl Step {
    /// Human readable label, as printed in verbose mode.
    pub fn label(self) -> &'static str {
        match self {
            Self::LoadConfig => "Loading device configuration",
            Self::WriteHatEeprom => "Writing HAT EEPROM",
            Self::ClearHatEeprom => "Clear HAT EEPROM",
            Self::DumpHatEeprom => "Dump HAT EEPROM",
            Self::WriteMacAddresses => "Writing mac addresses",
        }
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum ProvisionEvent<'a> {
    /// A command started for the given product number.
    Started { product: &'a str },

    /// A step is about to run.
    StepStarted(Step),

    /// The step completed.
    StepSucceeded(Step),

    /// The step failed; the error itself travels back as the return value.
    StepFailed(Step),

    /// The step does not apply to this product (e.g. no HAT EEPROM).
    StepSkipped(Step),

    /// The configuration names a HAT EEPROM that will be written from `image`.
    HatEepromFound { image: &'a Path },

    /// Interface registration begins; the first port gets `first_mac`.
    RegisteringInterfaces { first_mac: MacAddress },

    /// One network interface from the configuration was registered.
    InterfaceRegistered {
        index: usize,
        kind: InterfaceKind,
        path: &'a str,
    },

    /// MAC assignment finished; one address per interface, in order.
    MacAddressesAssigned(&'a [MacAddress]),
}
