//! Unified error types for the provisioning tool.
//!
//! A single [`Error`] enum that every subsystem converts into, so the CLI
//! boundary can map failures to exit codes in one place. Subsystems with
//! more than one failure mode carry their own sub-enum.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible provisioning operation funnels into this type.
#[derive(Debug, Error)]
pub enum Error {
    /// The MAC address could not be parsed or left the 48-bit range.
    #[error(transparent)]
    MacAddress(#[from] MacAddressError),
    /// The product number is not `PRxxxxxxRxx` / `FExxxxRxx`.
    #[error("Could not parse product number: {0}")]
    InvalidProductNumber(String),
    /// No network interface type is registered under this name.
    #[error("Invalid network interface type: {0}")]
    InvalidInterfaceType(String),
    /// sysfs has no net device below the configured bus path.
    #[error("Network interface not found: {0}")]
    InterfaceNotFound(String),
    /// Programming a MAC address into a network chip EEPROM failed.
    #[error(transparent)]
    NetworkEeprom(#[from] NetworkEepromError),
    /// Any HAT EEPROM failure (GPIO, overlay, I/O, verification).
    #[error("RevPi HAT EEPROM: {0}")]
    HatEeprom(#[from] HatEepromError),
    /// Device configuration missing, unparsable or schema-invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Process exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::InvalidProductNumber(_) => 1,
            Self::InterfaceNotFound(_) => 2,
            Self::HatEeprom(_) => 3,
            Self::MacAddress(_) | Self::InvalidInterfaceType(_) | Self::NetworkEeprom(_) => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// MAC address errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacAddressError {
    /// Not 12 hex digits after stripping `:` and `-`.
    #[error("Invalid MAC address format: '{0}'")]
    InvalidFormat(String),
    /// Offset arithmetic left `[0, 2^48)`.
    #[error("MAC address {base} {op} {offset} is outside the 48-bit range")]
    OutOfRange {
        base: String,
        op: char,
        offset: u64,
    },
}

// ---------------------------------------------------------------------------
// Network EEPROM errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum NetworkEepromError {
    /// The helper could not be started (usually: binary missing).
    #[error("Failed to write EEPROM for network interface '{interface}': {tool}: {source}")]
    Spawn {
        interface: String,
        tool: String,
        #[source]
        source: std::io::Error,
    },
    /// The helper ran but exited non-zero; `output` is what it printed.
    #[error("Failed to write EEPROM for network interface '{interface}': {tool} exited with {status}\n{output}")]
    HelperFailed {
        interface: String,
        tool: String,
        status: String,
        output: String,
    },
    /// The chip has an EEPROM flag set but no programming path exists.
    #[error("EEPROM programming is not supported for {kind} interface '{path}'")]
    Unsupported { kind: &'static str, path: String },
}

// ---------------------------------------------------------------------------
// HAT EEPROM errors
// ---------------------------------------------------------------------------

/// Failure taxonomy of the HAT EEPROM state machine. All of these reach the
/// user as [`Error::HatEeprom`].
#[derive(Debug, Error)]
pub enum HatEepromError {
    #[error("Failed to initialize write protection gpio: {0}")]
    GpioAcquire(String),
    #[error("Failed to set write protection gpio: {0}")]
    GpioSet(String),
    #[error("Failed to list loaded overlays: {0}")]
    OverlayList(String),
    #[error("Failed to load overlay '{overlay}': {reason}")]
    OverlayLoad { overlay: String, reason: String },
    #[error("Unable to determine HAT eeprom i2c path")]
    PathResolution,
    #[error("Failed to read image file '{}': {source}", .path.display())]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Image file is too big for EEPROM ({image} > {capacity} bytes)")]
    ImageTooLarge { image: usize, capacity: u64 },
    #[error("Failed to write image to EEPROM: {0}")]
    Write(#[source] std::io::Error),
    #[error("Failed to verify image: {0}")]
    Verify(#[source] std::io::Error),
    #[error("Failed to verify image: sha256 checksum mismatch: {eeprom} (eeprom) != {image} (image)")]
    ChecksumMismatch { eeprom: String, image: String },
    #[error("Could not dump EEPROM contents / write to output file: {0}")]
    Dump(#[source] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Device configuration file '{}' does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("Could not read device configuration file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not parse device configuration file: {0}")]
    Parse(String),
    #[error("Schema error in device configuration file: {0}")]
    Schema(String),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
