//! Port traits: the boundary between provisioning logic and the OS.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HatEeprom / NetworkInterface / AppService
//! ```
//!
//! Driven adapters (GPIO character device, subprocesses, console) implement
//! these traits. The domain consumes them via generics, so the provisioning
//! logic never spawns a process or opens a GPIO chip directly and the whole
//! flow runs against mocks on a host.

use embedded_hal::digital::OutputPin;

use super::events::ProvisionEvent;

// ───────────────────────────────────────────────────────────────
// GPIO port (domain → write-protect line)
// ───────────────────────────────────────────────────────────────

/// Hands out GPIO lines configured as outputs.
///
/// The returned pin keeps the line requested for as long as it lives; the
/// line is released when the pin is dropped.
pub trait GpioPort {
    type Pin: OutputPin;

    /// Request `line` on `chip` (e.g. `gpiochip0`) as an output driven to
    /// `initial_high`.
    fn request_output(
        &mut self,
        chip: &str,
        line: u32,
        initial_high: bool,
    ) -> Result<Self::Pin, GpioError>;
}

// ───────────────────────────────────────────────────────────────
// Command port (domain → external helper programs)
// ───────────────────────────────────────────────────────────────

/// Captured result of one external program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr, trimmed. What a helper "printed".
    pub fn combined(&self) -> String {
        let mut out = self.stdout.trim_end().to_owned();
        let err = self.stderr.trim_end();
        if !err.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(err);
        }
        out
    }

    /// `exit status 3` / `signal`, for messages.
    pub fn status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {code}"),
            None => "signal".to_owned(),
        }
    }
}

/// Runs external programs synchronously with captured output.
///
/// `Err` means the program could not be started at all (missing binary,
/// permissions); a program that ran and failed is an `Ok` with a non-zero
/// [`CommandOutput::code`].
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> std::io::Result<CommandOutput>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → console / logging)
// ───────────────────────────────────────────────────────────────

/// The service emits [`ProvisionEvent`]s through this port. Adapters decide
/// where they go (verbose console lines, test recorders, ...).
pub trait EventSink {
    fn emit(&mut self, event: &ProvisionEvent<'_>);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug)]
pub enum GpioError {
    /// The GPIO chip could not be opened.
    ChipOpen { chip: String, reason: String },
    /// The line exists but could not be requested as output.
    LineRequest { line: u32, reason: String },
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ChipOpen { chip, reason } => write!(f, "cannot open {}: {}", chip, reason),
            Self::LineRequest { line, reason } => {
                write!(f, "cannot request line {} as output: {}", line, reason)
            }
        }
    }
}

impl std::error::Error for GpioError {}
