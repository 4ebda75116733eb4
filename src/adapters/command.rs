//! Subprocess adapter.

use std::io;
use std::process::Command;

use log::trace;

use crate::app::ports::{CommandOutput, CommandRunner};

/// Runs programs with [`std::process::Command`], waiting for them to exit.
#[derive(Debug, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&mut self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        trace!("exec {program} {}", args.join(" "));
        let output = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
