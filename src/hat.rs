//! HAT EEPROM handling.
//!
//! The identification EEPROM sits on I2C address `0x50` and only appears in
//! sysfs once the `revpi-hat-eeprom` device-tree overlay is loaded. Writes
//! are additionally gated by a write-protect GPIO (high = protected).
//!
//! ```text
//!  write / clear:   unprotect ─▶ overlay ─▶ resolve node ─▶ write ─▶ (verify) ─▶ protect
//!  dump:                         overlay ─▶ resolve node ─▶ read  ─▶ output file
//! ```
//!
//! `write` and `clear_content` re-enable write protection on every return
//! path, including failures in between.

use std::borrow::Cow;
use std::fs::{self, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::app::ports::{CommandRunner, GpioPort};
use crate::error::{HatEepromError, Result};
use crate::sysfs::{self, Sysfs};

pub const DEFAULT_GPIO_CHIP: &str = "gpiochip0";

/// Consumer label on the requested write-protect line.
pub const GPIO_CONSUMER: &str = "eol-provisioner";

/// Time the kernel gets to create the sysfs node after an overlay load.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Overlay management tool (`dtoverlay -l` lists, `dtoverlay <name>` loads).
pub const DTOVERLAY: &str = "dtoverlay";

type HatResult<T> = core::result::Result<T, HatEepromError>;

// ───────────────────────────────────────────────────────────────
// Overlay
// ───────────────────────────────────────────────────────────────

/// Device-tree overlays that instantiate the HAT EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Overlay {
    /// CM3 / CM4 based devices.
    #[default]
    #[serde(rename = "revpi-hat-eeprom")]
    RevpiHatEeprom,
    /// CM5 / Pi 5 based devices.
    #[serde(rename = "revpi-hat-eeprom-pi5")]
    RevpiHatEepromPi5,
}

impl Overlay {
    pub fn name(self) -> &'static str {
        match self {
            Self::RevpiHatEeprom => "revpi-hat-eeprom",
            Self::RevpiHatEepromPi5 => "revpi-hat-eeprom-pi5",
        }
    }
}

/// Names from `dtoverlay -l` output.
///
/// ```text
/// Overlays (in load order):
/// 0:  revpi-hat-eeprom
/// ```
///
/// The first line is a headline; lines without `:` are ignored.
pub fn parse_overlay_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(_, name)| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect()
}

// ───────────────────────────────────────────────────────────────
// Image
// ───────────────────────────────────────────────────────────────

/// EEPROM content, either from an `.eep` file or already in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EepromImage {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl EepromImage {
    fn bytes(&self) -> HatResult<Cow<'_, [u8]>> {
        match self {
            Self::File(path) => fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| HatEepromError::ImageRead {
                    path: path.clone(),
                    source,
                }),
            Self::Bytes(data) => Ok(Cow::Borrowed(data)),
        }
    }
}

impl From<PathBuf> for EepromImage {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for EepromImage {
    fn from(path: &Path) -> Self {
        Self::File(path.to_path_buf())
    }
}

impl From<Vec<u8>> for EepromImage {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

/// Compare the SHA-256 of `image` against the same-length prefix of the
/// EEPROM contents read back after writing.
pub fn verify_image(image: &[u8], eeprom: &[u8]) -> core::result::Result<(), HatEepromError> {
    let prefix = eeprom.get(..image.len()).unwrap_or(eeprom);

    let sha_image = sha256_hex(image);
    let sha_eeprom = sha256_hex(prefix);

    if sha_eeprom != sha_image {
        return Err(HatEepromError::ChecksumMismatch {
            eeprom: sha_eeprom,
            image: sha_image,
        });
    }

    debug!("HAT EEPROM verified, sha256 {sha_image}");
    Ok(())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(hmac_sha256::Hash::hash(data))
}

// ───────────────────────────────────────────────────────────────
// HatEeprom
// ───────────────────────────────────────────────────────────────

pub struct HatEeprom<G: GpioPort> {
    write_protect_gpio: u32,
    gpio_chip: String,
    overlay: Overlay,
    /// EEPROM node, `?`/`*` wildcards allowed; `None` scans sysfs.
    eeprom_path: Option<PathBuf>,
    sysfs: Sysfs,
    settle_delay: Duration,
    gpio: G,
    /// Requested on the first write-protect change, held until drop.
    wp_pin: Option<G::Pin>,
    /// Reads the node back for verification.
    read_back: fn(&Path) -> io::Result<Vec<u8>>,
}

impl<G: GpioPort> HatEeprom<G> {
    pub fn new(write_protect_gpio: u32, gpio: G) -> Self {
        Self {
            write_protect_gpio,
            gpio_chip: DEFAULT_GPIO_CHIP.to_owned(),
            overlay: Overlay::default(),
            eeprom_path: None,
            sysfs: Sysfs::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            gpio,
            wp_pin: None,
            read_back: read_node,
        }
    }

    #[cfg(test)]
    fn with_read_back(mut self, read_back: fn(&Path) -> io::Result<Vec<u8>>) -> Self {
        self.read_back = read_back;
        self
    }

    pub fn with_gpio_chip(mut self, chip: impl Into<String>) -> Self {
        self.gpio_chip = chip.into();
        self
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_eeprom_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.eeprom_path = Some(path.into());
        self
    }

    pub fn with_sysfs(mut self, sysfs: Sysfs) -> Self {
        self.sysfs = sysfs;
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn write_protect_gpio(&self) -> u32 {
        self.write_protect_gpio
    }

    pub fn gpio_chip(&self) -> &str {
        &self.gpio_chip
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    // ── Hardware state ────────────────────────────────────────

    /// Locate the EEPROM node. Only meaningful once the overlay is loaded,
    /// since the node does not exist before that.
    pub fn resolve_eeprom_path(&self) -> Result<PathBuf> {
        Ok(self.eeprom_node()?)
    }

    fn eeprom_node(&self) -> HatResult<PathBuf> {
        if let Some(pattern) = &self.eeprom_path {
            return sysfs::match_pattern(pattern)
                .into_iter()
                .next()
                .ok_or(HatEepromError::PathResolution);
        }

        self.sysfs
            .hat_eeprom_candidates()
            .ok()
            .and_then(|candidates| candidates.into_iter().next())
            .ok_or(HatEepromError::PathResolution)
    }

    /// Drive the write-protect line. The line is requested on first use,
    /// already driven high so that acquiring it never unprotects.
    pub fn set_write_protect(&mut self, enabled: bool) -> Result<()> {
        Ok(self.write_protect(enabled)?)
    }

    fn write_protect(&mut self, enabled: bool) -> HatResult<()> {
        if self.wp_pin.is_none() {
            let pin = self
                .gpio
                .request_output(&self.gpio_chip, self.write_protect_gpio, true)
                .map_err(|e| HatEepromError::GpioAcquire(e.to_string()))?;
            debug!(
                "write protect line {}:{} requested",
                self.gpio_chip, self.write_protect_gpio
            );
            self.wp_pin = Some(pin);
        }

        let pin = self
            .wp_pin
            .as_mut()
            .ok_or_else(|| HatEepromError::GpioSet("line not requested".to_owned()))?;
        pin.set_state(PinState::from(enabled))
            .map_err(|e| HatEepromError::GpioSet(format!("{e:?}")))?;

        info!(
            "HAT EEPROM write protection {}",
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }

    /// Overlays currently loaded, in load order.
    pub fn loaded_overlays(&self, runner: &mut impl CommandRunner) -> Result<Vec<String>> {
        Ok(self.list_overlays(runner)?)
    }

    fn list_overlays(&self, runner: &mut impl CommandRunner) -> HatResult<Vec<String>> {
        let output = runner
            .run(DTOVERLAY, &["-l"])
            .map_err(|e| HatEepromError::OverlayList(e.to_string()))?;

        if !output.success() {
            return Err(HatEepromError::OverlayList(format!(
                "{}: {}",
                output.status(),
                output.combined()
            )));
        }

        Ok(parse_overlay_list(&output.stdout))
    }

    /// Load the configured overlay unless it already is, then give the
    /// kernel the settle delay to create the EEPROM node.
    pub fn ensure_overlay_loaded(&self, runner: &mut impl CommandRunner) -> Result<()> {
        Ok(self.load_overlay(runner)?)
    }

    fn load_overlay(&self, runner: &mut impl CommandRunner) -> HatResult<()> {
        let name = self.overlay.name();

        if self.list_overlays(runner)?.iter().any(|loaded| loaded == name) {
            debug!("overlay '{name}' already loaded");
            return Ok(());
        }

        let load_failed = |reason: String| HatEepromError::OverlayLoad {
            overlay: name.to_owned(),
            reason,
        };

        let output = runner
            .run(DTOVERLAY, &[name])
            .map_err(|e| load_failed(e.to_string()))?;
        if !output.success() {
            return Err(load_failed(format!(
                "{}: {}",
                output.status(),
                output.combined()
            )));
        }

        info!("overlay '{name}' loaded");
        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        Ok(())
    }

    // ── Operations ────────────────────────────────────────────

    /// Write `image` and verify it by SHA-256 read-back.
    pub fn write(&mut self, image: &EepromImage, runner: &mut impl CommandRunner) -> Result<()> {
        let written = self.with_write_access(|eeprom| {
            eeprom.load_overlay(runner)?;
            let node = eeprom.eeprom_node()?;
            let data = image.bytes()?;

            write_node(&node, &data)?;

            let contents = (eeprom.read_back)(&node).map_err(HatEepromError::Verify)?;
            verify_image(&data, &contents)
        });

        Ok(written?)
    }

    /// Overwrite the whole EEPROM with `0xff`. No read-back.
    pub fn clear_content(&mut self, runner: &mut impl CommandRunner) -> Result<()> {
        let cleared = self.with_write_access(|eeprom| {
            eeprom.load_overlay(runner)?;
            let node = eeprom.eeprom_node()?;
            let capacity = node_capacity(&node)?;

            write_node(&node, &vec![0xff; capacity as usize])
        });

        Ok(cleared?)
    }

    /// Copy the EEPROM contents to `output`. Read-only: the write-protect
    /// line is not touched.
    pub fn dump(&self, output: &Path, runner: &mut impl CommandRunner) -> Result<()> {
        self.load_overlay(runner)?;
        let node = self.eeprom_node()?;

        let data = fs::read(&node).map_err(HatEepromError::Dump)?;
        fs::write(output, &data).map_err(HatEepromError::Dump)?;

        info!("dumped {} bytes from {} to {}", data.len(), node.display(), output.display());
        Ok(())
    }

    /// Run `op` with write protection lifted and restore it afterwards,
    /// whatever `op` returned.
    fn with_write_access<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> HatResult<T>,
    ) -> HatResult<T> {
        self.write_protect(false)?;
        let result = op(self);
        let restored = self.write_protect(true);

        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(restore)) => Err(restore),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore)) => {
                warn!("HAT EEPROM left unprotected: {restore}");
                Err(e)
            }
        }
    }
}

fn read_node(node: &Path) -> io::Result<Vec<u8>> {
    fs::read(node)
}

/// Size of the EEPROM as reported by its sysfs node.
fn node_capacity(node: &Path) -> HatResult<u64> {
    fs::metadata(node)
        .map(|meta| meta.len())
        .map_err(HatEepromError::Write)
}

fn write_node(node: &Path, data: &[u8]) -> HatResult<()> {
    let capacity = node_capacity(node)?;
    if data.len() as u64 > capacity {
        return Err(HatEepromError::ImageTooLarge {
            image: data.len(),
            capacity,
        });
    }

    // No truncate: the sysfs node has a fixed size.
    let mut file = OpenOptions::new()
        .write(true)
        .open(node)
        .map_err(HatEepromError::Write)?;
    file.write_all(data).map_err(HatEepromError::Write)?;
    file.flush().map_err(HatEepromError::Write)?;

    info!("wrote {} of {} bytes to {}", data.len(), capacity, node.display());
    Ok(())
}
