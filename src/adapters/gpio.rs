//! GPIO character-device adapter.
//!
//! Implements [`GpioPort`] on top of `/dev/gpiochipN` via `gpio-cdev`. The
//! returned [`CdevPin`] owns the line handle; the kernel releases the line
//! when it is dropped.

use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use gpio_cdev::{Chip, LineHandle, LineRequestFlags};
use log::debug;

use crate::app::ports::{GpioError, GpioPort};
use crate::hat::GPIO_CONSUMER;

/// Opens GPIO chips below `/dev`.
#[derive(Debug, Default)]
pub struct CdevGpio;

impl CdevGpio {
    pub fn new() -> Self {
        Self
    }
}

impl GpioPort for CdevGpio {
    type Pin = CdevPin;

    fn request_output(
        &mut self,
        chip: &str,
        line: u32,
        initial_high: bool,
    ) -> Result<CdevPin, GpioError> {
        let device = format!("/dev/{chip}");
        let mut gpio_chip = Chip::new(&device).map_err(|e| GpioError::ChipOpen {
            chip: device.clone(),
            reason: e.to_string(),
        })?;

        let line_request = |e: gpio_cdev::Error| GpioError::LineRequest {
            line,
            reason: e.to_string(),
        };
        let handle = gpio_chip
            .get_line(line)
            .map_err(line_request)?
            .request(LineRequestFlags::OUTPUT, u8::from(initial_high), GPIO_CONSUMER)
            .map_err(line_request)?;

        debug!("{device}: line {line} requested as output");
        Ok(CdevPin { handle })
    }
}

/// A requested output line.
pub struct CdevPin {
    handle: LineHandle,
}

#[derive(Debug)]
pub struct CdevPinError(gpio_cdev::Error);

impl core::fmt::Display for CdevPinError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "gpio line: {}", self.0)
    }
}

impl digital::Error for CdevPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl ErrorType for CdevPin {
    type Error = CdevPinError;
}

impl OutputPin for CdevPin {
    fn set_low(&mut self) -> Result<(), CdevPinError> {
        self.handle.set_value(0).map_err(CdevPinError)
    }

    fn set_high(&mut self) -> Result<(), CdevPinError> {
        self.handle.set_value(1).map_err(CdevPinError)
    }
}
