//! Linux GPIO character-device driver (Raspberry Pi).
//!
//! Requests the relay line through `/dev/gpiochipN` and hands it out as an
//! `embedded-hal` output pin.  The kernel releases the line when the pin is
//! dropped, so there is no explicit close.

use gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use log::{debug, warn};

use super::relay::LineDriver;
use crate::error::AcquireError;

pub struct CdevDriver {
    chip_path: String,
    consumer: String,
}

impl CdevDriver {
    pub fn new(chip_path: impl Into<String>, consumer: impl Into<String>) -> Self {
        Self {
            chip_path: chip_path.into(),
            consumer: consumer.into(),
        }
    }
}

impl LineDriver for CdevDriver {
    type Pin = CdevPin;

    fn open_output(&mut self, channel: u32) -> Result<CdevPin, AcquireError> {
        let mut chip = Chip::new(&self.chip_path).map_err(|e| {
            warn!("relay: cannot open {}: {e}", self.chip_path);
            AcquireError::DriverUnavailable
        })?;
        debug!(
            "relay: {} ({}) has {} lines",
            chip.name(),
            chip.label(),
            chip.num_lines()
        );

        let line = chip.get_line(channel).map_err(|e| {
            warn!("relay: {} has no line {channel}: {e}", self.chip_path);
            AcquireError::InvalidChannel { channel }
        })?;

        let handle = line
            .request(LineRequestFlags::OUTPUT, 0, &self.consumer)
            .map_err(|e| {
                // Usually another consumer already holds the line.
                warn!("relay: line {channel} request failed: {e}");
                AcquireError::ChannelBusy { channel }
            })?;

        CdevPin::new(handle).map_err(|e| {
            warn!("relay: line {channel} info query failed: {e}");
            AcquireError::DriverUnavailable
        })
    }
}
