use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug)]
pub struct SpiDriverImpl;

impl SpiDriverImpl {
    pub fn new(_device_path: &str) -> Result<SpiDriverImpl> {
        Err(Error::NotFound)
    }
}

impl super::Driver for SpiDriverImpl {
    fn write(&self, _data: &[u8]) -> Result<()> {
        Err(Error::NotFound)
    }

    fn write_read(&self, _command: &[u8], _delay: Duration, _response: &mut [u8]) -> Result<()> {
        Err(Error::NotFound)
    }
}

pub fn install_signal_handlers() -> Result<()> {
    log::warn!("signal handlers are not supported on this platform");
    Ok(())
}
