use std::time::{Duration, Instant};
use std::thread::sleep;
use std::io;

use crate::{Error, Result};
use crate::config::{DataRate, Gain, RecorderConfiguration};
use crate::sys::Driver;
use crate::regs::ads1256::{self, Status};

const CALIBRATION_POLL_INTERVAL: Duration = Duration::from_millis(100);
const CALIBRATION_ATTEMPTS: usize = 10;
const CONVERSION_TIMEOUT: Duration = Duration::from_secs(1);

/// Source of one integer reading per logical channel.
///
/// A tick selects each channel and reads it exactly once, always in the same order.
pub trait ChannelReader {
    fn select_channel(&mut self, index: usize) -> Result<()>;
    fn read(&mut self) -> Result<i32>;
}

impl<R: ChannelReader + ?Sized> ChannelReader for &mut R {
    fn select_channel(&mut self, index: usize) -> Result<()> {
        (**self).select_channel(index)
    }

    fn read(&mut self) -> Result<i32> {
        (**self).read()
    }
}

#[derive(Debug)]
pub struct Device<D: Driver> {
    driver: D,
    // set while the converter may be out of standby
    running: bool,
}

impl Device<crate::sys::imp::SpiDriverImpl> {
    pub fn new(spi_device: &str) -> Result<Device<crate::sys::imp::SpiDriverImpl>> {
        let driver = crate::sys::imp::SpiDriverImpl::new(spi_device)?;
        Ok(Device::from_driver(driver))
    }

    /// Open the ADC, start it up and calibrate it, run `f`, and put the ADC into standby on every
    /// exit path.
    pub fn with<T, F>(config: &RecorderConfiguration, f: F) -> Result<T>
            where F: FnOnce(&mut Self) -> Result<T> {
        let device = Self::new(&config.spi_device)?;
        device.run(config.gain, config.data_rate, f)
    }
}

impl<D: Driver> Device<D> {
    pub fn from_driver(driver: D) -> Device<D> {
        Device { driver, running: false }
    }

    pub fn run<T, F>(mut self, gain: Gain, data_rate: DataRate, f: F) -> Result<T>
            where F: FnOnce(&mut Self) -> Result<T> {
        self.startup(gain, data_rate)?;
        let result = f(&mut self);
        match (result, self.teardown()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(error)) => Err(error),
            (Err(error), teardown) => {
                if let Err(teardown_error) = teardown {
                    log::error!("teardown failed: {}", teardown_error);
                }
                Err(error)
            }
        }
    }

    pub fn startup(&mut self, gain: Gain, data_rate: DataRate) -> Result<()> {
        self.running = true;

        self.write_command(ads1256::CMD_RESET)?;
        sleep(Duration::from_millis(5));

        let status = self.read_status()?;
        if status.chip_id() != ads1256::CHIP_ID_ADS1256 {
            log::error!("unexpected chip id {} (status {:?})", status.chip_id(), status);
            return Err(Error::NotFound)
        }

        self.write_registers(ads1256::ADDR_STATUS, &[
            Status::ACAL.bits(),
            ads1256::mux(0, 1),
            // clock out off, sensor detect off
            gain.ads1256_code(),
            data_rate.ads1256_code(),
        ])?;
        log::info!("configured ADC: gain {:?}, data rate {:?}", gain, data_rate);

        self.calibrate()
    }

    pub fn calibrate(&mut self) -> Result<()> {
        log::info!("performing self-calibration");
        self.write_command(ads1256::CMD_SELFCAL)?;
        for _ in 0..CALIBRATION_ATTEMPTS {
            sleep(CALIBRATION_POLL_INTERVAL);
            if !self.read_status()?.contains(Status::DRDY) {
                log::info!("self-calibration completed");
                return Ok(())
            }
        }
        Err(Error::Calibration)
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.running = false;
        self.write_command(ads1256::CMD_STANDBY)?;
        log::debug!("ADC in standby");
        Ok(())
    }

    pub fn read_status(&mut self) -> Result<Status> {
        let mut value = [0u8; 1];
        self.driver.write_read(&[ads1256::CMD_RREG | ads1256::ADDR_STATUS, 0x00],
            Duration::from_micros(ads1256::T6_MICROS), &mut value)?;
        let status = Status::from_bits_retain(value[0]);
        log::trace!("read_status() = {:?}", status);
        Ok(status)
    }

    fn write_command(&mut self, command: u8) -> Result<()> {
        log::trace!("write_command({:#04x})", command);
        self.driver.write(&[command])
    }

    fn write_registers(&mut self, first_addr: u8, values: &[u8]) -> Result<()> {
        log::debug!("write_registers({:#04x}, {:02x?})", first_addr, values);
        let mut packet = Vec::<u8>::with_capacity(values.len() + 2);
        packet.push(ads1256::CMD_WREG | first_addr);
        packet.push(values.len() as u8 - 1);
        packet.extend_from_slice(values);
        self.driver.write(packet.as_ref())
    }

    fn wait_conversion(&mut self) -> Result<()> {
        let deadline = Instant::now() + CONVERSION_TIMEOUT;
        while self.read_status()?.contains(Status::DRDY) {
            if Instant::now() >= deadline {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "conversion did not complete").into())
            }
        }
        Ok(())
    }
}

impl<D: Driver> ChannelReader for Device<D> {
    fn select_channel(&mut self, index: usize) -> Result<()> {
        if index > 3 {
            return Err(Error::InvalidChannel(index))
        }
        let positive = (index * 2) as u8;
        self.write_registers(ads1256::ADDR_MUX, &[ads1256::mux(positive, positive + 1)])?;
        // restart the digital filter so the next conversion only sees the new input pair
        self.write_command(ads1256::CMD_SYNC)?;
        self.write_command(ads1256::CMD_WAKEUP)
    }

    fn read(&mut self) -> Result<i32> {
        self.wait_conversion()?;
        let mut bytes = [0u8; 3];
        self.driver.write_read(&[ads1256::CMD_RDATA],
            Duration::from_micros(ads1256::T6_MICROS), &mut bytes)?;
        let code = sign_extend_24(bytes);
        log::trace!("read() = {:02x?} ({})", bytes, code);
        Ok(code)
    }
}

impl<D: Driver> Drop for Device<D> {
    fn drop(&mut self) {
        if self.running {
            if let Err(error) = self.teardown() {
                log::error!("failed to put ADC into standby: {}", error);
            }
        }
    }
}

fn sign_extend_24(bytes: [u8; 3]) -> i32 {
    (i32::from_be_bytes([bytes[0], bytes[1], bytes[2], 0])) >> 8
}
