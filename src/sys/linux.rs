use std::ffi::{CStr, CString};
use std::io;
use std::time::Duration;
use libc::{c_int, c_ulong, c_void};
use crate::{Error, Result};

// See <linux/spi/spidev.h>.
const SPI_MODE_1: u8 = 0x01;
const SPI_IOC_WR_MODE: c_ulong = 0x4001_6b01;
const SPI_IOC_WR_MAX_SPEED_HZ: c_ulong = 0x4004_6b04;

const fn spi_ioc_message(count: usize) -> c_ulong {
    // _IOW('k', 0, char[SPI_MSG_SIZE(count)])
    (1 << 30) | (((count * core::mem::size_of::<SpiIocTransfer>()) as c_ulong) << 16) | (0x6b << 8)
}

// The ADS1256 clocks SCLK at up to fCLKIN/4; stay well below that.
const SPI_SPEED_HZ: u32 = 1_000_000;

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    pad: u8,
}

#[derive(Debug)]
struct Fd(c_int);

impl Fd {
    fn open(path: &CStr) -> io::Result<Fd> {
        unsafe {
            let fd = libc::open(path.as_ptr(), libc::O_RDWR);
            if fd == -1 {
                Err(io::Error::last_os_error())
            } else {
                Ok(Fd(fd))
            }
        }
    }

    fn ioctl<T>(&self, request: c_ulong, arg: *const T) -> io::Result<()> {
        unsafe {
            if libc::ioctl(self.0, request as _, arg) == -1 {
                Err(io::Error::last_os_error())
            } else {
                Ok(())
            }
        }
    }

    fn write(&self, data: &[u8]) -> io::Result<()> {
        let bytes_written = unsafe { libc::write(self.0, data.as_ptr() as *const c_void, data.len()) };
        check_write(bytes_written, data.len())
    }
}

fn check_write(bytes_written: isize, expected: usize) -> io::Result<()> {
    if bytes_written < 0 {
        Err(io::Error::last_os_error())
    } else if bytes_written as usize != expected {
        Err(io::Error::new(io::ErrorKind::WriteZero,
            format!("short SPI write: {} of {} bytes", bytes_written, expected)))
    } else {
        Ok(())
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        unsafe {
            if libc::close(self.0) == -1 {
                log::error!("error closing fd: {}", io::Error::last_os_error())
            }
        }
    }
}

#[derive(Debug)]
pub struct SpiDriverImpl {
    spi_fd: Fd,
}

impl SpiDriverImpl {
    pub fn new(device_path: &str) -> Result<SpiDriverImpl> {
        let spi_path = CString::new(device_path)
            .map_err(|error| Error::Other(error.into()))?;
        let spi_fd = Fd::open(spi_path.as_ref()).map_err(|error| {
            if error.kind() == io::ErrorKind::NotFound { Error::NotFound } else { Error::Io(error) }
        })?;
        spi_fd.ioctl(SPI_IOC_WR_MODE, &SPI_MODE_1)?;
        spi_fd.ioctl(SPI_IOC_WR_MAX_SPEED_HZ, &SPI_SPEED_HZ)?;
        log::debug!("opened {} (mode 1, {} Hz)", device_path, SPI_SPEED_HZ);
        Ok(SpiDriverImpl { spi_fd })
    }
}

impl super::Driver for SpiDriverImpl {
    fn write(&self, data: &[u8]) -> Result<()> {
        Ok(self.spi_fd.write(data)?)
    }

    fn write_read(&self, command: &[u8], delay: Duration, response: &mut [u8]) -> Result<()> {
        let transfers = [
            SpiIocTransfer {
                tx_buf: command.as_ptr() as u64,
                len: command.len() as u32,
                speed_hz: SPI_SPEED_HZ,
                delay_usecs: delay.as_micros().min(u16::MAX as u128) as u16,
                ..Default::default()
            },
            SpiIocTransfer {
                rx_buf: response.as_mut_ptr() as u64,
                len: response.len() as u32,
                speed_hz: SPI_SPEED_HZ,
                ..Default::default()
            },
        ];
        Ok(self.spi_fd.ioctl(spi_ioc_message(transfers.len()), transfers.as_ptr())?)
    }
}

extern "C" fn on_signal(_signum: c_int) {
    super::interrupt();
}

pub fn install_signal_handlers() -> Result<()> {
    for signum in [libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signum, on_signal as extern "C" fn(c_int) as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error().into())
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_spi_ioc_message_request() {
        assert_eq!(core::mem::size_of::<SpiIocTransfer>(), 32);
        assert_eq!(spi_ioc_message(1), 0x4020_6b00);
        assert_eq!(spi_ioc_message(2), 0x4040_6b00);
    }

    #[test]
    fn test_check_write_short() {
        assert!(check_write(3, 3).is_ok());
        let error = check_write(1, 3).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::WriteZero);
        assert!(error.to_string().contains("1 of 3"));
    }

    #[test]
    fn test_sigterm_raises_interrupt_flag() {
        let interrupt = super::super::interrupt_flag().unwrap();
        assert_eq!(unsafe { libc::raise(libc::SIGTERM) }, 0);
        assert!(interrupt.load(std::sync::atomic::Ordering::SeqCst));
    }
}
