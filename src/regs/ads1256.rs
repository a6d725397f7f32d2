#![allow(dead_code)]

use bitflags::bitflags;

// See the ADS1256 datasheet (SBAS288), "Command Definitions" and "Register Map".

/// Completes SYNC and exits standby mode
pub const CMD_WAKEUP: u8 = 0x00;
/// Read data
pub const CMD_RDATA: u8 = 0x01;
/// Read data continuously
pub const CMD_RDATAC: u8 = 0x03;
/// Stop read data continuously
pub const CMD_SDATAC: u8 = 0x0f;
/// Read from register `rrrr`; second byte is the register count minus one
pub const CMD_RREG: u8 = 0x10;
/// Write to register `rrrr`; second byte is the register count minus one
pub const CMD_WREG: u8 = 0x50;
/// Offset and gain self-calibration
pub const CMD_SELFCAL: u8 = 0xf0;
/// Synchronize the A/D conversion
pub const CMD_SYNC: u8 = 0xfc;
/// Begin standby mode
pub const CMD_STANDBY: u8 = 0xfd;
/// Reset to power-up values
pub const CMD_RESET: u8 = 0xfe;

/// Status Register
pub const ADDR_STATUS: u8 = 0x00;
/// Input Multiplexer Control Register
pub const ADDR_MUX: u8 = 0x01;
/// A/D Control Register
pub const ADDR_ADCON: u8 = 0x02;
/// A/D Data Rate
pub const ADDR_DRATE: u8 = 0x03;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        /// Data Ready: mirrors the DRDY pin (read-only).
        const DRDY  = 1<<0;
        /// Analog Input Buffer Enable.
        const BUFEN = 1<<1;
        /// Auto-Calibration: self-calibrate when PGA, DR or BUFEN change.
        const ACAL  = 1<<2;
        /// Data Output Bit Order: set for least significant bit first.
        const ORDER = 1<<3;

        const _ = !0;
    }
}

impl Status {
    /// Factory programmed identification bits, `3` for the ADS1256.
    pub fn chip_id(self) -> u8 {
        self.bits() >> 4
    }
}

pub const CHIP_ID_ADS1256: u8 = 3;

/// Multiplexer setting selecting `AINp - AINn`.
pub fn mux(positive: u8, negative: u8) -> u8 {
    (positive & 0x0f) << 4 | (negative & 0x0f)
}

/// Minimum delay between the last SCLK edge of RDATA and the first SCLK edge of the response,
/// 50 periods of the 7.68 MHz master clock.
pub const T6_MICROS: u64 = 7;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_status_chip_id() {
        let status = Status::from_bits_retain(0x31);
        assert_eq!(status.chip_id(), CHIP_ID_ADS1256);
        assert!(status.contains(Status::DRDY));
        assert!(!status.contains(Status::ACAL));
    }

    #[test]
    fn test_mux() {
        assert_eq!(mux(0, 1), 0x01);
        assert_eq!(mux(2, 3), 0x23);
        assert_eq!(mux(6, 7), 0x67);
    }
}
