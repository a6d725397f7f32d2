//! Recorder configuration: everything that is fixed at startup.

use std::path::PathBuf;
use std::time::Duration;

/// Programmable gain amplifier setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gain {
    #[default]
    X1,
    X2,
    X4,
    X8,
    X16,
    X32,
    X64,
}

impl Gain {
    /// Value of the ADCON.PGA field.
    pub(crate) fn ads1256_code(self) -> u8 {
        match self {
            Self::X1  => 0b000,
            Self::X2  => 0b001,
            Self::X4  => 0b010,
            Self::X8  => 0b011,
            Self::X16 => 0b100,
            Self::X32 => 0b101,
            Self::X64 => 0b110,
        }
    }
}

/// Conversion rate of the ADC modulator output, in samples per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataRate {
    Sps30000,
    Sps15000,
    Sps7500,
    Sps3750,
    Sps2000,
    Sps1000,
    Sps500,
    #[default]
    Sps100,
    Sps60,
    Sps50,
    Sps30,
    Sps25,
    Sps15,
    Sps10,
    Sps5,
}

impl DataRate {
    /// Value of the DRATE register.
    pub(crate) fn ads1256_code(self) -> u8 {
        match self {
            Self::Sps30000 => 0xf0,
            Self::Sps15000 => 0xe0,
            Self::Sps7500  => 0xd0,
            Self::Sps3750  => 0xc0,
            Self::Sps2000  => 0xb0,
            Self::Sps1000  => 0xa1,
            Self::Sps500   => 0x92,
            Self::Sps100   => 0x82,
            Self::Sps60    => 0x72,
            Self::Sps50    => 0x63,
            Self::Sps30    => 0x53,
            Self::Sps25    => 0x43,
            Self::Sps15    => 0x33,
            Self::Sps10    => 0x23,
            Self::Sps5     => 0x13,
        }
    }
}

/// One logical recording channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// SEED channel code, e.g. `HHZ`.
    pub label: String,
    /// Differential input pair passed to [`ChannelReader::select_channel`](crate::ChannelReader).
    pub index: usize,
}

impl Channel {
    pub fn new(label: &str, index: usize) -> Channel {
        Channel { label: label.to_owned(), index }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationIdentity {
    pub network: String,
    pub station: String,
    pub location: String,
}

impl Default for StationIdentity {
    fn default() -> Self {
        Self {
            network: "XX".to_owned(),
            station: "GEO".to_owned(),
            location: "00".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecorderConfiguration {
    /// Nominal sampling rate in Hz; the loop sleeps `1 / sample_rate` after each tick.
    pub sample_rate: u32,
    /// Number of samples per channel that triggers a flush.
    pub buffer_size: usize,
    pub data_dir: PathBuf,
    pub file_prefix: String,
    pub file_extension: String,
    /// Read order within a tick.
    pub channels: Vec<Channel>,
    pub station: StationIdentity,
    pub gain: Gain,
    pub data_rate: DataRate,
    pub spi_device: String,
}

impl Default for RecorderConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 100,
            buffer_size: 1000,
            data_dir: PathBuf::from("./mseed"),
            file_prefix: "geophone".to_owned(),
            file_extension: "mseed".to_owned(),
            channels: vec![
                Channel::new("HHZ", 0),
                Channel::new("HHE", 1),
                Channel::new("HHN", 2),
            ],
            station: StationIdentity::default(),
            gain: Gain::default(),
            data_rate: DataRate::default(),
            spi_device: "/dev/spidev0.0".to_owned(),
        }
    }
}

impl RecorderConfiguration {
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(1) / self.sample_rate.max(1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_configuration() {
        let config = RecorderConfiguration::default();
        assert_eq!(config.sample_period(), Duration::from_millis(10));
        let labels = config.channels.iter().map(|channel| channel.label.as_str()).collect::<Vec<_>>();
        assert_eq!(labels, ["HHZ", "HHE", "HHN"]);
        assert_eq!(config.channels.iter().map(|channel| channel.index).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(config.data_rate.ads1256_code(), 0x82);
        assert_eq!(config.gain.ads1256_code(), 0);
    }
}
