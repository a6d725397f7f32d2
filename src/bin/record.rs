use std::path::PathBuf;

use geophone::{Channel, FileSink, Recorder, RecorderConfiguration, StationIdentity, SystemClock};

const SAMPLE_RATE: u32 = 100;
const BUFFER_SIZE: usize = 1000;
const DATA_DIR: &str = "./mseed";
const FILE_PREFIX: &str = "geophone";
const FILE_EXTENSION: &str = "mseed";
const CHANNELS: [&str; 3] = ["HHZ", "HHE", "HHN"];
const SPI_DEVICE: &str = "/dev/spidev0.0";

fn main() -> geophone::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RecorderConfiguration {
        sample_rate: SAMPLE_RATE,
        buffer_size: BUFFER_SIZE,
        data_dir: PathBuf::from(DATA_DIR),
        file_prefix: FILE_PREFIX.to_owned(),
        file_extension: FILE_EXTENSION.to_owned(),
        channels: CHANNELS.iter().enumerate()
            .map(|(index, label)| Channel::new(label, index))
            .collect(),
        station: StationIdentity::default(),
        spi_device: SPI_DEVICE.to_owned(),
        ..Default::default()
    };
    std::fs::create_dir_all(&config.data_dir)?;
    let interrupt = geophone::interrupt_flag()?;

    geophone::Device::with(&config, |device| {
        let mut recorder = Recorder::new(device, FileSink::new(), SystemClock, config.clone());
        recorder.run(interrupt);
        Ok(())
    })
}
