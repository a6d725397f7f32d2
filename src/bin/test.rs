use geophone::{ChannelReader, RecorderConfiguration};

const TICK_COUNT: usize = 16;

fn main() -> geophone::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = RecorderConfiguration::default();
    geophone::Device::with(&config, |device| {
        println!("status: {:?}", device.read_status()?);
        for tick in 0..TICK_COUNT {
            let mut line = format!("{:3}:", tick);
            for channel in config.channels.iter() {
                device.select_channel(channel.index)?;
                line += &format!(" {}={:+9}", channel.label, device.read()?);
            }
            println!("{}", line);
            std::thread::sleep(config.sample_period());
        }
        Ok(())
    })
}
