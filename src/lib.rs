mod sys;
mod regs;
mod config;
mod device;
mod clock;
mod buffer;
mod segment;
mod recorder;

use std::io;

#[derive(Debug)]
pub enum Error {
    NotFound,
    Io(io::Error),
    InvalidChannel(usize),
    Calibration,
    Other(Box<dyn std::error::Error + Sync + Send + 'static>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NotFound =>
                write!(f, "ADC not detected"),
            Self::Io(io_error) =>
                write!(f, "I/O error: {}", io_error),
            Self::InvalidChannel(index) =>
                write!(f, "no differential input pair for channel {}", index),
            Self::Calibration =>
                write!(f, "ADC self-calibration did not complete"),
            Self::Other(error) =>
                write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            &Self::Io(ref io_error) => Some(io_error),
            &Self::Other(ref error) => Some(error.as_ref()),
            _ => None
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(error) => error,
            Err(error) => Error::Io(error),
        }
    }
}

pub type Result<T> =
    core::result::Result<T, Error>;

pub use config::{
    Gain,
    DataRate,
    Channel,
    StationIdentity,
    RecorderConfiguration,
};

pub use device::ChannelReader;

pub type Device =
    device::Device<crate::sys::imp::SpiDriverImpl>;

pub use sys::interrupt_flag;

pub use clock::{
    next_boundary,
    segment_path,
    Clock,
    SystemClock,
};

pub use buffer::SampleBuffer;

pub use segment::{
    Trace,
    Segment,
    FlushSink,
    FileSink,
    TraceHeader,
};

pub use recorder::{
    Recorder,
    SegmentOutcome,
};
