//! The acquisition loop.
//!
//! ```text
//!             ┌──────────────────────────────────────────────┐
//!             v                                              │ rollover, read or flush failure
//!      BEGIN_SEGMENT ──> SAMPLING ──(buffer full)──> FLUSH_AND_ROLL
//!                          ^  │                          │
//!                          │  └──(one tick per period)───┤
//!                          └─────────────────────────────┘
//! ```
//!
//! The loop has no natural end; it stops only when the interrupt flag is raised.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use crate::Result;
use crate::buffer::SampleBuffer;
use crate::clock::{next_boundary, segment_path, Clock};
use crate::config::RecorderConfiguration;
use crate::device::ChannelReader;
use crate::segment::{FlushSink, Segment, Trace};

/// How a segment ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// The boundary was reached. `discarded` samples per channel were still buffered and are lost.
    Rollover { discarded: usize },
    /// The channel reader failed; everything not yet flushed is lost.
    ReadFailed,
    /// The sink failed; the samples of that flush are lost.
    FlushFailed,
    Interrupted,
}

#[derive(Debug)]
enum State {
    BeginSegment,
    Sampling(ActiveSegment),
    FlushAndRoll(ActiveSegment),
}

#[derive(Debug)]
struct ActiveSegment {
    path: PathBuf,
    boundary: DateTime<Utc>,
    start_time: DateTime<Utc>,
    buffer: SampleBuffer,
    flushes: usize,
}

#[derive(Debug)]
pub struct Recorder<R: ChannelReader, S: FlushSink, C: Clock> {
    reader: R,
    sink: S,
    clock: C,
    config: RecorderConfiguration,
    tick: Vec<i32>,
}

impl<R: ChannelReader, S: FlushSink, C: Clock> Recorder<R, S, C> {
    pub fn new(reader: R, sink: S, clock: C, config: RecorderConfiguration) -> Recorder<R, S, C> {
        let tick = Vec::with_capacity(config.channels.len());
        Recorder { reader, sink, clock, config, tick }
    }

    /// Record segment after segment until `interrupt` is raised.
    pub fn run(&mut self, interrupt: &AtomicBool) {
        log::info!("starting geophone data collection");
        loop {
            match self.run_segment(interrupt) {
                SegmentOutcome::Rollover { discarded: 0 } =>
                    log::info!("stopping segment, new hour reached"),
                SegmentOutcome::Rollover { discarded } =>
                    log::warn!("stopping segment, new hour reached; {} unflushed samples per channel dropped",
                        discarded),
                SegmentOutcome::ReadFailed | SegmentOutcome::FlushFailed =>
                    log::warn!("segment abandoned, starting a fresh one"),
                SegmentOutcome::Interrupted => {
                    log::info!("interrupted by user");
                    return
                }
            }
        }
    }

    /// Record a single segment, from computing its boundary to its end.
    pub fn run_segment(&mut self, interrupt: &AtomicBool) -> SegmentOutcome {
        let mut state = State::BeginSegment;
        loop {
            state = match state {
                State::BeginSegment =>
                    State::Sampling(self.begin_segment()),
                State::Sampling(mut segment) => {
                    // a completed tick is always flushed before the interrupt is observed
                    if interrupt.load(Ordering::SeqCst) {
                        return SegmentOutcome::Interrupted
                    }
                    if self.clock.now() >= segment.boundary {
                        // Unflushed samples are dropped here rather than written to the closing file.
                        return SegmentOutcome::Rollover { discarded: segment.buffer.len() }
                    }
                    if let Err(error) = self.sample_tick() {
                        log::error!("error reading ADC: {}", error);
                        return SegmentOutcome::ReadFailed
                    }
                    segment.buffer.push_tick(&self.tick);
                    if segment.buffer.len() >= self.config.buffer_size.max(1) {
                        State::FlushAndRoll(segment)
                    } else {
                        self.clock.sleep(self.config.sample_period());
                        State::Sampling(segment)
                    }
                }
                State::FlushAndRoll(mut segment) => {
                    if let Err(error) = self.flush(&mut segment) {
                        log::error!("error writing {}: {}", segment.path.display(), error);
                        return SegmentOutcome::FlushFailed
                    }
                    self.clock.sleep(self.config.sample_period());
                    State::Sampling(segment)
                }
            }
        }
    }

    fn begin_segment(&mut self) -> ActiveSegment {
        let start_time = self.clock.now();
        let boundary = next_boundary(start_time);
        let path = segment_path(&self.config.data_dir, &self.config.file_prefix, boundary,
            &self.config.file_extension);
        log::info!("recording geophone data -> {} until {}", path.display(), boundary.format("%H:%M:%S"));
        ActiveSegment {
            path,
            boundary,
            start_time,
            buffer: SampleBuffer::new(self.config.channels.len(), self.config.buffer_size),
            flushes: 0,
        }
    }

    /// Read every channel once, in configuration order. On error the tick is incomplete and must
    /// not reach the buffer.
    fn sample_tick(&mut self) -> Result<()> {
        self.tick.clear();
        for channel in self.config.channels.iter() {
            self.reader.select_channel(channel.index)?;
            self.tick.push(self.reader.read()?);
        }
        Ok(())
    }

    fn flush(&mut self, segment: &mut ActiveSegment) -> Result<()> {
        let traces = self.config.channels.iter()
            .zip(segment.buffer.take())
            .map(|(channel, samples)| Trace { channel: channel.label.clone(), samples })
            .collect::<Vec<_>>();
        self.sink.write(&Segment {
            path: segment.path.clone(),
            start_time: segment.start_time,
            sample_rate: self.config.sample_rate,
            station: self.config.station.clone(),
            traces,
            flush_index: segment.flushes,
        })?;
        segment.flushes += 1;
        log::info!("{} traces saved to {}",
            segment.flushes * self.config.channels.len(), segment.path.display());
        Ok(())
    }
}
