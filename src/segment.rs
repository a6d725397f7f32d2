//! Flushed waveform data and the sinks that persist it.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bytemuck::{Pod, Zeroable};
use chrono::{DateTime, Utc};

use crate::{Error, Result};
use crate::config::StationIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub channel: String,
    pub samples: Vec<i32>,
}

/// One buffer snapshot handed to a [`FlushSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// File named after the segment's rollover boundary.
    pub path: PathBuf,
    /// When the segment began. Every flush of the segment carries the same value.
    pub start_time: DateTime<Utc>,
    pub sample_rate: u32,
    pub station: StationIdentity,
    pub traces: Vec<Trace>,
    /// Number of flushes of the same segment that came before this one.
    pub flush_index: usize,
}

pub trait FlushSink {
    fn write(&mut self, segment: &Segment) -> Result<()>;
}

impl<S: FlushSink + ?Sized> FlushSink for &mut S {
    fn write(&mut self, segment: &Segment) -> Result<()> {
        (**self).write(segment)
    }
}

const TRACE_MAGIC: [u8; 4] = *b"GTR1";

/// Fixed header preceding the samples of every trace record. Multi-byte fields are little-endian.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct TraceHeader {
    magic: [u8; 4],
    network: [u8; 2],
    station: [u8; 5],
    location: [u8; 2],
    channel: [u8; 3],
    start_time_ns: i64,
    sample_rate: u32,
    sample_count: u32,
}

// Codes are space padded on the right, the same way SEED fixed headers store them.
fn code<const N: usize>(text: &str) -> [u8; N] {
    let mut field = [b' '; N];
    for (byte, &value) in field.iter_mut().zip(text.as_bytes()) {
        *byte = value;
    }
    field
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).trim_end().to_owned()
}

impl TraceHeader {
    pub fn new(segment: &Segment, trace: &Trace) -> TraceHeader {
        TraceHeader {
            magic: TRACE_MAGIC,
            network: code(&segment.station.network),
            station: code(&segment.station.station),
            location: code(&segment.station.location),
            channel: code(&trace.channel),
            start_time_ns: segment.start_time.timestamp_nanos_opt().unwrap_or(i64::MAX).to_le(),
            sample_rate: segment.sample_rate.to_le(),
            sample_count: (trace.samples.len() as u32).to_le(),
        }
    }

    pub fn network(&self) -> String { decode(&self.network) }
    pub fn station(&self) -> String { decode(&self.station) }
    pub fn location(&self) -> String { decode(&self.location) }
    pub fn channel(&self) -> String { decode(&self.channel) }

    pub fn start_time(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(i64::from_le(self.start_time_ns))
    }

    pub fn sample_rate(&self) -> u32 {
        u32::from_le(self.sample_rate)
    }

    pub fn sample_count(&self) -> usize {
        u32::from_le(self.sample_count) as usize
    }
}

/// Writes segments into per-hour trace files.
///
/// The first flush of a segment truncates the file, later flushes append, so the file always holds
/// every trace flushed by the segment that currently owns it.
#[derive(Debug, Default)]
pub struct FileSink;

impl FileSink {
    pub fn new() -> FileSink {
        FileSink
    }

    /// Parse a file written by this sink.
    pub fn read_file(path: &Path) -> Result<Vec<(TraceHeader, Vec<i32>)>> {
        let mut data = Vec::new();
        File::open(path)?.read_to_end(&mut data)?;
        let header_size = core::mem::size_of::<TraceHeader>();
        let mut records = Vec::new();
        let mut rest = &data[..];
        while !rest.is_empty() {
            let header: TraceHeader = rest.get(..header_size)
                .map(bytemuck::pod_read_unaligned)
                .ok_or_else(|| Error::Other("truncated trace header".into()))?;
            if header.magic != TRACE_MAGIC {
                return Err(Error::Other(format!("bad trace magic {:02x?}", header.magic).into()))
            }
            let body_size = header.sample_count() * 4;
            let body = rest.get(header_size..header_size + body_size)
                .ok_or_else(|| Error::Other("truncated trace samples".into()))?;
            let samples = body.chunks_exact(4)
                .map(|bytes| i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                .collect();
            records.push((header, samples));
            rest = &rest[header_size + body_size..];
        }
        Ok(records)
    }
}

impl FlushSink for FileSink {
    fn write(&mut self, segment: &Segment) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(segment.flush_index == 0)
            .append(segment.flush_index > 0)
            .open(&segment.path)?;
        let mut writer = BufWriter::new(file);
        for trace in segment.traces.iter() {
            let header = TraceHeader::new(segment, trace);
            writer.write_all(bytemuck::bytes_of(&header))?;
            let samples = trace.samples.iter().map(|sample| sample.to_le()).collect::<Vec<i32>>();
            writer.write_all(bytemuck::cast_slice(&samples))?;
        }
        writer.flush()?;
        log::debug!("wrote {} traces to {}", segment.traces.len(), segment.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;

    fn segment(path: PathBuf, flush_index: usize, offset: i32) -> Segment {
        Segment {
            path,
            start_time: Utc.with_ymd_and_hms(2024, 3, 1, 13, 20, 0).unwrap(),
            sample_rate: 100,
            station: StationIdentity::default(),
            traces: vec![
                Trace { channel: "HHZ".to_owned(), samples: vec![offset, -1, 8_388_607] },
                Trace { channel: "HHE".to_owned(), samples: vec![offset + 1, 0, -8_388_608] },
            ],
            flush_index,
        }
    }

    #[test]
    fn test_trace_header_layout() {
        assert_eq!(core::mem::size_of::<TraceHeader>(), 32);
        assert_eq!(code::<5>("GEO"), *b"GEO  ");
        assert_eq!(code::<2>("TOOLONG"), *b"TO");
    }

    #[test]
    fn test_file_sink_appends_within_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geophone_20240301_14.mseed");
        let mut sink = FileSink::new();
        sink.write(&segment(path.clone(), 0, 10)).unwrap();
        sink.write(&segment(path.clone(), 1, 20)).unwrap();

        let records = FileSink::read_file(&path).unwrap();
        assert_eq!(records.len(), 4);
        let (header, samples) = &records[2];
        assert_eq!(header.network(), "XX");
        assert_eq!(header.station(), "GEO");
        assert_eq!(header.location(), "00");
        assert_eq!(header.channel(), "HHZ");
        assert_eq!(header.sample_rate(), 100);
        assert_eq!(header.sample_count(), 3);
        assert_eq!(header.start_time(), Utc.with_ymd_and_hms(2024, 3, 1, 13, 20, 0).unwrap());
        assert_eq!(samples, &[20, -1, 8_388_607]);
        assert_eq!(records[3].1, [21, 0, -8_388_608]);
    }

    #[test]
    fn test_file_sink_new_segment_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geophone_20240301_14.mseed");
        let mut sink = FileSink::new();
        sink.write(&segment(path.clone(), 0, 10)).unwrap();
        sink.write(&segment(path.clone(), 1, 20)).unwrap();
        sink.write(&segment(path.clone(), 0, 30)).unwrap();

        let records = FileSink::read_file(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].1[0], 30);
    }

    #[test]
    fn test_file_sink_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("geophone_20240301_14.mseed");
        assert!(matches!(FileSink::new().write(&segment(path, 0, 0)), Err(Error::Io(_))));
    }
}
