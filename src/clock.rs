//! Wall clock access and the hourly file boundary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: i64 = 3600;

/// Start of the next whole hour strictly after `now`.
///
/// If `now` is exactly on the hour, the result is one hour later, never `now` itself.
pub fn next_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour_start = now.timestamp().div_euclid(SECONDS_PER_HOUR) * SECONDS_PER_HOUR;
    DateTime::from_timestamp(hour_start + SECONDS_PER_HOUR, 0)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Output file for the segment closing at `boundary`: `<data_dir>/<prefix>_<YYYYMMDD_HH>.<ext>`.
///
/// Files are named after the hour at which they close, not the hour in which they start.
pub fn segment_path(data_dir: &Path, prefix: &str, boundary: DateTime<Utc>, extension: &str) -> PathBuf {
    data_dir.join(format!("{}_{}.{}", prefix, boundary.format("%Y%m%d_%H"), extension))
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeDelta, TimeZone, Timelike};

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_next_boundary_mid_hour() {
        assert_eq!(next_boundary(at(13, 59, 58)), at(14, 0, 0));
        assert_eq!(next_boundary(at(13, 0, 1)), at(14, 0, 0));
    }

    #[test]
    fn test_next_boundary_on_the_hour() {
        assert_eq!(next_boundary(at(14, 0, 0)), at(15, 0, 0));
        let just_after = at(14, 0, 0) + TimeDelta::nanoseconds(1);
        assert_eq!(next_boundary(just_after), at(15, 0, 0));
    }

    #[test]
    fn test_next_boundary_crosses_midnight() {
        assert_eq!(next_boundary(at(23, 30, 0)), Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_next_boundary_is_smallest_hour_mark_after() {
        let mut now = at(0, 0, 0) - TimeDelta::milliseconds(250);
        for _ in 0..2000 {
            let boundary = next_boundary(now);
            assert!(boundary > now);
            assert_eq!((boundary.minute(), boundary.second(), boundary.nanosecond()), (0, 0, 0));
            assert!(boundary - now <= TimeDelta::hours(1));
            assert_eq!(next_boundary(now), boundary);
            now += TimeDelta::milliseconds(7_919);
        }
    }

    #[test]
    fn test_segment_path() {
        let path = segment_path(Path::new("./mseed"), "geophone", at(14, 0, 0), "mseed");
        assert_eq!(path, Path::new("./mseed/geophone_20240301_14.mseed"));
    }
}
