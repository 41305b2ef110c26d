//! Offset between the local clock and the authoritative server clock.
//!
//! The offset is sampled once (`server - local` at receipt of the time
//! response) and then applied to every local reading, so all operators see
//! the same countdown regardless of local clock skew.

use chrono::DateTime;

use crate::constants::ROUND_SECONDS;
use crate::error::{Result, RoundCtlError};

/// Signed millisecond delta from the local clock to the server clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockOffset {
    millis: i64,
}

impl ClockOffset {
    pub fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Build the offset from a server timestamp and the local time it was received at.
    pub fn from_samples(server_millis: i64, local_millis: i64) -> Self {
        Self {
            millis: server_millis - local_millis,
        }
    }

    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Estimated server time for a local reading.
    pub fn server_now_millis(&self, local_millis: i64) -> i64 {
        local_millis + self.millis
    }

    /// Second within the current server minute, always in `0..60`.
    pub fn server_second(&self, local_millis: i64) -> u8 {
        second_of_minute(self.server_now_millis(local_millis))
    }
}

/// Second within the minute of a server timestamp.
pub fn second_of_minute(server_millis: i64) -> u8 {
    server_millis
        .div_euclid(1000)
        .rem_euclid(ROUND_SECONDS as i64) as u8
}

/// Server clock estimate that never runs backwards.
///
/// A re-sync may hand in an offset that puts the server behind the last
/// reading. Readings then hold at the highest value seen until the new
/// offset catches up, so a minute boundary is never crossed twice.
#[derive(Debug, Clone, Copy)]
pub struct ServerClock {
    offset: ClockOffset,
    high_water: Option<i64>,
}

impl ServerClock {
    pub fn new(offset: ClockOffset) -> Self {
        Self {
            offset,
            high_water: None,
        }
    }

    pub fn offset(&self) -> ClockOffset {
        self.offset
    }

    /// Swap in a freshly sampled offset. Returns the previous one.
    pub fn set_offset(&mut self, offset: ClockOffset) -> ClockOffset {
        std::mem::replace(&mut self.offset, offset)
    }

    pub fn now_millis(&mut self, local_millis: i64) -> i64 {
        let estimate = self.offset.server_now_millis(local_millis);
        let now = match self.high_water {
            Some(seen) => estimate.max(seen),
            None => estimate,
        };
        self.high_water = Some(now);
        now
    }

    pub fn second(&mut self, local_millis: i64) -> u8 {
        second_of_minute(self.now_millis(local_millis))
    }
}

/// Parse the backend's ISO-8601 `currentTime` into epoch milliseconds.
pub fn parse_server_time(raw: &str) -> Result<i64> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| RoundCtlError::InvalidData(format!("invalid server time '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_from_samples() {
        let offset = ClockOffset::from_samples(10_500, 10_000);
        assert_eq!(offset.millis(), 500);

        let behind = ClockOffset::from_samples(9_000, 10_000);
        assert_eq!(behind.millis(), -1_000);
    }

    #[test]
    fn test_server_second_is_local_plus_offset_mod_60() {
        let offset = ClockOffset::from_millis(7_250);
        for local in (0..600_000i64).step_by(333) {
            let expected = ((local + 7_250) / 1000 % 60) as u8;
            assert_eq!(offset.server_second(local), expected, "local={local}");
        }
    }

    #[test]
    fn test_server_second_with_negative_offset() {
        let offset = ClockOffset::from_millis(-3_000);
        // 2s local minus 3s lands one second before the minute boundary.
        assert_eq!(offset.server_second(2_000), 59);
        assert_eq!(offset.server_second(3_000), 0);
    }

    #[test]
    fn test_zero_offset_tracks_local_clock() {
        let offset = ClockOffset::from_millis(0);
        assert_eq!(offset.server_second(49_999), 49);
        assert_eq!(offset.server_second(50_000), 50);
        assert_eq!(offset.server_second(60_000), 0);
    }

    #[test]
    fn test_server_clock_holds_when_offset_moves_back() {
        let mut clock = ServerClock::new(ClockOffset::from_millis(0));
        assert_eq!(clock.second(60_500), 0);

        // New offset puts the server 2s earlier, back in the previous minute.
        let old = clock.set_offset(ClockOffset::from_millis(-2_000));
        assert_eq!(old.millis(), 0);
        assert_eq!(clock.second(61_000), 0);
        assert_eq!(clock.now_millis(61_000), 60_500);
        assert_eq!(clock.second(63_000), 1);
    }

    #[test]
    fn test_server_clock_follows_forward_offset() {
        let mut clock = ServerClock::new(ClockOffset::from_millis(0));
        assert_eq!(clock.second(58_000), 58);
        clock.set_offset(ClockOffset::from_millis(3_000));
        assert_eq!(clock.second(58_200), 1);
    }

    #[test]
    fn test_parse_server_time() {
        let millis = parse_server_time("2024-05-01T12:00:51.250Z").unwrap();
        assert_eq!(millis % 1000, 250);
        assert_eq!(ClockOffset::from_millis(0).server_second(millis), 51);

        let with_zone = parse_server_time("2024-05-01T17:30:51.250+05:30").unwrap();
        assert_eq!(with_zone, millis);
    }

    #[test]
    fn test_parse_server_time_rejects_garbage() {
        assert!(matches!(
            parse_server_time("yesterday"),
            Err(RoundCtlError::InvalidData(_))
        ));
    }
}
