use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;

use crate::{Error, Result};

const ID_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Wall clock that never repeats or goes backwards within a process.
///
/// Every tick is strictly greater than the previous one, so timestamps and the
/// time component of generated IDs are unique per store instance.
#[derive(Debug, Default)]
pub struct Clock {
    last_millis: AtomicI64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current unix time in milliseconds, bumped past the last tick.
    pub fn tick(&self) -> i64 {
        let wall = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::SeqCst);
        loop {
            let next = wall.max(last.saturating_add(1));
            match self
                .last_millis
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Formats unix milliseconds as an ISO-8601 UTC timestamp, e.g. `2026-10-18T12:00:00.000Z`.
pub fn format_timestamp(millis: i64) -> Result<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| Error::Internal(format!("timestamp out of range: {}", millis)))
}

pub fn parse_timestamp(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Builds a document ID from a clock tick and a random base-36 suffix.
///
/// Uniqueness is only as strong as the clock tick plus nine random characters.
pub fn generate_id<R: Rng + ?Sized>(millis: i64, rng: &mut R) -> String {
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect();
    format!("{}-{}", millis, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_strictly_increase() {
        let clock = Clock::new();
        let mut prev = clock.tick();
        for _ in 0..1000 {
            let next = clock.tick();
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn test_tick_follows_wall_clock() {
        let clock = Clock::new();
        let before = Utc::now().timestamp_millis();
        let tick = clock.tick();
        assert!(tick >= before);
        assert!(tick - Utc::now().timestamp_millis() < 1_000);
    }

    #[test]
    fn test_timestamp_format_round_trip() {
        let formatted = format_timestamp(1_700_000_000_123).unwrap();
        assert_eq!(formatted, "2023-11-14T22:13:20.123Z");
        assert_eq!(parse_timestamp(&formatted), Some(1_700_000_000_123));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_generate_id_shape() {
        let id = generate_id(42, &mut rand::thread_rng());
        let (millis, suffix) = id.split_once('-').unwrap();
        assert_eq!(millis, "42");
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }
}
