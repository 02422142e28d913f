//! Time sources for record timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::types::Timestamp;

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hands out strictly increasing timestamps.
///
/// When the clock has not advanced since the previous call (coarse clocks,
/// a clock stepped backwards), the next timestamp is the previous one plus
/// one microsecond.
pub struct TimestampSequence<C> {
    clock: C,
    last: Mutex<Option<DateTime<Utc>>>,
}

impl<C: Clock> TimestampSequence<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            last: Mutex::new(None),
        }
    }

    /// The underlying clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// The next timestamp in the sequence.
    pub fn next(&self) -> Timestamp {
        let now = self.clock.now();
        // A poisoned guard still holds a valid instant.
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let issued = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(issued);
        Timestamp::from_datetime(issued)
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Frozen(DateTime<Utc>);

    impl Clock for Frozen {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn test_frozen_clock_still_increases() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let seq = TimestampSequence::new(Frozen(at));

        let a = seq.next();
        let b = seq.next();
        let c = seq.next();
        assert_eq!(a.as_str(), "2024-06-01T12:00:00.000000Z");
        assert_eq!(b.as_str(), "2024-06-01T12:00:00.000001Z");
        assert!(a < b && b < c);
    }

    #[test]
    fn test_system_clock_sequence_is_strict() {
        let seq = TimestampSequence::new(SystemClock);
        let stamps: Vec<Timestamp> = (0..100).map(|_| seq.next()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }
}
