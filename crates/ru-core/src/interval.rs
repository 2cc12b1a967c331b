//! Closed minute ranges and the buffered overlap rule.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::MinuteOfDay;

/// Gap, in minutes, that still counts as continuous occupancy.
///
/// Ten minutes is the standard passing time between classes, so two blocks
/// separated by at most this much are one block of use.
pub const BUFFER_MINUTES: u16 = 10;

/// Error for a range whose start comes after its end.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("start time {start} is after end time {end}")]
pub struct InvalidInterval {
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,
}

/// A closed range `[start, end]` of minutes within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: MinuteOfDay,
    end: MinuteOfDay,
}

impl Interval {
    /// The whole day, `12:00am-11:59pm`.
    pub const FULL_DAY: Self = Self {
        start: MinuteOfDay::MIDNIGHT,
        end: MinuteOfDay::LAST,
    };

    /// Creates an interval, rejecting `start > end`.
    pub const fn new(start: MinuteOfDay, end: MinuteOfDay) -> Result<Self, InvalidInterval> {
        if start.get() > end.get() {
            return Err(InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(self) -> MinuteOfDay {
        self.start
    }

    #[must_use]
    pub const fn end(self) -> MinuteOfDay {
        self.end
    }

    /// Whether the two ranges touch once each end is extended by
    /// [`BUFFER_MINUTES`]. Symmetric.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.end.get() + BUFFER_MINUTES >= other.start.get()
            && other.end.get() + BUFFER_MINUTES >= self.start.get()
    }

    /// Smallest interval covering both.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Deserialize)]
struct RawInterval {
    start: MinuteOfDay,
    end: MinuteOfDay,
}

impl TryFrom<RawInterval> for Interval {
    type Error = InvalidInterval;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

#[cfg(test)]
pub(crate) fn iv(start: u32, end: u32) -> Interval {
    Interval::new(
        MinuteOfDay::new(start).unwrap(),
        MinuteOfDay::new(end).unwrap(),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inverted_range() {
        let start = MinuteOfDay::new(600).unwrap();
        let end = MinuteOfDay::new(540).unwrap();
        assert_eq!(Interval::new(start, end), Err(InvalidInterval { start, end }));
        assert!(Interval::new(start, start).is_ok());
    }

    #[test]
    fn overlap_within_buffer() {
        assert!(iv(540, 600).overlaps(iv(610, 660)));
        assert!(iv(610, 660).overlaps(iv(540, 600)));
        assert!(!iv(540, 600).overlaps(iv(611, 660)));
        assert!(!iv(540, 600).overlaps(iv(700, 740)));
    }

    #[test]
    fn overlap_nested_and_identical() {
        assert!(iv(540, 700).overlaps(iv(600, 610)));
        assert!(iv(600, 610).overlaps(iv(540, 700)));
        assert!(iv(540, 600).overlaps(iv(540, 600)));
    }

    #[test]
    fn overlap_is_symmetric() {
        let samples = [
            iv(0, 0),
            iv(0, 100),
            iv(95, 105),
            iv(110, 120),
            iv(121, 130),
            iv(540, 660),
            iv(1430, 1439),
            iv(0, 1439),
        ];
        for a in samples {
            for b in samples {
                assert_eq!(a.overlaps(b), b.overlaps(a), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn overlap_at_end_of_day_does_not_overflow() {
        assert!(iv(1439, 1439).overlaps(iv(1430, 1430)));
        assert!(!iv(1439, 1439).overlaps(iv(1420, 1428)));
    }

    #[test]
    fn merge_takes_hull() {
        assert_eq!(iv(540, 600).merge(iv(610, 660)), iv(540, 660));
        assert_eq!(iv(610, 660).merge(iv(540, 600)), iv(540, 660));
        assert_eq!(iv(500, 700).merge(iv(600, 610)), iv(500, 700));
    }

    #[test]
    fn display_uses_clock_times() {
        assert_eq!(iv(540, 660).to_string(), "9:00am-11:00am");
        assert_eq!(Interval::FULL_DAY.to_string(), "12:00am-11:59pm");
    }

    #[test]
    fn serde_validates_order() {
        let json = serde_json::to_string(&iv(540, 660)).unwrap();
        assert_eq!(json, r#"{"start":540,"end":660}"#);
        let parsed: Interval = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, iv(540, 660));
        assert!(serde_json::from_str::<Interval>(r#"{"start":660,"end":540}"#).is_err());
    }
}
