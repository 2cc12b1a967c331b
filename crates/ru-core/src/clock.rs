//! Minute-of-day values and the 12-hour clock codec.
//!
//! Times are naive: no date, no timezone. `0` is `12:00am` and `1439` is
//! `11:59pm`. The textual form is `H:MMam` / `H:MMpm` with the hour in 1–12.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of minutes in a day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

const MINUTES_PER_HOUR: u16 = 60;
const HALF_DAY: u16 = 12 * MINUTES_PER_HOUR;

/// Errors produced while decoding a clock time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text does not end with `am` or `pm`.
    #[error("missing am/pm marker in {input:?}")]
    MissingMeridiem { input: String },

    /// The text has no `:` between hour and minute.
    #[error("missing ':' separator in {input:?}")]
    MissingSeparator { input: String },

    /// The hour is not a number in 1–12.
    #[error("invalid hour in {input:?}, expected 1-12")]
    InvalidHour { input: String },

    /// The minute is not a number in 0–59.
    #[error("invalid minute in {input:?}, expected 00-59")]
    InvalidMinute { input: String },

    /// A raw minute-of-day value past the end of the day.
    #[error("minute of day {value} is outside 0-1439")]
    OutOfRange { value: u32 },
}

/// A clock time expressed as minutes since midnight, in `0..=1439`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u16")]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    /// `12:00am`.
    pub const MIDNIGHT: Self = Self(0);

    /// `12:00pm`.
    pub const NOON: Self = Self(HALF_DAY);

    /// `11:59pm`, the last minute of the day.
    pub const LAST: Self = Self(MINUTES_PER_DAY - 1);

    /// Creates a minute-of-day, rejecting values past `1439`.
    pub fn new(value: u32) -> Result<Self, DecodeError> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v < MINUTES_PER_DAY)
            .map(Self)
            .ok_or(DecodeError::OutOfRange { value })
    }

    /// Returns the raw number of minutes since midnight.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Encodes this time as `H:MMam` / `H:MMpm`.
    #[must_use]
    pub fn encode(self) -> String {
        self.to_string()
    }

    /// Decodes `H:MMam` / `H:MMpm`. Surrounding whitespace is ignored; the
    /// marker must be lowercase and directly follow the minutes.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let trimmed = text.trim();
        let (clock, pm) = if let Some(rest) = trimmed.strip_suffix("am") {
            (rest, false)
        } else if let Some(rest) = trimmed.strip_suffix("pm") {
            (rest, true)
        } else {
            return Err(DecodeError::MissingMeridiem {
                input: text.to_string(),
            });
        };

        let Some((hour, minute)) = clock.split_once(':') else {
            return Err(DecodeError::MissingSeparator {
                input: text.to_string(),
            });
        };

        let hour: u16 = hour
            .parse()
            .ok()
            .filter(|h| (1..=12).contains(h))
            .ok_or_else(|| DecodeError::InvalidHour {
                input: text.to_string(),
            })?;
        let minute: u16 = minute
            .parse()
            .ok()
            .filter(|m| *m < MINUTES_PER_HOUR)
            .ok_or_else(|| DecodeError::InvalidMinute {
                input: text.to_string(),
            })?;

        // 12am is the first hour of the day, 12pm the first hour after noon
        let hour = hour % 12;
        let offset = if pm { HALF_DAY } else { 0 };
        Ok(Self(offset + hour * MINUTES_PER_HOUR + minute))
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hour = self.0 / MINUTES_PER_HOUR;
        let minute = self.0 % MINUTES_PER_HOUR;
        let meridiem = if self.0 < HALF_DAY { "am" } else { "pm" };
        let hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{hour}:{minute:02}{meridiem}")
    }
}

impl FromStr for MinuteOfDay {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<u32> for MinuteOfDay {
    type Error = DecodeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MinuteOfDay> for u16 {
    fn from(minute: MinuteOfDay) -> Self {
        minute.0
    }
}
