//! Class-day buckets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A weekday on which classes meet. Sunday is not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    /// All weekdays, starting with Monday.
    pub const ALL: [Self; 6] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
    ];

    /// Full English name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
        }
    }

    /// One-letter code used by course schedules (`R` is Thursday).
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Monday => 'M',
            Self::Tuesday => 'T',
            Self::Wednesday => 'W',
            Self::Thursday => 'R',
            Self::Friday => 'F',
            Self::Saturday => 'S',
        }
    }

    /// Looks up a weekday by its one-letter schedule code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(Self::Monday),
            'T' => Some(Self::Tuesday),
            'W' => Some(Self::Wednesday),
            'R' => Some(Self::Thursday),
            'F' => Some(Self::Friday),
            'S' => Some(Self::Saturday),
            _ => None,
        }
    }

    /// Zero-based position, Monday first.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a day token that is not one of the six class days.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0} is not a valid day, expected one of {codes}", codes = day_codes())]
pub struct InvalidWeekday(pub String);

fn day_codes() -> String {
    Weekday::ALL
        .iter()
        .map(|day| day.code().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for Weekday {
    type Err = InvalidWeekday;

    /// Accepts a one-letter code (`M`, `T`, `W`, `R`, `F`, `S`) or a full
    /// English name in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(code), None) = (chars.next(), chars.next()) {
            if let Some(day) = Self::from_code(code) {
                return Ok(day);
            }
        }
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| InvalidWeekday(s.to_string()))
    }
}

impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
