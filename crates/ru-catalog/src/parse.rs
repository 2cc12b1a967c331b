//! Scanners for catalog HTML.
//!
//! The catalog pages are not parsed as HTML. Both scanners work on lines or
//! whitespace-separated tokens and look for the fixed markup the catalog
//! emits around the values of interest.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use ru_core::{Interval, MinuteOfDay, UsageRecord, Weekday};

/// Option that precedes the department list on the index page.
const DEPARTMENT_MARKER: &str = "Select a Department";

/// Pre-compiled regex for one department option line.
static OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^<option value="([^"]*)""#).unwrap());

const CELL_OPEN: &str = "<td";
const CELL_ALIGN: &str = r#"align="left">"#;
const CELL_CLOSE: &str = "</td>";

/// Extracts department codes from the catalog index page.
///
/// Codes are read from the `<option value="...">` lines directly after the
/// `Select a Department` option, stopping at the first line that is not an
/// option.
pub fn parse_departments(html: &str) -> Vec<String> {
    html.lines()
        .skip_while(|line| !line.contains(DEPARTMENT_MARKER))
        .skip(1)
        .map_while(|line| {
            OPTION_RE
                .captures(line.trim())
                .map(|caps| caps[1].trim().to_string())
        })
        .filter(|code| !code.is_empty())
        .collect()
}

/// Why a schedule entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Skip {
    UnknownDay(String),
    BadTime(String),
    Inverted(String),
    MissingLocation,
}

/// Extracts usage records from one department's schedule page.
///
/// An entry is a left-aligned cell holding one-letter day codes and a time
/// range, followed by a left-aligned cell holding the location. The last
/// location word is the room; the words before it, joined without spaces,
/// are the building. Malformed entries are skipped.
pub fn parse_schedule(html: &str) -> Vec<UsageRecord> {
    let tokens: Vec<&str> = html.split_whitespace().collect();
    let mut scanner = Scanner {
        tokens: &tokens,
        pos: 0,
    };
    let mut records = Vec::new();

    while let Some(token) = scanner.bump() {
        if token != CELL_OPEN || scanner.peek() != Some(CELL_ALIGN) {
            continue;
        }
        scanner.pos += 1;
        match scanner.entry() {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(skip) => tracing::warn!(?skip, "skipping schedule entry"),
        }
    }

    records
}

struct Scanner<'a> {
    tokens: &'a [&'a str],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn bump(&mut self) -> Option<&'a str> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.pos).copied()
    }

    fn expect(&mut self, want: &str) -> bool {
        if self.peek() == Some(want) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reads one entry after `<td align="left">`.
    ///
    /// `Ok(None)` means the cell is not a meeting time at all; the scanner is
    /// left on the first token that did not fit so scanning can resume there.
    fn entry(&mut self) -> Result<Option<UsageRecord>, Skip> {
        let mut days = BTreeSet::new();
        let mut unknown_day = None;
        while let Some(token) = self.peek() {
            let mut chars = token.chars();
            let (Some(code), None) = (chars.next(), chars.next()) else {
                break;
            };
            match Weekday::from_code(code) {
                Some(day) => {
                    days.insert(day);
                }
                None => unknown_day = Some(token.to_string()),
            }
            self.pos += 1;
        }

        let Some(first) = self.peek() else {
            return Ok(None);
        };
        if (days.is_empty() && unknown_day.is_none()) || !is_time_token(first) {
            return Ok(None);
        }
        self.pos += 1;

        let (start, end) = if let Some((start, end)) = first.split_once('-') {
            (start, end)
        } else {
            // "9:00am - 9:50am"
            let Some(_hyphen) = self.bump() else {
                return Ok(None);
            };
            let Some(end) = self.bump() else {
                return Ok(None);
            };
            (first, end)
        };

        if let Some(day) = unknown_day {
            return Err(Skip::UnknownDay(day));
        }
        let start = MinuteOfDay::decode(start).map_err(|e| Skip::BadTime(e.to_string()))?;
        let end = MinuteOfDay::decode(end).map_err(|e| Skip::BadTime(e.to_string()))?;
        Interval::new(start, end).map_err(|e| Skip::Inverted(e.to_string()))?;

        if !(self.expect(CELL_CLOSE) && self.expect(CELL_OPEN) && self.expect(CELL_ALIGN)) {
            return Err(Skip::MissingLocation);
        }

        let mut words = Vec::new();
        loop {
            match self.bump() {
                Some(CELL_CLOSE) => break,
                Some(word) => words.push(word),
                None => return Err(Skip::MissingLocation),
            }
        }
        let Some((room, building)) = words.split_last() else {
            return Err(Skip::MissingLocation);
        };
        let building = building.concat();
        if building.is_empty() {
            return Err(Skip::MissingLocation);
        }

        Ok(Some(UsageRecord {
            building,
            room: (*room).to_string(),
            days,
            start,
            end,
        }))
    }
}

fn is_time_token(token: &str) -> bool {
    token.contains("am") || token.contains("pm")
}
