//! Core domain logic for the room usage aggregator.
//!
//! This crate contains the fundamental types and logic for:
//! - Clock times: encoding and decoding `H:MMam`/`H:MMpm` minute-of-day values
//! - Intervals: closed minute ranges with a buffered overlap rule
//! - Day stores: per-room, per-weekday blocks merged on insertion
//! - The registry: building → room → weekday lookup built from usage tuples

pub mod clock;
mod day_store;
pub mod interval;
mod registry;
pub mod weekday;

pub use clock::{DecodeError, MINUTES_PER_DAY, MinuteOfDay};
pub use day_store::DayIntervalStore;
pub use interval::{BUFFER_MINUTES, Interval, InvalidInterval};
pub use registry::{Registry, RegistryError, RoomUsage, UsageBlock, UsageRecord};
pub use weekday::{InvalidWeekday, Weekday};
