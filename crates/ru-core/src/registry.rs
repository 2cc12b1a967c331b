//! Building → room → weekday lookup of occupancy blocks.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::MinuteOfDay;
use crate::day_store::DayIntervalStore;
use crate::interval::{Interval, InvalidInterval};
use crate::weekday::Weekday;

/// Registry lookup and insertion errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The usage block ended before it started.
    #[error(transparent)]
    InvalidInterval(#[from] InvalidInterval),

    /// No building with this name.
    #[error("{0} is not a building")]
    UnknownBuilding(String),

    /// The building exists but has no such room.
    #[error("{room} is not a room in {building}")]
    UnknownRoom { building: String, room: String },
}

/// One observed use of a room: the ingestion tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub building: String,
    pub room: String,
    pub days: BTreeSet<Weekday>,
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,
}

/// Occupancy of one room, one store per weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomUsage {
    days: [DayIntervalStore; 6],
}

impl RoomUsage {
    #[must_use]
    pub const fn day(&self, day: Weekday) -> &DayIntervalStore {
        &self.days[day.index()]
    }

    const fn day_mut(&mut self, day: Weekday) -> &mut DayIntervalStore {
        &mut self.days[day.index()]
    }

    /// Every weekday paired with its store, Monday first.
    pub fn days(&self) -> impl Iterator<Item = (Weekday, &DayIntervalStore)> {
        Weekday::ALL.into_iter().zip(self.days.iter())
    }

    /// Total number of stored blocks across the week.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.days.iter().map(DayIntervalStore::len).sum()
    }
}

/// A stored block with its full location, as yielded by [`Registry::blocks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageBlock<'a> {
    pub building: &'a str,
    pub room: &'a str,
    pub day: Weekday,
    pub interval: Interval,
}

/// All known buildings and rooms with their weekly occupancy.
///
/// Built by feeding usage tuples through [`Registry::insert_usage`] (or
/// [`Registry::apply`]); the result does not depend on the order of the
/// tuples. Names are case-sensitive and listed in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    buildings: BTreeMap<String, BTreeMap<String, RoomUsage>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `room` in `building` is used from `start` to `end` on
    /// each of `days`.
    ///
    /// Fails without touching the registry if `start > end`. An empty day set
    /// records nothing.
    pub fn insert_usage(
        &mut self,
        building: &str,
        room: &str,
        days: impl IntoIterator<Item = Weekday>,
        start: MinuteOfDay,
        end: MinuteOfDay,
    ) -> Result<(), RegistryError> {
        let interval = Interval::new(start, end)?;
        let mut days = days.into_iter().peekable();
        if days.peek().is_none() {
            return Ok(());
        }

        let usage = self.room_entry(building, room);
        for day in days {
            usage.day_mut(day).insert(interval);
        }
        Ok(())
    }

    /// Inserts one usage tuple.
    pub fn apply(&mut self, record: &UsageRecord) -> Result<(), RegistryError> {
        self.insert_usage(
            &record.building,
            &record.room,
            record.days.iter().copied(),
            record.start,
            record.end,
        )
    }

    /// Replaces the store for one room and day with `intervals`, normalized
    /// through the same merge rule as [`Registry::insert_usage`].
    ///
    /// Used to restore a saved snapshot.
    pub fn restore_day(
        &mut self,
        building: &str,
        room: &str,
        day: Weekday,
        intervals: impl IntoIterator<Item = Interval>,
    ) {
        *self.room_entry(building, room).day_mut(day) = intervals.into_iter().collect();
    }

    /// All building names, sorted.
    #[must_use]
    pub fn list_buildings(&self) -> Vec<String> {
        self.buildings.keys().cloned().collect()
    }

    /// All room names in `building`, sorted.
    pub fn list_rooms(&self, building: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.building(building)?.keys().cloned().collect())
    }

    /// Looks up one room's weekly usage.
    pub fn room(&self, building: &str, room: &str) -> Result<&RoomUsage, RegistryError> {
        self.building(building)?
            .get(room)
            .ok_or_else(|| RegistryError::UnknownRoom {
                building: building.to_string(),
                room: room.to_string(),
            })
    }

    /// Blocks of use for one room and day that overlap `range`.
    pub fn query_usage(
        &self,
        building: &str,
        room: &str,
        day: Weekday,
        range: Interval,
    ) -> Result<Vec<Interval>, RegistryError> {
        Ok(self.room(building, room)?.day(day).query(range))
    }

    pub fn contains_building(&self, building: &str) -> bool {
        self.buildings.contains_key(building)
    }

    /// Every stored block, ordered by building, room, weekday, then start.
    pub fn blocks(&self) -> impl Iterator<Item = UsageBlock<'_>> {
        self.buildings.iter().flat_map(|(building, rooms)| {
            rooms.iter().flat_map(move |(room, usage)| {
                usage.days().flat_map(move |(day, store)| {
                    store.iter().map(move |interval| UsageBlock {
                        building,
                        room,
                        day,
                        interval,
                    })
                })
            })
        })
    }

    #[must_use]
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.buildings.values().map(BTreeMap::len).sum()
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.buildings
            .values()
            .flat_map(BTreeMap::values)
            .map(RoomUsage::block_count)
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    fn building(&self, building: &str) -> Result<&BTreeMap<String, RoomUsage>, RegistryError> {
        self.buildings
            .get(building)
            .ok_or_else(|| RegistryError::UnknownBuilding(building.to_string()))
    }

    fn room_entry(&mut self, building: &str, room: &str) -> &mut RoomUsage {
        self.buildings
            .entry(building.to_string())
            .or_default()
            .entry(room.to_string())
            .or_default()
    }
}
