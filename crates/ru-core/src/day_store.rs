//! Per-day interval storage with merge-on-insert.
//!
//! A [`DayIntervalStore`] holds the occupancy blocks of one room on one
//! weekday. After every insertion the blocks are sorted by start time and no
//! two of them overlap under the buffered rule in [`Interval::overlaps`].
//!
//! # Algorithm
//!
//! Inserting a block repeatedly absorbs any stored block that overlaps it,
//! widening the pending block to the hull of both and removing the absorbed
//! one. A widened block can reach neighbours the incoming one could not, so the
//! scan restarts after each absorption. Every absorption removes one stored
//! block, which bounds the loop by the store's size. When nothing overlaps,
//! the pending block is placed at its sorted position.

use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// Sorted, mutually non-overlapping occupancy blocks for one room and day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Interval>", into = "Vec<Interval>")]
pub struct DayIntervalStore {
    intervals: Vec<Interval>,
}

impl DayIntervalStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            intervals: Vec::new(),
        }
    }

    /// Adds a block of use, merging it with every block it touches.
    pub fn insert(&mut self, interval: Interval) {
        let mut pending = interval;
        while let Some(idx) = self.intervals.iter().position(|old| old.overlaps(pending)) {
            let old = self.intervals.remove(idx);
            tracing::trace!(%old, %pending, "absorbing overlapping block");
            pending = old.merge(pending);
        }

        let at = self
            .intervals
            .partition_point(|existing| existing.start() < pending.start());
        self.intervals.insert(at, pending);
        debug_assert!(self.is_normalized());
    }

    /// Returns every stored block that overlaps `range`, in start order.
    ///
    /// Blocks are reported whole, not clipped to `range`.
    #[must_use]
    pub fn query(&self, range: Interval) -> Vec<Interval> {
        self.intervals
            .iter()
            .copied()
            .filter(|stored| stored.overlaps(range))
            .collect()
    }

    /// All stored blocks in start order.
    #[must_use]
    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn iter(&self) -> impl Iterator<Item = Interval> + '_ {
        self.intervals.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    fn is_normalized(&self) -> bool {
        self.intervals
            .windows(2)
            .all(|pair| pair[0].start() < pair[1].start() && !pair[0].overlaps(pair[1]))
    }
}

impl FromIterator<Interval> for DayIntervalStore {
    fn from_iter<I: IntoIterator<Item = Interval>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl Extend<Interval> for DayIntervalStore {
    fn extend<I: IntoIterator<Item = Interval>>(&mut self, iter: I) {
        for interval in iter {
            self.insert(interval);
        }
    }
}

impl From<Vec<Interval>> for DayIntervalStore {
    fn from(intervals: Vec<Interval>) -> Self {
        intervals.into_iter().collect()
    }
}

impl From<DayIntervalStore> for Vec<Interval> {
    fn from(store: DayIntervalStore) -> Self {
        store.intervals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::iv;

    fn store_of(intervals: &[Interval]) -> DayIntervalStore {
        intervals.iter().copied().collect()
    }

    #[test]
    fn merges_blocks_within_buffer() {
        let store = store_of(&[iv(540, 600), iv(610, 660)]);
        assert_eq!(store.intervals(), &[iv(540, 660)]);
    }

    #[test]
    fn keeps_blocks_separated_by_a_real_gap() {
        let store = store_of(&[iv(540, 600), iv(700, 740)]);
        assert_eq!(store.intervals(), &[iv(540, 600), iv(700, 740)]);
    }

    #[test]
    fn absorbs_multiple_blocks_at_once() {
        let store = store_of(&[iv(540, 560), iv(700, 720), iv(565, 695)]);
        assert_eq!(store.intervals(), &[iv(540, 720)]);
    }

    #[test]
    fn widened_block_chains_into_distant_neighbours() {
        // Each gap is 15 minutes until the bridge fills the middle one.
        let mut store = store_of(&[iv(100, 120), iv(135, 150), iv(165, 180), iv(195, 200)]);
        assert_eq!(store.len(), 4);
        store.insert(iv(118, 190));
        assert_eq!(store.intervals(), &[iv(100, 200)]);
    }

    #[test]
    fn keeps_start_order_regardless_of_insertion_order() {
        let store = store_of(&[iv(900, 950), iv(100, 150), iv(500, 550), iv(300, 350)]);
        assert_eq!(
            store.intervals(),
            &[iv(100, 150), iv(300, 350), iv(500, 550), iv(900, 950)]
        );
    }

    #[test]
    fn inserting_twice_is_idempotent() {
        let mut store = store_of(&[iv(540, 600), iv(700, 740)]);
        let before = store.clone();
        store.insert(iv(540, 600));
        assert_eq!(store, before);
        store.insert(iv(550, 590));
        assert_eq!(store, before);
    }

    #[test]
    fn invariant_holds_after_every_insert() {
        // Deterministic pseudo-random blocks covering many overlap shapes.
        let mut seed: u32 = 0x2545_f491;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed
        };

        for _ in 0..50 {
            let mut store = DayIntervalStore::new();
            let mut inserted = Vec::new();
            for _ in 0..40 {
                let start = next() % 1400;
                let end = (start + next() % 60).min(1439);
                let block = iv(start, end);
                store.insert(block);
                inserted.push(block);

                assert!(store.is_normalized(), "not normalized: {store:?}");
                // Every inserted block must be covered by some stored block.
                for b in &inserted {
                    assert!(
                        store
                            .iter()
                            .any(|s| s.start() <= b.start() && b.end() <= s.end()),
                        "{b} lost from {store:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn query_returns_whole_overlapping_blocks() {
        let store = store_of(&[iv(540, 660)]);
        assert_eq!(store.query(iv(550, 560)), vec![iv(540, 660)]);
        assert_eq!(store.query(iv(0, 100)), Vec::<Interval>::new());
    }

    #[test]
    fn query_uses_buffer_at_edges() {
        let store = store_of(&[iv(540, 600), iv(800, 900)]);
        assert_eq!(store.query(iv(610, 700)), vec![iv(540, 600)]);
        assert_eq!(store.query(iv(611, 789)), Vec::<Interval>::new());
        assert_eq!(store.query(iv(611, 790)), vec![iv(800, 900)]);
    }

    #[test]
    fn full_day_query_returns_everything() {
        let store = store_of(&[iv(100, 150), iv(300, 350), iv(1400, 1439)]);
        assert_eq!(store.query(Interval::FULL_DAY), store.intervals().to_vec());
    }

    #[test]
    fn serde_renormalizes_on_load() {
        let json = r#"[{"start":610,"end":660},{"start":540,"end":600},{"start":900,"end":950}]"#;
        let store: DayIntervalStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.intervals(), &[iv(540, 660), iv(900, 950)]);

        let out = serde_json::to_string(&store).unwrap();
        assert_eq!(
            out,
            r#"[{"start":540,"end":660},{"start":900,"end":950}]"#
        );
    }
}
