////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! A fixed-capacity ring buffer of recent start positions, kept sorted by
//! `costdiff` so the relaxation step can cheaply try matches anchored a few
//! positions back without rescanning the whole node array.
//!
//! Capacity is frozen at 8: far enough back that a slightly-worse-looking
//! position a few bytes earlier still gets a chance to originate a cheaper
//! match, not so far that the per-position work grows.

/// Capacity of the start-position queue.
pub const CAPACITY: usize = 8;

/// One candidate start position and how much cheaper (or more expensive)
/// arriving there was than the literal-only cost of reaching it directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPositionEntry {
    pub pos: usize,
    /// `node[pos].cost - literal_costs_cumulative[pos]`. Smaller is better.
    pub costdiff: f32,
}

/// Ring buffer of up to [`CAPACITY`] entries, always kept sorted ascending
/// by `costdiff`.
///
/// Insertion restores sorted order with at most 3 single-element swaps
/// (`offset` vs `offset+1`, then vs `offset+2`, then vs `offset+3`, each
/// conditional on the previous swap happening) regardless of how many
/// entries are currently filled. This always performs the same bounded
/// number of comparisons rather than a variable-length insertion sort; it is
/// kept exactly as written rather than special-cased for `size() < 4`,
/// since the extra comparisons are harmless and matching the simpler,
/// uniform shape is worth more than a micro-optimization that doesn't
/// change behavior.
#[derive(Debug, Clone)]
pub struct StartPositionQueue {
    entries: [StartPositionEntry; CAPACITY],
    pushed: usize,
}

impl Default for StartPositionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl StartPositionQueue {
    #[must_use]
    pub fn new() -> Self {
        StartPositionQueue {
            entries: [StartPositionEntry {
                pos: 0,
                costdiff: 0.0,
            }; CAPACITY],
            pushed: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.pushed.min(CAPACITY)
    }

    /// Returns the `k`-th smallest entry by `costdiff` (`k = 0` is the
    /// best). `push` writes each new entry into a physical slot that cycles
    /// backward as `pushed` grows (`!pushed & 7`), so the logical index `k`
    /// has to be re-based onto that same rotation rather than read straight
    /// off the physical array — `(k - pushed) & 7`, mirroring the
    /// reference `q_[(k - idx_) & 7]`.
    #[must_use]
    pub fn at(&self, k: usize) -> StartPositionEntry {
        let physical = (k.wrapping_sub(self.pushed)) & (CAPACITY - 1);
        self.entries[physical]
    }

    pub fn clear(&mut self) {
        self.pushed = 0;
    }

    pub fn push(&mut self, entry: StartPositionEntry) {
        let offset = !self.pushed & (CAPACITY - 1);
        self.pushed += 1;
        let len = self.size();
        self.entries[offset] = entry;
        if len <= 1 {
            return;
        }

        let mut offset = offset;
        if self.entries[offset].costdiff > self.entries[(offset + 1) & 7].costdiff {
            self.entries.swap(offset, (offset + 1) & 7);
            offset = (offset + 1) & 7;
        }
        if len > 2 && self.entries[offset].costdiff > self.entries[(offset + 2) & 7].costdiff {
            self.entries.swap(offset, (offset + 2) & 7);
            offset = (offset + 2) & 7;
        }
        if len > 3 && self.entries[offset].costdiff > self.entries[(offset + 3) & 7].costdiff {
            self.entries.swap(offset, (offset + 3) & 7);
        }
    }
}
