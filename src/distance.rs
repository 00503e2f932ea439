////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The last-four-distances cache, and its reconstruction from a finished
//! command sequence.
//!
//! While the search is running the cache only matters for cost estimation
//! (`symbol::distance_cache_candidate`); once a path is chosen,
//! `compute_distance_cache` walks it backward to recover the cache state an
//! entropy coder would actually see at each position, so a second pass (or a
//! caller building a bitstream) starts from the right state.

use crate::command::Command;
use crate::node::NodeArray;

/// Four most recently used backward distances, most recent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistanceCache {
    entries: [u32; 4],
}

impl Default for DistanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DistanceCache {
    /// The cache state before any command has run: Brotli's fixed initial
    /// distances.
    #[must_use]
    pub fn new() -> Self {
        DistanceCache {
            entries: [16, 15, 11, 4],
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[u32; 4] {
        &self.entries
    }

    /// Updates the cache after a copy at `distance` with the given
    /// `short_code`. A raw distance (`short_code == 0`) is pushed to the
    /// front, evicting the oldest entry. Reusing an existing entry
    /// (`short_code != 0`) moves it to the front rather than duplicating it,
    /// matching the reference format's dedup behavior.
    pub fn update(&mut self, distance: u32, short_code: u8) {
        if short_code == 0 {
            self.entries = [distance, self.entries[0], self.entries[1], self.entries[2]];
        } else {
            let index = crate::symbol::DISTANCE_CACHE_INDEX[usize::from(short_code - 1)];
            if index != 0 {
                let moved = self.entries[index];
                for slot in (1..=index).rev() {
                    self.entries[slot] = self.entries[slot - 1];
                }
                self.entries[0] = moved;
            }
        }
    }

    /// `true` if reusing this exact distance needs no short-code lookup at
    /// all because it's already the most recent entry.
    #[must_use]
    pub fn is_last_used(&self, distance: u32) -> bool {
        self.entries[0] == distance
    }
}

/// Replays `commands` from the start of a block, rebuilding the distance
/// cache at every command boundary. Returns the cache state *before* each
/// command (so index `i` is the state the search candidate for `commands[i]`
/// would have observed), plus the final state after the last command.
///
/// A dictionary match's `distance_code` encodes a distance past
/// `max_backward`; per spec.md §4.7 / §9 such commands never update the
/// cache, so they're replayed as a no-op cache transition.
#[must_use]
pub fn compute_distance_cache(commands: &[Command], max_backward: u32) -> Vec<DistanceCache> {
    let mut states = Vec::with_capacity(commands.len() + 1);
    let mut cache = DistanceCache::new();
    states.push(cache);
    for command in commands {
        if command.is_copy() {
            let short_code = if command.distance_code < 16 {
                (command.distance_code + 1) as u8
            } else {
                0
            };
            let distance = if short_code == 0 {
                command.distance_code - 15
            } else {
                cache.entries[crate::symbol::DISTANCE_CACHE_INDEX[usize::from(short_code - 1)]]
            };
            if distance <= max_backward {
                cache.update(distance, short_code);
            }
        }
        states.push(cache);
    }
    states
}

/// Reconstructs the distance cache state as of `pos`, by walking the node
/// array backward through each node's incoming command until four distinct
/// raw distances are found (or the walk runs off the start of the block).
/// Used during relaxation, where commands haven't been materialized into a
/// `Command` sequence yet — only the node array exists.
///
/// A node's distance only counts if it's a real, in-window copy: dictionary
/// matches (`distance > max_backward`) never update the rolling cache, and
/// neither does a plain continuation of the cache's own most recent entry
/// (`short_code == 1`, i.e. `distance_code == 0` — that command didn't
/// change the cache, so recording its distance again would duplicate an
/// entry instead of recovering the distinct one further back).
///
/// Unfilled slots keep the format's fixed initial distances, oldest first,
/// same as [`DistanceCache::new`].
#[must_use]
pub fn compute_distance_cache_from_nodes(
    nodes: &NodeArray,
    pos: usize,
    max_backward: u32,
    initial_cache: &DistanceCache,
) -> DistanceCache {
    let mut cache = *initial_cache;
    let mut found = [None; 4];
    let mut slot = 0;
    let mut cursor = pos;
    while cursor > 0 && slot < 4 {
        let node = nodes.get(cursor);
        if node.copy_length == 0 && node.insert_length == 0 {
            break;
        }
        let is_real_distance = node.distance > 0 && node.distance <= max_backward;
        let is_trivial_reuse = node.short_code == 1;
        if is_real_distance && !is_trivial_reuse {
            found[slot] = Some(node.distance);
            slot += 1;
        }
        let step = node.insert_length + node.copy_length;
        if step == 0 {
            break;
        }
        cursor = cursor.saturating_sub(step as usize);
    }
    for (i, distance) in found.into_iter().enumerate() {
        if let Some(distance) = distance {
            cache.entries[i] = distance;
        }
    }
    cache
}
