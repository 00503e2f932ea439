////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The block driver: the one-pass (quality 10) and two-pass (quality 11)
//! orchestration around the per-position relaxation loop.
//!
//! This is the crate's only public entry point. Everything else is a
//! building block the driver assembles.

use crate::command::Command;
use crate::cost::CostModel;
use crate::distance::DistanceCache;
use crate::matcher::{CandidateMatch, Matcher};
use crate::node::NodeArray;
use crate::queue::StartPositionQueue;
use crate::relax;
use crate::symbol::DEFAULT_NUM_DISTANCE_SYMBOLS;

/// Quality tier. Quality 10 runs the search once, against a literal-cost-only
/// model. Quality 11 runs it twice, rebuilding the cost model from the first
/// pass's own command histogram before the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Q10,
    Q11,
}

/// A match at least this long is taken as the position's sole candidate
/// rather than explored alongside every shorter alternative (spec.md §4.3
/// step 3 / §4.6): quality 11 searches deeper before making that call.
fn max_zopfli_len(quality: Quality) -> usize {
    match quality {
        Quality::Q10 => 150,
        Quality::Q11 => 325,
    }
}

/// The whole block's fresh-match candidates, pre-scanned once up front
/// (spec.md §4.6) instead of asking the matcher again at every position
/// during relaxation.
///
/// Any position whose best match exceeds `max_zopfli_len` is collapsed to
/// that one match; the positions its copy covers are zero-filled (never
/// themselves probed as match origins) and fed to the matcher's
/// `store_range` so later positions can still match back into them
/// (spec.md §8 scenario 4).
struct MatchTable {
    candidates: Vec<CandidateMatch>,
    offsets: Vec<usize>,
    counts: Vec<usize>,
}

impl MatchTable {
    fn build<M: Matcher>(
        data: &[u8],
        matcher: &mut M,
        max_backward: u32,
        max_zopfli_len: usize,
    ) -> Self {
        let block_len = data.len();
        let mut candidates = Vec::new();
        let mut offsets = vec![0usize; block_len];
        let mut counts = vec![0usize; block_len];

        let mut pos = 0usize;
        while pos < block_len {
            let found: Vec<CandidateMatch> = matcher
                .find_matches(pos, max_backward, block_len - pos)
                .to_vec();
            let longest = found.iter().map(|c| c.length as usize).max().unwrap_or(0);
            let lookahead_end = (pos + M::STORE_LOOKAHEAD).min(block_len);

            if longest > max_zopfli_len {
                let best = *found.iter().max_by_key(|c| c.length).expect(
                    "longest > 0 implies at least one candidate produced that length",
                );
                offsets[pos] = candidates.len();
                counts[pos] = 1;
                candidates.push(best);

                matcher.store_range(pos, lookahead_end);
                let match_end = (pos + longest).min(block_len);
                if match_end > lookahead_end {
                    matcher.store_range(lookahead_end, match_end);
                }
                // Positions pos+1..match_end are never themselves probed;
                // their `counts` stay at the zero-fill default.
                pos = (pos + 1).max(match_end);
                continue;
            }

            offsets[pos] = candidates.len();
            counts[pos] = found.len();
            candidates.extend(found);
            matcher.store_range(pos, lookahead_end);
            pos += 1;
        }

        MatchTable {
            candidates,
            offsets,
            counts,
        }
    }

    fn at(&self, pos: usize) -> &[CandidateMatch] {
        if pos >= self.counts.len() {
            return &[];
        }
        &self.candidates[self.offsets[pos]..self.offsets[pos] + self.counts[pos]]
    }
}

fn cumulative_literal_costs(literal_costs: &[f32]) -> Vec<f32> {
    let mut cumsum = Vec::with_capacity(literal_costs.len() + 1);
    let mut running = 0.0;
    cumsum.push(running);
    for &cost in literal_costs {
        running += cost;
        cumsum.push(running);
    }
    cumsum
}

/// Ensures the block's last position is always reachable, even when no copy
/// lands exactly there: scans every already-finalized node for the cheapest
/// way to close the block with one trailing insert-only command.
///
/// Needed because the start-position queue only remembers the last 8
/// sources; without this, a block whose final bytes are never the target of
/// a copy (common right after a very long match, or in incompressible
/// trailing data) could leave `nodes[block_len]` unreached.
fn finalize_tail(
    nodes: &mut NodeArray,
    cost_model: &CostModel,
    literal_cost_cumsum: &[f32],
    block_len: usize,
) {
    for pos in 0..block_len {
        let source_cost = nodes.get(pos).cost;
        if !source_cost.is_finite() {
            continue;
        }
        let insert_length = (block_len - pos) as u32;
        let inscode = crate::symbol::insert_length_code(insert_length);
        let literal_cost = literal_cost_cumsum[block_len] - literal_cost_cumsum[pos];
        let total_cost = source_cost + literal_cost + cost_model.insert_only_cost(inscode);
        nodes.relax(
            block_len,
            crate::node::Node {
                insert_length,
                copy_length: 0,
                distance: 0,
                short_code: 0,
                length_code_modifier: 0,
                cost: total_cost,
            },
        );
    }
}

/// Runs the shortest-path search once against `cost_model` and returns the
/// resulting node array.
///
/// `initial_dist_cache` is the last-four-distances state the caller's
/// previous block (if any) left behind; candidates anchored all the way
/// back to position 0 resolve their last-distance short codes against it
/// instead of the format's fixed startup defaults. `quality` selects the
/// `max_zopfli_len` threshold the match table and relaxation step apply
/// (spec.md §4.6).
///
/// # Errors
///
/// Returns [`crate::Error::OutOfMemory`] if the node array can't be
/// allocated.
pub fn compute_shortest_path<M: Matcher>(
    data: &[u8],
    cost_model: &CostModel,
    matcher: &mut M,
    max_backward: u32,
    initial_dist_cache: &DistanceCache,
    quality: Quality,
) -> crate::Result<NodeArray> {
    let block_len = data.len();
    let mut nodes = NodeArray::try_new(block_len)?;
    if block_len == 0 {
        return Ok(nodes);
    }

    let max_zopfli_len = max_zopfli_len(quality);
    let match_table = MatchTable::build(data, matcher, max_backward, max_zopfli_len);

    let mut queue = StartPositionQueue::new();
    let literal_cost_cumsum = cumulative_literal_costs(cost_model.literal_costs());

    for pos in 0..block_len {
        relax::update_nodes(
            data,
            pos,
            &literal_cost_cumsum,
            &mut nodes,
            cost_model,
            &mut queue,
            match_table.at(pos),
            max_backward,
            max_zopfli_len,
            initial_dist_cache,
        );
    }

    finalize_tail(&mut nodes, cost_model, &literal_cost_cumsum, block_len);
    Ok(nodes)
}

/// Reconstructs the cheapest `Command` sequence found by
/// [`compute_shortest_path`], threading `dist_cache` forward through every
/// real copy and folding `last_insert_len` into the first command. Returns
/// the commands and the total number of literal bytes they cover.
#[must_use]
pub fn create_commands(
    nodes: &NodeArray,
    max_backward: u32,
    dist_cache: &mut DistanceCache,
    last_insert_len: u32,
) -> (Vec<Command>, u32) {
    crate::reconstruct::create_commands(nodes, max_backward, dist_cache, last_insert_len)
}

/// Selects the cheapest backward-reference command sequence covering `data`.
///
/// Quality 10 runs [`compute_shortest_path`] once against a literal-cost
/// model built straight from `data`. Quality 11 additionally rebuilds the
/// cost model from the first pass's own command/distance histograms
/// (disabling last-distance reuse for that first pass, so the histogram
/// isn't skewed by short codes a flat model couldn't have known to prefer)
/// and re-runs the search once more before reconstructing the final
/// sequence.
///
/// Treats `data` as a self-contained block with no distance-cache history
/// and no carried-over insert run: both start from the format's fixed
/// defaults. A caller chaining many blocks against one growing ring buffer
/// should instead call [`compute_shortest_path`] and [`create_commands`]
/// directly, threading its own [`crate::DistanceCache`] and
/// `last_insert_len` between calls.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfMemory`] if any allocation in either pass
/// fails.
pub fn create_backward_references<M: Matcher>(
    data: &[u8],
    quality: Quality,
    matcher: &mut M,
    max_backward: u32,
) -> crate::Result<Vec<Command>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut cost_model = CostModel::literal_only(data, DEFAULT_NUM_DISTANCE_SYMBOLS);
    let start_dist_cache = DistanceCache::new();

    if quality == Quality::Q11 {
        cost_model.disable_last_distance = true;
        let first_pass_nodes = compute_shortest_path(
            data,
            &cost_model,
            matcher,
            max_backward,
            &start_dist_cache,
            quality,
        )?;
        let (first_pass_commands, _) = create_commands(
            &first_pass_nodes,
            max_backward,
            &mut start_dist_cache.clone(),
            0,
        );
        cost_model =
            cost_model.refine_from_commands(&first_pass_commands, DEFAULT_NUM_DISTANCE_SYMBOLS);
    }

    let nodes = compute_shortest_path(
        data,
        &cost_model,
        matcher,
        max_backward,
        &start_dist_cache,
        quality,
    )?;
    let (commands, _) =
        create_commands(&nodes, max_backward, &mut start_dist_cache.clone(), 0);
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::HashChainMatcher;

    /// Offers one candidate at a single fixed position and records every
    /// `store_range` call it receives, so `MatchTable::build`'s collapsing
    /// behavior can be checked directly.
    struct OneLongMatchAt {
        pos: usize,
        candidate: CandidateMatch,
        buf: Vec<CandidateMatch>,
        stored: Vec<(usize, usize)>,
    }

    impl Matcher for OneLongMatchAt {
        const HASH_TYPE_LENGTH: usize = 4;
        const STORE_LOOKAHEAD: usize = 4;

        fn find_matches(
            &mut self,
            pos: usize,
            _max_distance: u32,
            _max_length: usize,
        ) -> &[CandidateMatch] {
            self.buf.clear();
            if pos == self.pos {
                self.buf.push(self.candidate);
            }
            &self.buf
        }

        fn store_range(&mut self, lo: usize, hi: usize) {
            self.stored.push((lo, hi));
        }
    }

    /// spec.md §8 scenario 4: a match long enough to exceed `max_zopfli_len`
    /// collapses its position to a single candidate, the positions its copy
    /// covers are zero-filled rather than separately probed, and the
    /// matcher still gets `store_range` coverage all the way to the end of
    /// the collapsed match.
    #[test]
    fn long_match_collapses_the_block_driver_to_a_single_candidate() {
        let data = vec![0u8; 1024];
        let candidate = CandidateMatch {
            distance: 5,
            length: 400,
            is_dictionary: false,
            dictionary_length_code: 0,
        };
        let mut matcher = OneLongMatchAt {
            pos: 4,
            candidate,
            buf: Vec::new(),
            stored: Vec::new(),
        };

        let max_zopfli_len = 325; // quality 11's threshold
        let table = MatchTable::build(&data, &mut matcher, u32::MAX, max_zopfli_len);

        assert_eq!(table.at(4).len(), 1);
        assert_eq!(table.at(4)[0], candidate);
        for pos in 5..404 {
            assert!(
                table.at(pos).is_empty(),
                "position {pos} should have been zero-filled, not probed"
            );
        }
        let covers_up_to_404 = matcher
            .stored
            .iter()
            .any(|&(_, hi)| hi >= 404);
        assert!(
            covers_up_to_404,
            "matcher should have been told the whole collapsed match range was searched, got {:?}",
            matcher.stored
        );
        assert!(
            matcher.stored.iter().any(|&(lo, hi)| lo == 4 && hi <= 8),
            "the position that found the match should still get its own lookahead store_range"
        );
    }

    #[test]
    fn empty_input_produces_no_commands() {
        let mut matcher = HashChainMatcher::new(&[]);
        let commands =
            create_backward_references(&[], Quality::Q10, &mut matcher, u32::MAX).unwrap();
        assert!(commands.is_empty());
    }

    #[test]
    fn commands_reconstruct_the_original_length() {
        let data = b"the quick brown fox jumps over the lazy dog the quick brown fox";
        let mut matcher = HashChainMatcher::new(data);
        let commands =
            create_backward_references(data, Quality::Q10, &mut matcher, u32::MAX).unwrap();
        let covered: u32 = commands.iter().map(|c| c.insert_length + c.copy_length).sum();
        assert_eq!(covered as usize, data.len());
    }

    #[test]
    fn quality_11_also_covers_the_whole_input() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcxyzxyzxyzxyzxyz";
        let mut matcher = HashChainMatcher::new(data);
        let commands =
            create_backward_references(data, Quality::Q11, &mut matcher, u32::MAX).unwrap();
        let covered: u32 = commands.iter().map(|c| c.insert_length + c.copy_length).sum();
        assert_eq!(covered as usize, data.len());
    }

    #[test]
    fn repeated_pattern_uses_at_least_one_copy() {
        let data = b"abcdefgh".repeat(8);
        let mut matcher = HashChainMatcher::new(&data);
        let commands =
            create_backward_references(&data, Quality::Q11, &mut matcher, u32::MAX).unwrap();
        assert!(commands.iter().any(Command::is_copy));
    }

    /// A caller chaining blocks can hand the low-level API a non-default
    /// starting distance cache and see it actually used for last-distance
    /// short codes right from the first byte of the new block.
    #[test]
    fn low_level_api_honors_a_caller_supplied_starting_distance_cache() {
        let data = b"abcxyzxyz";
        let mut matcher = HashChainMatcher::new(data);
        let cost_model = CostModel::literal_only(data, DEFAULT_NUM_DISTANCE_SYMBOLS);
        let starting_cache = DistanceCache::new();
        let nodes = compute_shortest_path(
            data,
            &cost_model,
            &mut matcher,
            u32::MAX,
            &starting_cache,
            Quality::Q10,
        )
        .unwrap();
        let mut dist_cache = starting_cache;
        let (commands, num_literals) = create_commands(&nodes, u32::MAX, &mut dist_cache, 0);
        let covered: u32 = commands.iter().map(|c| c.insert_length + c.copy_length).sum();
        assert_eq!(covered as usize, data.len());
        assert_eq!(num_literals, covered - commands.iter().map(|c| c.copy_length).sum::<u32>());
    }
}
