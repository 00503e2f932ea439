////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! `update_nodes`: the per-position relaxation step the block driver calls
//! once for every byte in the block, in increasing position order.
//!
//! Because edges only ever point forward, by the time the driver calls this
//! at position `pos`, `nodes[pos]` already holds its final cost — nothing
//! still to come can land on it more cheaply. That lets every step here work
//! off already-settled state: enqueue `pos` as a future source, then use the
//! queue's existing entries (all `<= pos`) as sources for edges landing
//! somewhere past `pos`.

use crate::cost::CostModel;
use crate::distance::{compute_distance_cache_from_nodes, DistanceCache};
use crate::matcher::CandidateMatch;
use crate::node::{Node, NodeArray};
use crate::queue::{StartPositionEntry, StartPositionQueue};
use crate::symbol;

/// Lower bound on copy length below which no relaxation from `start_cost`
/// could possibly beat the cost already recorded in `nodes`.
///
/// Walks forward from length 2, charging one extra bit each time the length
/// crosses into the next copy-length-code bucket (mirroring
/// `symbol::copy_length_bucket_boundary`), and stops as soon as the running
/// total can't beat `nodes[pos + len]`'s already-known cost. Everything at
/// or below the returned length is provably not worth trying; it does not
/// claim the returned length itself is worth trying, only that nothing
/// shorter is.
fn compute_minimum_copy_length(
    start_cost: f32,
    nodes: &NodeArray,
    pos: usize,
    min_cost_cmd: f32,
) -> usize {
    let block_len = nodes.len() - 1;
    let mut cost = start_cost + min_cost_cmd;
    let mut len = 2usize;
    let mut bucket = 0u32;
    let mut next_boundary = symbol::copy_length_bucket_boundary(bucket) as usize;
    loop {
        if pos + len > block_len {
            return len;
        }
        if cost < nodes.get(pos + len).cost {
            return len;
        }
        if len + 1 >= next_boundary {
            bucket += 1;
            next_boundary = symbol::copy_length_bucket_boundary(bucket) as usize;
            cost += 1.0;
        }
        len += 1;
        if len > block_len {
            return len;
        }
    }
}

/// The lengths worth evaluating between `min_len` and `max_len` inclusive:
/// the last length in every copy-length-code bucket that falls in range,
/// plus `max_len` itself. Every other length in a bucket has the same code
/// cost as the bucket's last length but covers fewer bytes, so it is always
/// dominated and never needs a relaxation of its own.
fn interesting_lengths(min_len: usize, max_len: usize) -> Vec<usize> {
    if min_len > max_len {
        return Vec::new();
    }
    let mut lens = Vec::new();
    let mut bucket = 0u32;
    loop {
        let boundary = symbol::copy_length_bucket_boundary(bucket) as usize;
        let last_in_bucket = boundary.saturating_sub(1);
        if last_in_bucket >= min_len && last_in_bucket < max_len {
            lens.push(last_in_bucket);
        }
        if boundary > max_len || bucket > 48 {
            break;
        }
        bucket += 1;
    }
    lens.push(max_len);
    lens.dedup();
    lens
}

fn match_length_at(data: &[u8], pos: usize, distance: u32, max_len: usize) -> usize {
    let distance = distance as usize;
    if distance == 0 || distance > pos {
        return 0;
    }
    let source = pos - distance;
    let mut len = 0;
    while len < max_len && pos + len < data.len() && data[pos + len] == data[source + len] {
        len += 1;
    }
    len
}

#[allow(clippy::too_many_arguments)]
fn relax_candidate(
    nodes: &mut NodeArray,
    cost_model: &CostModel,
    pos: usize,
    insert_length: u32,
    inscode: u16,
    distance: u32,
    short_code: u8,
    min_len: usize,
    max_len: usize,
    base_cost: f32,
) {
    for len in interesting_lengths(min_len, max_len) {
        let copycode = symbol::copy_length_code(len as u32);
        let command_cost =
            cost_model.command_total_cost(inscode, copycode, distance, short_code);
        let candidate = Node {
            insert_length,
            copy_length: len as u32,
            distance,
            short_code,
            length_code_modifier: symbol::encode_length_code_modifier(len as u32, len as u32),
            cost: base_cost + command_cost,
        };
        nodes.relax(pos + len, candidate);
    }
}

/// Relaxes a dictionary match: only the candidate's full length is ever
/// tried (spec.md §4.3 step 3 — unlike in-window matches, there is no
/// "try every length up to the candidate's" loop for a dictionary reference,
/// since the static dictionary only offers the one fixed word), using its
/// synthetic `dictionary_length_code` in place of a length code derived from
/// `copy_length`.
fn relax_dictionary_candidate(
    nodes: &mut NodeArray,
    cost_model: &CostModel,
    pos: usize,
    insert_length: u32,
    inscode: u16,
    candidate: &CandidateMatch,
    min_len: usize,
    max_len: usize,
    base_cost: f32,
) {
    let len = max_len;
    if len < min_len || len < 2 {
        return;
    }
    let copycode = symbol::copy_length_code(candidate.dictionary_length_code.max(2));
    let command_cost = cost_model.command_total_cost(inscode, copycode, candidate.distance, 0);
    let node = Node {
        insert_length,
        copy_length: len as u32,
        distance: candidate.distance,
        short_code: 0,
        length_code_modifier: symbol::encode_length_code_modifier(
            len as u32,
            candidate.dictionary_length_code,
        ),
        cost: base_cost + command_cost,
    };
    nodes.relax(pos + len, node);
}

/// Relaxes every edge originating at a previously enqueued position and
/// landing past `pos`, then enqueues `pos` itself as a future source.
///
/// `literal_cost_cumsum[p]` must be the sum of `cost_model.literal_cost(i)`
/// for `i` in `0..p`, so `literal_cost_cumsum[b] - literal_cost_cumsum[a]`
/// gives the cost of the literal run `a..b` without re-summing it here.
///
/// `candidates` is the pre-scanned, ascending-by-length fresh-match list for
/// `pos` (spec.md §4.3's inputs); the block driver builds this once per
/// block via its match table rather than asking the matcher again here.
#[allow(clippy::too_many_arguments)]
pub fn update_nodes(
    data: &[u8],
    pos: usize,
    literal_cost_cumsum: &[f32],
    nodes: &mut NodeArray,
    cost_model: &CostModel,
    queue: &mut StartPositionQueue,
    candidates: &[CandidateMatch],
    max_backward: u32,
    max_zopfli_len: usize,
    initial_dist_cache: &DistanceCache,
) {
    queue.push(StartPositionEntry {
        pos,
        costdiff: nodes.get(pos).cost - literal_cost_cumsum[pos],
    });

    let block_len = nodes.len() - 1;
    if pos >= block_len {
        return;
    }

    for k in 0..queue.size() {
        let entry = queue.at(k);
        if entry.pos > pos {
            continue;
        }
        let source_cost = nodes.get(entry.pos).cost;
        if !source_cost.is_finite() {
            continue;
        }
        let base_cost =
            source_cost + (literal_cost_cumsum[pos] - literal_cost_cumsum[entry.pos]);
        let insert_length = (pos - entry.pos) as u32;
        let inscode = symbol::insert_length_code(insert_length);
        let min_len = compute_minimum_copy_length(base_cost, nodes, pos, cost_model.min_cost_cmd());

        let dist_cache = compute_distance_cache_from_nodes(
            nodes,
            entry.pos,
            max_backward,
            initial_dist_cache,
        );
        for short_code_index in 0..symbol::NUM_DISTANCE_SHORT_CODES {
            let Some(distance) =
                symbol::distance_cache_candidate(dist_cache.entries(), short_code_index)
            else {
                continue;
            };
            if distance > max_backward || distance as usize > pos {
                continue;
            }
            let max_len = match_length_at(data, pos, distance, block_len - pos);
            if max_len < 2 || max_len < min_len {
                continue;
            }
            relax_candidate(
                nodes,
                cost_model,
                pos,
                insert_length,
                inscode,
                distance,
                (short_code_index + 1) as u8,
                min_len,
                max_len,
                base_cost,
            );
        }

        // Fresh (non-last-distance) matches are only tried from the two
        // cheapest start positions: spec.md §4.3 step 3 bounds fan-in this
        // way since a fresh match's distance typically isn't competitive
        // from a start position already several bits more expensive than
        // the best available.
        if k >= 2 {
            continue;
        }

        // `running_len` tracks how far the candidates already tried at this
        // start position cover, so the next (longer) candidate only gets
        // relaxed over the lengths it newly exposes (spec.md §4.3 step 3:
        // "try all lengths from the running len up to the candidate's
        // length"). Candidates are iterated in ascending-length order, so
        // this never skips a length no prior candidate could have offered.
        let mut running_len = min_len.saturating_sub(1);
        for candidate in candidates {
            if candidate.distance == 0 {
                continue;
            }
            if candidate.is_dictionary {
                let max_len = (candidate.length as usize).min(block_len - pos);
                relax_dictionary_candidate(
                    nodes,
                    cost_model,
                    pos,
                    insert_length,
                    inscode,
                    candidate,
                    min_len,
                    max_len,
                    base_cost,
                );
                // A dictionary candidate only ever yields one length; bump
                // past it so a later, shorter-reaching in-window candidate
                // never redundantly retries lengths this one already owns.
                running_len = running_len.max(max_len);
                continue;
            }
            if candidate.distance > max_backward {
                continue;
            }
            let max_len = (candidate.length as usize).min(block_len - pos);
            if max_len < 2 || max_len <= running_len {
                continue;
            }
            let exceeds_max_zopfli_len = candidate.length as usize > max_zopfli_len;
            let lo = (running_len + 1).max(min_len);
            if exceeds_max_zopfli_len {
                // Long enough that trying every bucket boundary below it is
                // not worth it; only the candidate's own max length is a
                // genuinely new, worthwhile trial.
                relax_candidate(
                    nodes,
                    cost_model,
                    pos,
                    insert_length,
                    inscode,
                    candidate.distance,
                    0,
                    max_len,
                    max_len,
                    base_cost,
                );
            } else {
                relax_candidate(
                    nodes,
                    cost_model,
                    pos,
                    insert_length,
                    inscode,
                    candidate.distance,
                    0,
                    lo,
                    max_len,
                    base_cost,
                );
            }
            running_len = max_len;
        }
    }
}
