////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Turning a finished node array back into an ordered `Command` sequence.
//!
//! The search itself never needs to know the path it's building, only the
//! cheapest cost at each position; reconstruction is the one pass that
//! walks it. It runs backward (each node only knows how far back its own
//! command reaches) and then reverses, rather than mutating `cost` into a
//! forward pointer the way a packed layout would.

use crate::command::Command;
use crate::distance::DistanceCache;
use crate::node::NodeArray;
use crate::symbol;

/// Stream positions visited by the cheapest path through `nodes`, in
/// increasing order, starting after position 0 and ending at the last
/// position in the array.
#[must_use]
pub fn compute_shortest_path_from_nodes(nodes: &NodeArray) -> Vec<usize> {
    let block_len = nodes.len() - 1;
    let mut positions = Vec::new();
    let mut pos = block_len;
    while pos > 0 {
        positions.push(pos);
        let node = nodes.get(pos);
        let step = node.insert_length + node.copy_length;
        debug_assert!(step > 0, "a non-start node must be reached by some edge");
        pos = pos.saturating_sub(step as usize);
    }
    positions.reverse();
    positions
}

/// Materializes the cheapest path through `nodes` into a `Command`
/// sequence, folding the caller's `last_insert_len` (leftover from
/// whatever preceded this block) into the first command's insert length,
/// and threading `dist_cache` forward through every real (non-dictionary)
/// copy the same way an entropy coder observing the stream would.
///
/// Returns the commands and the total number of literal bytes they cover
/// (`last_insert_len` included). Because this crate's search always finds a
/// path reaching the block's last position exactly (`driver::finalize_tail`
/// guarantees it), there is never a residual insert run left over once the
/// path is materialized, so `last_insert_len` is only ever consumed here,
/// never produced — a caller chaining multiple blocks starts each one's
/// `last_insert_len` at 0 unless it has its own reason to withhold a
/// trailing literal run across block boundaries.
#[must_use]
pub fn create_commands(
    nodes: &NodeArray,
    max_backward: u32,
    dist_cache: &mut DistanceCache,
    last_insert_len: u32,
) -> (Vec<Command>, u32) {
    let positions = compute_shortest_path_from_nodes(nodes);
    let mut commands = Vec::with_capacity(positions.len());
    let mut num_literals: u32 = 0;
    let mut pending_carry = last_insert_len;
    for pos in positions {
        let node = nodes.get(pos);
        let insert_length = node.insert_length + pending_carry;
        pending_carry = 0;
        num_literals = num_literals.saturating_add(insert_length);

        if node.copy_length == 0 {
            let inscode = symbol::insert_length_code(insert_length);
            commands.push(Command {
                insert_length,
                copy_length: 0,
                length_code: inscode,
                distance_code: 0,
            });
            continue;
        }
        let inscode = symbol::insert_length_code(insert_length);
        let len_code = symbol::decode_len_code(node.copy_length, node.length_code_modifier);
        let copycode = symbol::copy_length_code(len_code.max(2));
        let use_last_distance = node.short_code != 0;
        let length_code = symbol::combine_length_codes(inscode, copycode, use_last_distance);
        let distance_code = symbol::distance_symbol(node.distance, node.short_code);
        commands.push(Command {
            insert_length,
            copy_length: node.copy_length,
            length_code,
            distance_code,
        });
        if node.distance <= max_backward {
            dist_cache.update(node.distance, node.short_code);
        }
    }
    (commands, num_literals)
}
