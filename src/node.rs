////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The per-position node array the shortest-path search relaxes edges into.
//!
//! Each `Node` records the cheapest known way to arrive at its stream
//! position: the command that would be emitted to get there, and the total
//! cost of the path up to and including that command. Position 0 is the
//! implicit start of the search and is never itself the target of a
//! command; `nodes[1..]` cover every position a command can land on.

/// The cheapest known command arriving at this node's position, and the
/// total path cost through it.
///
/// Unlike a bit-packed layout, `cost` is never overwritten to double as a
/// "next position" pointer during reconstruction:
/// [`crate::reconstruct::compute_shortest_path_from_nodes`] walks the array
/// read-only and instead threads the path through a separate position list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Length of the literal run immediately preceding the copy.
    pub insert_length: u32,
    /// Length of the copy. Zero only for the sentinel node at position 0.
    pub copy_length: u32,
    /// Backward distance of the copy. Zero only for the sentinel node or an
    /// insert-only arrival (no node in this search is insert-only except
    /// the implicit start).
    pub distance: u32,
    /// 0 if this copy used a raw (non-cached) distance, otherwise
    /// `1 + <index into the last-four-distances short-code table>`.
    pub short_code: u8,
    /// Recovers the command's prefix length code via
    /// [`crate::symbol::decode_len_code`]. Equal to `copy_length` (i.e. the
    /// modifier is exactly [`crate::symbol::encode_length_code_modifier`]'s
    /// bias) for every ordinary copy; only a dictionary match's synthetic
    /// length code ever differs from its `copy_length`.
    pub length_code_modifier: u8,
    /// Total estimated bit cost of the cheapest path ending at this node.
    /// `f32::INFINITY` for a position never yet reached.
    pub cost: f32,
}

impl Node {
    /// The sentinel node occupying position 0: zero cost, no incoming
    /// command.
    pub const START: Node = Node {
        insert_length: 0,
        copy_length: 0,
        distance: 0,
        short_code: 0,
        length_code_modifier: 0,
        cost: 0.0,
    };

    /// A node for a position not yet reached by any path.
    pub const UNREACHED: Node = Node {
        insert_length: 0,
        copy_length: 0,
        distance: 0,
        short_code: 0,
        length_code_modifier: 0,
        cost: f32::INFINITY,
    };

    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.cost.is_finite()
    }
}

/// `nodes[p]` is the cheapest known arrival at stream position `p`, for `p`
/// in `0..=block_len`. `nodes[0]` is always [`Node::START`].
#[derive(Debug, Clone)]
pub struct NodeArray {
    nodes: Vec<Node>,
}

impl NodeArray {
    /// Allocates a node array covering positions `0..=block_len`, all
    /// unreached save for the sentinel start node.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfMemory`] if the backing allocation
    /// fails.
    pub fn try_new(block_len: usize) -> crate::Result<Self> {
        let mut nodes = Vec::new();
        nodes
            .try_reserve_exact(block_len + 1)
            .map_err(|_| crate::Error::OutOfMemory)?;
        nodes.push(Node::START);
        nodes.resize(block_len + 1, Node::UNREACHED);
        Ok(NodeArray { nodes })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn get(&self, pos: usize) -> &Node {
        &self.nodes[pos]
    }

    /// Relaxes the edge landing on `pos` if `candidate_cost` improves on the
    /// node currently stored there. Returns `true` if the node was updated.
    pub fn relax(&mut self, pos: usize, candidate: Node) -> bool {
        if candidate.cost < self.nodes[pos].cost {
            self.nodes[pos] = candidate;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }
}
