////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The match-finder contract and a reference implementation of it.
//!
//! The selection core never constructs matches itself; it asks a `Matcher`
//! for candidates at a position and picks among what comes back. Production
//! callers are expected to bring their own matcher (a multi-level hash
//! chain, a suffix array, whatever fits their latency budget); the
//! `HashChainMatcher` here exists only so this crate's own tests, doctests,
//! and benches have something to drive the core with.

/// One candidate backward reference a matcher offers at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateMatch {
    pub distance: u32,
    pub length: u32,
    /// `true` if this match references a static dictionary rather than the
    /// sliding window of already-emitted bytes.
    pub is_dictionary: bool,
    /// The synthetic prefix length code a dictionary match is encoded with
    /// (the format's `BackwardMatchLengthCode`), meaningless when
    /// `is_dictionary` is `false`. A dictionary reference's encoded length
    /// need not equal its byte `length` since the static dictionary's
    /// transform table can stretch or shrink what a single code represents.
    pub dictionary_length_code: u32,
}

/// External collaborator the selection core asks for candidate matches.
///
/// `find_matches` is expected to return candidates sorted by increasing
/// `length` (the relaxation step in `relax` relies on this to skip
/// dominated candidates without re-sorting). `store_range` is called once
/// the core has committed to positions `lo..hi` as already searched, so the
/// matcher can insert them into its own index before the next query.
pub trait Matcher {
    /// Minimum number of bytes the matcher's hash is computed over; the
    /// core never asks for a match shorter than this.
    const HASH_TYPE_LENGTH: usize;
    /// Number of trailing bytes the matcher needs already inserted before a
    /// query at a position is meaningful (lookahead the core must leave
    /// unconsumed at the end of a block).
    const STORE_LOOKAHEAD: usize;

    fn find_matches(&mut self, pos: usize, max_distance: u32, max_length: usize)
        -> &[CandidateMatch];

    fn store_range(&mut self, lo: usize, hi: usize);
}

const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;
const HASH_MASK: usize = HASH_SIZE - 1;
const MAX_CHAIN_PROBES: usize = 64;

fn hash4(data: &[u8], pos: usize) -> usize {
    let bytes = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
    let word = u32::from_le_bytes(bytes);
    ((word.wrapping_mul(0x1e35_a7bd)) >> (32 - HASH_BITS)) as usize & HASH_MASK
}

/// A plain single-level hash chain over 4-byte prefixes: a `head` table
/// mapping hash to the most recent position with that hash, and a `prev`
/// table threading each position back to the previous one sharing it.
pub struct HashChainMatcher<'a> {
    data: &'a [u8],
    head: Vec<i64>,
    prev: Vec<i64>,
    inserted_up_to: usize,
    candidates: Vec<CandidateMatch>,
}

impl<'a> HashChainMatcher<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        HashChainMatcher {
            data,
            head: vec![-1; HASH_SIZE],
            prev: vec![-1; data.len().max(1)],
            inserted_up_to: 0,
            candidates: Vec::new(),
        }
    }

    fn insert(&mut self, pos: usize) {
        if pos + 4 > self.data.len() {
            return;
        }
        let h = hash4(self.data, pos);
        self.prev[pos] = self.head[h];
        self.head[h] = pos as i64;
    }

    fn match_length(&self, a: usize, b: usize, max_length: usize) -> usize {
        let data = self.data;
        let mut len = 0;
        while len < max_length && a + len < data.len() && data[a + len] == data[b + len] {
            len += 1;
        }
        len
    }
}

impl<'a> Matcher for HashChainMatcher<'a> {
    const HASH_TYPE_LENGTH: usize = 4;
    const STORE_LOOKAHEAD: usize = 4;

    fn find_matches(
        &mut self,
        pos: usize,
        max_distance: u32,
        max_length: usize,
    ) -> &[CandidateMatch] {
        self.candidates.clear();
        if pos + Self::HASH_TYPE_LENGTH > self.data.len() {
            return &self.candidates;
        }
        let h = hash4(self.data, pos);
        let mut candidate = self.head[h];
        let mut probes = 0;
        let mut best_length = 0usize;
        while candidate >= 0 && probes < MAX_CHAIN_PROBES {
            let candidate_pos = candidate as usize;
            let distance = (pos - candidate_pos) as u32;
            if distance == 0 || distance > max_distance {
                break;
            }
            let length = self.match_length(pos, candidate_pos, max_length);
            if length >= Self::HASH_TYPE_LENGTH && length > best_length {
                best_length = length;
                self.candidates.push(CandidateMatch {
                    distance,
                    length: length as u32,
                    is_dictionary: false,
                    dictionary_length_code: 0,
                });
            }
            candidate = self.prev[candidate_pos];
            probes += 1;
        }
        self.candidates.sort_by_key(|c| c.length);
        &self.candidates
    }

    fn store_range(&mut self, lo: usize, hi: usize) {
        let start = lo.max(self.inserted_up_to);
        for pos in start..hi {
            self.insert(pos);
        }
        self.inserted_up_to = self.inserted_up_to.max(hi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_an_exact_repeat() {
        let data = b"abcdabcdabcd";
        let mut matcher = HashChainMatcher::new(data);
        matcher.store_range(0, data.len());
        let matches = matcher.find_matches(4, u32::MAX, data.len());
        assert!(matches.iter().any(|m| m.distance == 4 && m.length >= 4));
    }

    #[test]
    fn no_matches_before_anything_is_stored() {
        let data = b"abcdabcdabcd";
        let mut matcher = HashChainMatcher::new(data);
        let matches = matcher.find_matches(4, u32::MAX, data.len());
        assert!(matches.is_empty());
    }

    #[test]
    fn respects_max_distance() {
        let data = b"abcdXXXXXXXXXXXXXXXXXXXXabcd";
        let mut matcher = HashChainMatcher::new(data);
        matcher.store_range(0, data.len());
        let matches = matcher.find_matches(25, 5, data.len());
        assert!(matches.iter().all(|m| m.distance <= 5));
    }

    #[test]
    fn candidates_are_sorted_by_increasing_length() {
        let data = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let mut matcher = HashChainMatcher::new(data);
        matcher.store_range(0, data.len());
        let matches = matcher.find_matches(30, u32::MAX, data.len());
        for pair in matches.windows(2) {
            assert!(pair[0].length <= pair[1].length);
        }
    }
}
