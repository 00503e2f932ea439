////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! Pure symbol/code-table helpers: mapping insert lengths, copy lengths, and
//! distances to the command alphabet the cost model is indexed by.
//!
//! None of this crate's bit-exactness claims extend to matching the
//! reference Brotli bitstream byte-for-byte; entropy coding is explicitly
//! out of scope. What's preserved is the *shape* of the format: a small run
//! of individually coded short lengths followed by exponentially doubling
//! buckets, and a command code that folds insert/copy codes together so that
//! "did this copy reuse one of the last four distances" is visible from the
//! code alone (`cmd_code < 128`).

/// Number of command symbols the cost model tracks (`cmd_cost` has this many
/// entries).
pub const NUM_COMMAND_SYMBOLS: usize = 704;

/// Number of last-distance short codes considered per position.
pub const NUM_DISTANCE_SHORT_CODES: usize = 16;

/// Default size of the distance-cost table. Real distance alphabet sizing
/// depends on `NPOSTFIX`/`NDIRECT`, both out of scope here; this is just
/// large enough to give distinct costs to most in-window distances without
/// growing the per-block allocation unreasonably. Distances that land past
/// it fall back to an analytic estimate, see `cost::CostModel::command_total_cost`.
pub const DEFAULT_NUM_DISTANCE_SYMBOLS: usize = 544;

const INSERT_SMALL_CODES: u32 = 6;
const COPY_SMALL_CODES: u32 = 8;
const COPY_LENGTH_MIN: u32 = 2;

/// Splits `value` into a small run of individually coded values followed by
/// exponentially doubling buckets, mirroring the shape of Brotli's own
/// insert/copy length prefix codes.
fn bucketed_code(value: u32, num_small_codes: u32) -> u16 {
    if value < num_small_codes {
        return value as u16;
    }
    let mut base = num_small_codes;
    let mut bucket_size: u32 = 1;
    let mut code = num_small_codes;
    loop {
        if value < base + bucket_size {
            return code as u16;
        }
        base += bucket_size;
        bucket_size <<= 1;
        code += 1;
    }
}

/// Symbol index for an insert (literal run) length.
#[must_use]
pub fn insert_length_code(insert_length: u32) -> u16 {
    bucketed_code(insert_length, INSERT_SMALL_CODES)
}

/// Number of extra bits an insert code needs to recover the exact length.
#[must_use]
pub fn insert_extra_bits(code: u16) -> u8 {
    let small = INSERT_SMALL_CODES as u16;
    if code < small {
        0
    } else {
        (code - small + 1) as u8
    }
}

/// Symbol index for a copy length. Copy lengths below 2 are never legal:
/// any copy shorter than that is cheaper to encode as plain literals.
#[must_use]
pub fn copy_length_code(copy_length: u32) -> u16 {
    debug_assert!(copy_length >= COPY_LENGTH_MIN);
    bucketed_code(copy_length - COPY_LENGTH_MIN, COPY_SMALL_CODES)
}

/// Number of extra bits a copy code needs to recover the exact length.
#[must_use]
pub fn copy_extra_bits(code: u16) -> u8 {
    let small = COPY_SMALL_CODES as u16;
    if code < small {
        0
    } else {
        (code - small + 1) as u8
    }
}

/// The length at which `copy_length_code` crosses into bucket `bucket + 1`
/// (buckets are numbered from 0 starting right after the small-code run).
/// `6 + 4 * 2^bucket` is the closed form of "first boundary at 10, then
/// double the bucket size each time" (`+ COPY_LENGTH_MIN` to put it back in
/// copy-length units rather than the code's zero-based ones).
#[must_use]
pub fn copy_length_bucket_boundary(bucket: u32) -> u32 {
    COPY_LENGTH_MIN + 6 + 4 * (1 << bucket)
}

/// Combines an insert code and a copy code into a single command symbol.
///
/// `use_last_distance` requests the compact encoding used when the copy
/// reuses one of the last four distances. That encoding is only reachable
/// when both codes are small (`inscode < 8`, `copycode < 16`); the combined
/// code it produces is always `< 128`, which is exactly the boundary the
/// cost model uses to decide whether a distance symbol needs to be paid for.
#[must_use]
pub fn combine_length_codes(inscode: u16, copycode: u16, use_last_distance: bool) -> u16 {
    let bits64 = (copycode & 0x7) | ((inscode & 0x7) << 3);
    if use_last_distance && inscode < 8 && copycode < 16 {
        if copycode < 8 {
            bits64
        } else {
            bits64 | 0x40
        }
    } else {
        let offset = 2 * ((copycode >> 3) + 3 * (inscode >> 3));
        (offset << 5) + 0x40 + bits64
    }
}

/// `(index, offset)` pairs defining the 16 last-distance short codes as
/// linear combinations of the 4-entry distance cache: candidate distance is
/// `dist_cache[index] + offset`. Frozen by the format; reproduced verbatim.
pub const DISTANCE_CACHE_INDEX: [usize; NUM_DISTANCE_SHORT_CODES] =
    [0, 1, 2, 3, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 1, 1];

pub const DISTANCE_CACHE_OFFSET: [i32; NUM_DISTANCE_SHORT_CODES] =
    [0, 0, 0, 0, -1, 1, -2, 2, -3, 3, -1, 1, -2, 2, -3, 3];

/// Per-short-code minimum admissible distance, `kLimits[16]` in spec.md §6/§7.
/// Short codes 0..3 are direct cache hits (no offset applied) and carry no
/// floor beyond plain positivity, so their limit is 1. Short codes 4..15
/// apply an offset of magnitude `|DISTANCE_CACHE_OFFSET[k]|` to a cached
/// distance; a candidate below that magnitude plus one would be indifferent
/// from (or closer to zero than) a smaller, already-considered short code,
/// so the limit is `|offset| + 1`. Frozen alongside
/// `DISTANCE_CACHE_INDEX`/`DISTANCE_CACHE_OFFSET`, reproduced verbatim.
pub const DISTANCE_SHORT_CODE_LIMITS: [u32; NUM_DISTANCE_SHORT_CODES] =
    [1, 1, 1, 1, 2, 2, 3, 3, 4, 4, 2, 2, 3, 3, 4, 4];

/// Recovers the `k`-th last-distance short code candidate from a 4-entry
/// distance cache, or `None` if the linear combination would be non-positive
/// (distance zero or negative is not representable and must be skipped, the
/// "underflow past the block origin" precondition in the error design) or,
/// for `short_code_index >= 4`, falls below that short code's
/// `DISTANCE_SHORT_CODE_LIMITS` floor (spec.md §7).
#[must_use]
pub fn distance_cache_candidate(cache: &[u32; 4], short_code_index: usize) -> Option<u32> {
    let index = DISTANCE_CACHE_INDEX[short_code_index];
    let offset = DISTANCE_CACHE_OFFSET[short_code_index];
    let candidate = i64::from(cache[index]) + i64::from(offset);
    if candidate <= 0 {
        return None;
    }
    let candidate = candidate as u32;
    if short_code_index >= 4 && candidate < DISTANCE_SHORT_CODE_LIMITS[short_code_index] {
        return None;
    }
    Some(candidate)
}

/// Distance symbol used both for `dist_cost` lookups and as the `Command`'s
/// `distance_code`. `short_code == 0` means no last-distance hit; the raw
/// distance is coded starting right after the 16 short codes (`distance +
/// 15`, reserving symbols `0..=15` for the short codes themselves, of which
/// `0` is reused distance-exactly and is never materialized as a symbol
/// here, see `DistanceCache::is_last_used`).
#[must_use]
pub fn distance_symbol(distance: u32, short_code: u8) -> u32 {
    if short_code == 0 {
        distance + 15
    } else {
        u32::from(short_code - 1)
    }
}

/// Extra bits needed for a raw (non-short-code) distance.
#[must_use]
pub fn distance_extra_bits(distance: u32) -> u8 {
    if distance <= 1 {
        0
    } else {
        (32 - (distance - 1).leading_zeros()) as u8
    }
}

/// Bias added to `len_code - copy_length` so the difference fits in
/// [`Node::length_code_modifier`](crate::node::Node::length_code_modifier)'s
/// `u8`. Ordinary matches never need a modifier (`len_code == copy_length`),
/// so `encode_length_code_modifier` returns exactly this bias for them;
/// dictionary matches impose a synthetic `len_code` that can differ from the
/// real `copy_length` by more than a `u8` alone could hold signed, hence the
/// bias rather than storing the (possibly negative) difference directly.
const LENGTH_CODE_MODIFIER_BIAS: i32 = 128;

/// Packs `len_code - copy_length` into a `u8`, for a node whose prefix
/// length code differs from its own `copy_length` (only dictionary matches
/// need this; see `relax::relax_candidate`).
#[must_use]
pub fn encode_length_code_modifier(copy_length: u32, len_code: u32) -> u8 {
    let diff = i64::from(len_code) - i64::from(copy_length);
    (diff + i64::from(LENGTH_CODE_MODIFIER_BIAS)).clamp(0, 255) as u8
}

/// Recovers `len_code` from a node's `copy_length` and its
/// `length_code_modifier`. Inverse of `encode_length_code_modifier`.
#[must_use]
pub fn decode_len_code(copy_length: u32, modifier: u8) -> u32 {
    (i64::from(copy_length) + i64::from(modifier) - i64::from(LENGTH_CODE_MODIFIER_BIAS)).max(0)
        as u32
}
