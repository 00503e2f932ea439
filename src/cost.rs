////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The cost model: per-byte literal cost estimates plus per-symbol command
//! and distance costs, all expressed in (fractional) bits.
//!
//! Quality 10 runs the search once against a literal-cost-only model.
//! Quality 11 runs it twice: once against the literal-cost-only model to
//! produce a first command sequence, then rebuilds `cmd_cost`/`dist_cost`
//! from that sequence's own symbol histograms and re-runs the search. Both
//! tiers share this type; only the construction path differs.

use crate::symbol::{self, NUM_COMMAND_SYMBOLS};

/// Sliding window (in bytes) used to localize the literal cost estimate.
/// Kept close to the match finder's own lookback horizon, so literal cost
/// and match cost are informed by comparably local statistics.
const LITERAL_WINDOW: usize = 2000;

/// A symbol histogram turned into a Shannon-style per-symbol cost table:
/// `cost[i] = max(1.0, log2(total) - log2(count[i]))`, with unseen symbols
/// charged `log2(total) + 2` (the standard "this would need its own
/// codeword we didn't budget for" fallback).
fn histogram_costs(counts: &[u32], len: usize) -> Vec<f32> {
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    let log2_total = if total == 0 {
        0.0
    } else {
        (total as f32).log2()
    };
    let mut costs = Vec::with_capacity(len);
    for &count in counts {
        let cost = if count == 0 {
            log2_total + 2.0
        } else {
            (log2_total - (count as f32).log2()).max(1.0)
        };
        costs.push(cost);
    }
    costs
}

/// Per-byte literal cost, derived from a histogram of a `LITERAL_WINDOW`-byte
/// neighborhood around each position rather than a single global histogram,
/// so a run of text amid binary data (or vice versa) doesn't get charged the
/// whole file's average entropy.
#[must_use]
pub fn estimate_literal_costs(data: &[u8]) -> Vec<f32> {
    if data.is_empty() {
        return Vec::new();
    }
    let half_window = LITERAL_WINDOW / 2;
    let mut counts = [0u32; 256];
    let mut window_start = 0usize;
    let mut window_end = 0usize;
    let mut costs = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        let target_start = i.saturating_sub(half_window);
        let target_end = (i + half_window).min(data.len());
        while window_start < target_start {
            counts[data[window_start] as usize] -= 1;
            window_start += 1;
        }
        while window_end < target_end {
            counts[data[window_end] as usize] += 1;
            window_end += 1;
        }
        let total = (window_end - window_start) as f32;
        let count = counts[data[i] as usize] as f32;
        costs.push((total.log2() - count.log2()).max(1.0));
    }
    costs
}

/// Per-symbol command/distance costs plus the per-byte literal cost table
/// the relaxation step reads from.
#[derive(Debug, Clone)]
pub struct CostModel {
    cmd_cost: Vec<f32>,
    dist_cost: Vec<f32>,
    literal_costs: Vec<f32>,
    min_cost_cmd: f32,
    /// Forces every fresh match to be coded as a raw distance, never a
    /// last-distance short code. Set during the q11 first pass so its
    /// output histogram doesn't bake in cache hits from a biased initial
    /// model.
    pub disable_last_distance: bool,
}

impl CostModel {
    /// Builds the literal-cost-only model used for quality 10 and for
    /// quality 11's first pass. No command/distance histogram exists yet,
    /// so both tables get the pessimistic logarithmic shape of §4.1: a
    /// command is assumed no cheaper than coding its index uniformly among
    /// at least `11 + i` possibilities, a distance among at least `20 + i`.
    #[must_use]
    pub fn literal_only(data: &[u8], num_distance_symbols: usize) -> Self {
        let literal_costs = estimate_literal_costs(data);
        let cmd_cost: Vec<f32> = (0..NUM_COMMAND_SYMBOLS)
            .map(|i| (11.0 + i as f32).log2())
            .collect();
        let dist_cost: Vec<f32> = (0..num_distance_symbols)
            .map(|i| (20.0 + i as f32).log2())
            .collect();
        let min_cost_cmd = 11f32.log2();
        CostModel {
            cmd_cost,
            dist_cost,
            literal_costs,
            min_cost_cmd,
            disable_last_distance: false,
        }
    }

    /// Rebuilds `cmd_cost`/`dist_cost` from the symbol histograms of an
    /// already-produced command sequence, keeping the same literal costs.
    /// This is the q11 second-pass refinement.
    #[must_use]
    pub fn refine_from_commands(
        &self,
        commands: &[crate::command::Command],
        num_distance_symbols: usize,
    ) -> Self {
        let mut cmd_counts = vec![0u32; NUM_COMMAND_SYMBOLS];
        let mut dist_counts = vec![0u32; num_distance_symbols];
        for command in commands {
            cmd_counts[command.length_code as usize] += 1;
            if (command.distance_code as usize) < num_distance_symbols {
                dist_counts[command.distance_code as usize] += 1;
            }
        }
        let cmd_cost = histogram_costs(&cmd_counts, NUM_COMMAND_SYMBOLS);
        let dist_cost = histogram_costs(&dist_counts, num_distance_symbols);
        let min_cost_cmd = cmd_cost.iter().copied().fold(f32::INFINITY, f32::min);
        CostModel {
            cmd_cost,
            dist_cost,
            literal_costs: self.literal_costs.clone(),
            min_cost_cmd,
            disable_last_distance: false,
        }
    }

    #[must_use]
    pub fn literal_cost(&self, pos: usize) -> f32 {
        self.literal_costs[pos]
    }

    #[must_use]
    pub fn literal_costs(&self) -> &[f32] {
        &self.literal_costs
    }

    #[must_use]
    pub fn min_cost_cmd(&self) -> f32 {
        self.min_cost_cmd
    }

    #[must_use]
    pub fn command_cost(&self, length_code: u16) -> f32 {
        self.cmd_cost[length_code as usize]
    }

    /// Cost of the block's closing command when the last few bytes aren't
    /// covered by any copy: a plain insert of `inscode`'s length, no copy,
    /// no distance. The insert code itself stands in for the command's
    /// `length_code` in this case; there's nothing to combine it with.
    #[must_use]
    pub fn insert_only_cost(&self, inscode: u16) -> f32 {
        self.command_cost(inscode) + f32::from(symbol::insert_extra_bits(inscode))
    }

    /// Total estimated cost of a command: combined length-code cost, plus a
    /// distance symbol's cost and extra bits when the command does not use
    /// the compact last-distance encoding (`length_code < 128`, see
    /// `symbol::combine_length_codes`).
    #[must_use]
    pub fn command_total_cost(
        &self,
        inscode: u16,
        copycode: u16,
        distance: u32,
        short_code: u8,
    ) -> f32 {
        let use_last_distance = !self.disable_last_distance && short_code != 0;
        let length_code = symbol::combine_length_codes(inscode, copycode, use_last_distance);
        let mut cost = self.command_cost(length_code)
            + f32::from(symbol::insert_extra_bits(inscode))
            + f32::from(symbol::copy_extra_bits(copycode));
        if length_code >= 128 {
            let effective_short_code = if use_last_distance { short_code } else { 0 };
            let dist_symbol = symbol::distance_symbol(distance, effective_short_code) as usize;
            let dist_cost = if dist_symbol < self.dist_cost.len() {
                self.dist_cost[dist_symbol]
            } else {
                // Distances past the table we sized up front are rare (a
                // very large window); charge the worst observed symbol plus
                // the extra bits needed to tell it apart from that symbol,
                // rather than index out of bounds.
                self.dist_cost.last().copied().unwrap_or(self.min_cost_cmd)
                    + ((dist_symbol - self.dist_cost.len() + 1) as f32).log2()
            };
            cost += dist_cost + f32::from(symbol::distance_extra_bits(distance));
        }
        cost
    }
}
