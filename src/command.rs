////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

//! The output of the selection core: a plain, unencoded command record.
//!
//! This is deliberately not a wire format. Turning a `Command` sequence into
//! bits is the entropy coder's job, out of scope for this crate.

/// One insert-and-copy command: emit `insert_length` literal bytes, then
/// copy `copy_length` bytes from `distance_code` bytes back.
///
/// `copy_length == 0` only for the final, copy-less command a block ends on
/// when the last bytes aren't covered by any match (see
/// `reconstruct::create_commands`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub insert_length: u32,
    pub copy_length: u32,
    /// The combined command symbol, see `symbol::combine_length_codes`.
    pub length_code: u16,
    /// The distance symbol, see `symbol::distance_symbol`. Meaningless when
    /// `copy_length == 0`.
    pub distance_code: u32,
}

impl Command {
    #[must_use]
    pub fn is_copy(&self) -> bool {
        self.copy_length > 0
    }
}
