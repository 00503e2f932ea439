////////////////////////////////////////////////////////////////////////////////
// This Source Code Form is subject to the terms of the Mozilla Public         /
// License, v. 2.0. If a copy of the MPL was not distributed with this         /
// file, You can obtain one at https://mozilla.org/MPL/2.0/.                   /
//                                                                             /
////////////////////////////////////////////////////////////////////////////////

use onlyerror::Error;

/// The only externally visible failure mode of the selection core.
///
/// Every allocation site in the driver checks for allocation failure before
/// committing any output; a partially built command stream is never handed
/// back to the caller.
#[derive(Error, Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    #[error("failed to allocate memory for the selection core")]
    OutOfMemory,
}

pub type Result<T> = std::result::Result<T, Error>;
