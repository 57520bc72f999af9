// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Domain failures shared by the core modules. Command handlers surface these
/// through `anyhow`; the not-found variants deliberately use the same wording
/// for a missing row and a row owned by someone else.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("No active user; run 'user add' or 'user switch' first")]
    Unauthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Entry {0} not found or not yours")]
    EntryNotFound(i64),

    #[error("Recurring obligation {0} not found or not yours")]
    ObligationNotFound(i64),

    #[error("Goal {0} not found or not yours")]
    GoalNotFound(i64),

    #[error("Category '{0}' not found for the active user")]
    CategoryNotFound(String),

    #[error("Corrupt stored data: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Store(#[from] rusqlite::Error),
}
