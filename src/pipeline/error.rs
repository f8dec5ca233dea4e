//! Pipeline error taxonomy.
//!
//! A failed round is not an error type of its own: the season builder catches
//! the [`FetchError`](crate::fetch::FetchError), records the round as skipped and
//! moves on. Only the types below cross a function boundary.

use super::types::SeasonReport;

/// Why a season produced no rows, or stopped early.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SeasonError {
    #[error("no data for season {season}: {reason}")]
    NoData {
        season: u32,
        reason: String,
        report: SeasonReport,
    },

    #[error("cancelled while processing season {season}")]
    Cancelled { season: u32 },
}

/// Fatal outcomes of a multi-season run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RunError {
    #[error("invalid season range {start}-{end}: start is after end")]
    InvalidRange { start: u32, end: u32 },

    #[error("no usable data for seasons {start}-{end}")]
    TotalFailure {
        start: u32,
        end: u32,
        reports: Vec<SeasonReport>,
    },

    #[error("run cancelled")]
    Cancelled,
}
