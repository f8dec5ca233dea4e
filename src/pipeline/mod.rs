//! Points recalculation and cumulative aggregation.
//!
//! [`run`] drives [`build_season`] over a range of seasons and feeds each
//! season's scored rows through [`accumulate`]. [`standings`] and
//! [`compare_teammates`] are derived views over the same rows.

pub mod cancel;
pub mod cumulative;
pub mod driver;
pub mod error;
pub mod season;
pub mod standings;
pub mod teammates;
pub mod types;

pub use cancel::CancelFlag;
pub use cumulative::accumulate;
pub use driver::{run, RunOutput};
pub use error::{RunError, SeasonError};
pub use season::{build_season, SeasonPoints};
pub use standings::{standings, StandingRow};
pub use teammates::{compare_teammates, TeammatePairing, TeammateScore};
pub use types::{CumulativeRow, ScoredRaceRow, SeasonOutcome, SeasonReport, SkippedRound};
