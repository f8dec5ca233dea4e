use serde::{Deserialize, Serialize};

use crate::ergast::RaceResultRow;

/// A race result with points recomputed under the configured table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRaceRow {
    pub season: u32,
    pub round: u32,
    pub driver_id: String,
    pub constructor_id: String,
    pub position: Option<u32>,
    pub original_points: f64,
    pub status: String,
    pub new_points: f64,
    pub driver_name: String,
    pub constructor_name: String,
}

impl ScoredRaceRow {
    pub fn new(
        result: RaceResultRow,
        new_points: f64,
        driver_name: String,
        constructor_name: String,
    ) -> Self {
        Self {
            season: result.season,
            round: result.round,
            driver_id: result.driver_id,
            constructor_id: result.constructor_id,
            position: result.position,
            original_points: result.original_points,
            status: result.status,
            new_points,
            driver_name,
            constructor_name,
        }
    }
}

/// Running totals for one driver after one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeRow {
    pub season: u32,
    pub round: u32,
    pub driver_id: String,
    pub driver_name: String,
    pub constructor_id: String,
    pub constructor_name: String,
    pub position: Option<u32>,
    pub new_points: f64,
    pub cumulative_points: f64,
    pub original_points: f64,
    pub cumulative_original_points: f64,
}

/// Whether a season contributed rows to the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum SeasonOutcome {
    Scored,
    NoData(String),
}

/// A round whose results could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRound {
    pub round: u32,
    /// Empty when the schedule did not name the race
    pub race_name: String,
}

/// Per-season processing summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonReport {
    pub season: u32,
    pub requested_rounds: usize,
    pub processed_rounds: usize,
    pub skipped_rounds: Vec<SkippedRound>,
    pub outcome: SeasonOutcome,
}

impl SeasonReport {
    pub fn no_data(
        season: u32,
        requested_rounds: usize,
        skipped_rounds: Vec<SkippedRound>,
        reason: String,
    ) -> Self {
        Self {
            season,
            requested_rounds,
            processed_rounds: 0,
            skipped_rounds,
            outcome: SeasonOutcome::NoData(reason),
        }
    }

    pub fn is_scored(&self) -> bool {
        self.outcome == SeasonOutcome::Scored
    }
}
