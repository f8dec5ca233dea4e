//! Head-to-head comparison of drivers sharing a constructor within a season.
//!
//! A constructor is paired only when exactly two distinct drivers raced for it
//! that season. Mid-season driver changes produce more than two; those teams
//! come back as [`TeammatePairing::Unpaired`] so callers can report them.

use serde::Serialize;
use std::collections::BTreeMap;

use super::types::ScoredRaceRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeammateScore {
    pub driver_id: String,
    pub driver_name: String,
    pub races: u32,
    pub points: f64,
    pub original_points: f64,
    /// Races both drivers finished classified where this driver was ahead
    pub ahead: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeammatePairing {
    Pair {
        season: u32,
        constructor_id: String,
        constructor_name: String,
        drivers: [TeammateScore; 2],
        shared_races: u32,
    },
    Unpaired {
        season: u32,
        constructor_id: String,
        constructor_name: String,
        drivers: Vec<String>,
    },
}

impl TeammatePairing {
    pub fn season(&self) -> u32 {
        match self {
            TeammatePairing::Pair { season, .. } | TeammatePairing::Unpaired { season, .. } => *season,
        }
    }

    pub fn constructor_name(&self) -> &str {
        match self {
            TeammatePairing::Pair { constructor_name, .. }
            | TeammatePairing::Unpaired { constructor_name, .. } => constructor_name,
        }
    }
}

/// Pair up teammates for every (season, constructor) in `rows`.
pub fn compare_teammates(rows: &[ScoredRaceRow]) -> Vec<TeammatePairing> {
    let mut teams: BTreeMap<(u32, &str), Vec<&ScoredRaceRow>> = BTreeMap::new();
    for row in rows {
        teams
            .entry((row.season, row.constructor_id.as_str()))
            .or_default()
            .push(row);
    }

    teams
        .into_iter()
        .map(|((season, constructor_id), team_rows)| {
            let constructor_name = team_rows[0].constructor_name.clone();

            let mut scores: BTreeMap<&str, TeammateScore> = BTreeMap::new();
            for row in &team_rows {
                let score = scores.entry(row.driver_id.as_str()).or_insert_with(|| TeammateScore {
                    driver_id: row.driver_id.clone(),
                    driver_name: row.driver_name.clone(),
                    races: 0,
                    points: 0.0,
                    original_points: 0.0,
                    ahead: 0,
                });
                score.races += 1;
                score.points += row.new_points;
                score.original_points += row.original_points;
            }

            let drivers: Vec<TeammateScore> = scores.into_values().collect();
            match <[TeammateScore; 2]>::try_from(drivers) {
                Ok(mut pair) => {
                    let shared_races = head_to_head(&team_rows, &mut pair);
                    TeammatePairing::Pair {
                        season,
                        constructor_id: constructor_id.to_string(),
                        constructor_name,
                        drivers: pair,
                        shared_races,
                    }
                }
                Err(drivers) => TeammatePairing::Unpaired {
                    season,
                    constructor_id: constructor_id.to_string(),
                    constructor_name,
                    drivers: drivers.into_iter().map(|s| s.driver_name).collect(),
                },
            }
        })
        .collect()
}

/// Count rounds where both drivers were classified and credit whoever finished ahead
fn head_to_head(team_rows: &[&ScoredRaceRow], drivers: &mut [TeammateScore; 2]) -> u32 {
    let mut by_round: BTreeMap<u32, Vec<&ScoredRaceRow>> = BTreeMap::new();
    for row in team_rows {
        by_round.entry(row.round).or_default().push(*row);
    }

    let mut shared = 0;
    for round_rows in by_round.values() {
        let best = |driver_id: &str| {
            round_rows
                .iter()
                .filter(|r| r.driver_id == driver_id)
                .filter_map(|r| r.position)
                .min()
        };
        let (Some(a), Some(b)) = (best(&drivers[0].driver_id), best(&drivers[1].driver_id)) else {
            continue;
        };
        shared += 1;
        if a < b {
            drivers[0].ahead += 1;
        } else if b < a {
            drivers[1].ahead += 1;
        }
    }
    shared
}
