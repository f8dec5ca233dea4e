use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::types::CumulativeRow;

/// Final championship position of one driver under both scoring systems.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub season: u32,
    pub position: u32,
    pub driver_id: String,
    pub driver_name: String,
    pub constructor_name: String,
    pub points: f64,
    pub wins: u32,
    pub original_position: u32,
    pub original_points: f64,
    /// Places gained under the new table (positive = better)
    pub position_change: i64,
}

#[derive(Debug)]
struct Totals<'a> {
    driver_id: &'a str,
    driver_name: &'a str,
    constructor_name: &'a str,
    last_round: u32,
    points: f64,
    original_points: f64,
    wins: u32,
}

fn rank_order(points: impl Fn(&Totals) -> f64) -> impl Fn(&&Totals, &&Totals) -> Ordering {
    move |a, b| {
        points(*b)
            .partial_cmp(&points(*a))
            .unwrap_or(Ordering::Equal)
            .then(b.wins.cmp(&a.wins))
            .then(a.driver_name.cmp(b.driver_name))
    }
}

/// End-of-season standings for every season present in `cumulative`.
///
/// Ties on points are broken by wins, then by name. Rows come out ordered by
/// season, then by position under the new table.
pub fn standings(cumulative: &[CumulativeRow]) -> Vec<StandingRow> {
    let mut totals: BTreeMap<u32, BTreeMap<&str, Totals>> = BTreeMap::new();

    for row in cumulative {
        let entry = totals
            .entry(row.season)
            .or_default()
            .entry(row.driver_id.as_str())
            .or_insert_with(|| Totals {
                driver_id: &row.driver_id,
                driver_name: &row.driver_name,
                constructor_name: &row.constructor_name,
                last_round: row.round,
                points: 0.0,
                original_points: 0.0,
                wins: 0,
            });

        entry.points = entry.points.max(row.cumulative_points);
        entry.original_points = entry.original_points.max(row.cumulative_original_points);
        if row.position == Some(1) {
            entry.wins += 1;
        }
        if row.round >= entry.last_round {
            entry.last_round = row.round;
            entry.constructor_name = row.constructor_name.as_str();
        }
    }

    let mut output = Vec::new();
    for (season, drivers) in totals {
        let mut by_original: Vec<&Totals> = drivers.values().collect();
        by_original.sort_by(rank_order(|t| t.original_points));
        let original_positions: BTreeMap<&str, u32> = by_original
            .iter()
            .enumerate()
            .map(|(i, t)| (t.driver_id, i as u32 + 1))
            .collect();

        let mut by_new: Vec<&Totals> = drivers.values().collect();
        by_new.sort_by(rank_order(|t| t.points));

        for (i, t) in by_new.into_iter().enumerate() {
            let position = i as u32 + 1;
            let original_position = original_positions[t.driver_id];
            output.push(StandingRow {
                season,
                position,
                driver_id: t.driver_id.to_string(),
                driver_name: t.driver_name.to_string(),
                constructor_name: t.constructor_name.to_string(),
                points: t.points,
                wins: t.wins,
                original_position,
                original_points: t.original_points,
                position_change: original_position as i64 - position as i64,
            });
        }
    }

    output
}
