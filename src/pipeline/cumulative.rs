use std::collections::BTreeMap;

use super::types::{CumulativeRow, ScoredRaceRow};

/// Running points totals per (season, driver), ordered by round.
///
/// Output is sorted by (season, driver_id, round). When a driver has more than
/// one row in the same round (shared drives), every such row carries the total
/// through the end of that round.
pub fn accumulate(rows: &[ScoredRaceRow]) -> Vec<CumulativeRow> {
    let mut groups: BTreeMap<(u32, &str), Vec<&ScoredRaceRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.season, row.driver_id.as_str()))
            .or_default()
            .push(row);
    }

    let mut output = Vec::with_capacity(rows.len());
    for (_, mut group) in groups {
        group.sort_by_key(|row| row.round);

        let mut total = 0.0;
        let mut original_total = 0.0;

        for same_round in group.chunk_by(|a, b| a.round == b.round) {
            total += same_round.iter().map(|row| row.new_points).sum::<f64>();
            original_total += same_round.iter().map(|row| row.original_points).sum::<f64>();

            output.extend(same_round.iter().map(|row| CumulativeRow {
                season: row.season,
                round: row.round,
                driver_id: row.driver_id.clone(),
                driver_name: row.driver_name.clone(),
                constructor_id: row.constructor_id.clone(),
                constructor_name: row.constructor_name.clone(),
                position: row.position,
                new_points: row.new_points,
                cumulative_points: total,
                original_points: row.original_points,
                cumulative_original_points: original_total,
            }));
        }
    }

    output
}
