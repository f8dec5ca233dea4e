use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entrant's result in one race, as normalized from the results endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResultRow {
    pub season: u32,
    pub round: u32,
    pub driver_id: String,
    pub constructor_id: String,
    pub position: Option<u32>, // None when not classified (R, D, W, ...)
    pub original_points: f64,
    pub status: String,
}

/// One race on a season's calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEvent {
    pub season: u32,
    pub round: u32,
    pub race_name: String,
    pub circuit_name: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule(pub Vec<RaceEvent>);

impl Schedule {
    /// Distinct rounds in ascending order
    pub fn rounds(&self) -> Vec<u32> {
        let mut rounds: Vec<u32> = self.0.iter().map(|event| event.round).collect();
        rounds.sort_unstable();
        rounds.dedup();
        rounds
    }

    pub fn event(&self, round: u32) -> Option<&RaceEvent> {
        self.0.iter().find(|event| event.round == round)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RaceResults(pub Vec<RaceResultRow>);

/// Id -> display name lookup for drivers or constructors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NameTable(pub BTreeMap<String, String>);

impl NameTable {
    /// Resolve a display name, falling back to the raw id
    pub fn resolve(&self, id: &str) -> String {
        self.0.get(id).cloned().unwrap_or_else(|| id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
