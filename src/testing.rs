//! Scripted upstream responses for unit tests.

use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::ergast::{RemoteSource, Request};
use crate::scoring::POST_2010;

type Outcome = std::result::Result<Value, String>;

/// Replays scripted outcomes per request. Once a request's queue is drained
/// its last outcome repeats; unscripted requests fail.
#[derive(Default)]
pub struct ScriptedSource {
    queues: Mutex<HashMap<Request, VecDeque<Outcome>>>,
    last: Mutex<HashMap<Request, Outcome>>,
    calls: Mutex<HashMap<Request, u32>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, request: &Request, body: Value) {
        self.push(request, Ok(body));
    }

    pub fn fail(&self, request: &Request, reason: &str) {
        self.push(request, Err(reason.to_string()));
    }

    fn push(&self, request: &Request, outcome: Outcome) {
        self.queues
            .lock()
            .unwrap()
            .entry(*request)
            .or_default()
            .push_back(outcome);
    }

    /// Forget everything scripted for `request`
    pub fn clear(&self, request: &Request) {
        self.queues.lock().unwrap().remove(request);
        self.last.lock().unwrap().remove(request);
    }

    pub fn calls(&self, request: &Request) -> u32 {
        self.calls.lock().unwrap().get(request).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }
}

impl RemoteSource for ScriptedSource {
    async fn get(&self, request: &Request) -> Result<Value> {
        *self.calls.lock().unwrap().entry(*request).or_insert(0) += 1;

        let next = self
            .queues
            .lock()
            .unwrap()
            .get_mut(request)
            .and_then(|queue| queue.pop_front());

        let outcome = match next {
            Some(outcome) => {
                self.last.lock().unwrap().insert(*request, outcome.clone());
                outcome
            }
            None => self
                .last
                .lock()
                .unwrap()
                .get(request)
                .cloned()
                .unwrap_or_else(|| Err(format!("nothing scripted for {}", request))),
        };

        outcome.map_err(|reason| anyhow!(reason))
    }
}

pub fn schedule_body(season: u32, rounds: &[u32]) -> Value {
    let races: Vec<Value> = rounds
        .iter()
        .map(|round| {
            json!({
                "season": season.to_string(),
                "round": round.to_string(),
                "raceName": format!("Grand Prix {}", round),
                "Circuit": {"circuitName": format!("Circuit {}", round)},
                "date": format!("{}-06-{:02}", season, round.min(&28))
            })
        })
        .collect();
    json!({"MRData": {"RaceTable": {"season": season.to_string(), "Races": races}}})
}

/// Results body from (driver_id, constructor_id, positionText) triples. Original
/// points follow the post-2010 table.
pub fn results_body(season: u32, round: u32, entries: &[(&str, &str, &str)]) -> Value {
    let results: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (driver, constructor, position_text))| {
            let points = position_text
                .parse::<usize>()
                .ok()
                .and_then(|p| POST_2010.get(p.wrapping_sub(1)).copied())
                .unwrap_or(0.0);
            json!({
                "position": (i + 1).to_string(),
                "positionText": position_text,
                "points": points.to_string(),
                "Driver": {"driverId": driver},
                "Constructor": {"constructorId": constructor},
                "status": if position_text.parse::<u32>().is_ok() { "Finished" } else { "Retired" }
            })
        })
        .collect();
    json!({"MRData": {"RaceTable": {"Races": [{
        "season": season.to_string(),
        "round": round.to_string(),
        "Results": results
    }]}}})
}

pub fn drivers_body(drivers: &[(&str, &str, &str)]) -> Value {
    let drivers: Vec<Value> = drivers
        .iter()
        .map(|(id, given, family)| json!({"driverId": id, "givenName": given, "familyName": family}))
        .collect();
    json!({"MRData": {"DriverTable": {"Drivers": drivers}}})
}

pub fn constructors_body(constructors: &[(&str, &str)]) -> Value {
    let constructors: Vec<Value> = constructors
        .iter()
        .map(|(id, name)| json!({"constructorId": id, "name": name}))
        .collect();
    json!({"MRData": {"ConstructorTable": {"Constructors": constructors}}})
}

/// Script a whole season where every round has the same finishing order.
pub fn script_season(source: &ScriptedSource, season: u32, rounds: &[u32], entries: &[(&str, &str, &str)]) {
    source.respond(&Request::Schedule { season }, schedule_body(season, rounds));
    source.respond(
        &Request::Drivers { season },
        drivers_body(&[
            ("max_verstappen", "Max", "Verstappen"),
            ("perez", "Sergio", "Pérez"),
            ("hamilton", "Lewis", "Hamilton"),
            ("russell", "George", "Russell"),
        ]),
    );
    source.respond(
        &Request::Constructors { season },
        constructors_body(&[("red_bull", "Red Bull"), ("mercedes", "Mercedes")]),
    );
    for round in rounds {
        source.respond(
            &Request::Results { season, round: *round },
            results_body(season, *round, entries),
        );
    }
}
