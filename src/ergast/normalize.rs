//! Normalizers from raw Ergast-style JSON into the typed tables the pipeline uses.
//!
//! The upstream API encodes almost every number as a string ("25", "1"), so the
//! helpers here accept either representation. A body that is missing its table
//! or contains rows without ids is rejected as malformed; a well-formed body with
//! no rows normalizes to an empty table, which the fetcher treats as "no data".

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::request::Request;
use super::types::{NameTable, RaceEvent, RaceResultRow, RaceResults, Schedule};

/// A cacheable, normalized response table.
pub trait Table: Serialize + DeserializeOwned + Sized {
    fn normalize(request: &Request, body: &Value) -> Result<Self>;

    fn is_empty(&self) -> bool;
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(key))
}

fn array<'a>(body: &'a Value, path: &[&str]) -> Result<&'a Vec<Value>> {
    lookup(body, path)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("missing {} in response", path.join(".")))
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: Option<&Value>) -> Option<u32> {
    match value? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Awarded points. Absent means none were awarded; anything present must be a
/// finite number.
fn points(result: &Value) -> Result<f64> {
    match result.get("points") {
        None | Some(Value::Null) => Ok(0.0),
        Some(value) => number(Some(value))
            .filter(|points| points.is_finite())
            .ok_or_else(|| anyhow!("not a finite number: {}", value)),
    }
}

/// Classified finishing position. `positionText` is a letter (R, D, W, ...) for
/// entrants that were not classified even though `position` is still numbered.
fn classified_position(result: &Value) -> Option<u32> {
    match text(result.get("positionText")) {
        Some(position_text) => position_text.parse().ok(),
        None => integer(result.get("position")),
    }
}

impl Table for Schedule {
    fn normalize(request: &Request, body: &Value) -> Result<Self> {
        let races = array(body, &["MRData", "RaceTable", "Races"])?;
        let mut events = Vec::with_capacity(races.len());

        for (i, race) in races.iter().enumerate() {
            let round = integer(race.get("round"))
                .with_context(|| format!("race {} has no round", i))?;
            let season = integer(race.get("season")).unwrap_or_else(|| request.season());
            let date = text(race.get("date"))
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());

            events.push(RaceEvent {
                season,
                round,
                race_name: text(race.get("raceName")).unwrap_or_default(),
                circuit_name: text(lookup(race, &["Circuit", "circuitName"])).unwrap_or_default(),
                date,
            });
        }

        events.sort_by_key(|event| event.round);
        Ok(Schedule(events))
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Table for RaceResults {
    fn normalize(request: &Request, body: &Value) -> Result<Self> {
        let Request::Results { season, round } = *request else {
            bail!("results normalizer used for {} request", request.kind());
        };

        let races = array(body, &["MRData", "RaceTable", "Races"])?;
        if races.is_empty() {
            return Ok(RaceResults::default());
        }
        let race = races
            .iter()
            .find(|race| integer(race.get("round")) == Some(round))
            .with_context(|| format!("response has no race for round {}", round))?;

        let results = array(race, &["Results"])?;
        let mut rows = Vec::with_capacity(results.len());

        for (i, result) in results.iter().enumerate() {
            let driver_id = text(lookup(result, &["Driver", "driverId"]))
                .filter(|id| !id.is_empty())
                .with_context(|| format!("result {} has no driverId", i))?;
            let constructor_id = text(lookup(result, &["Constructor", "constructorId"]))
                .filter(|id| !id.is_empty())
                .with_context(|| format!("result {} has no constructorId", i))?;

            rows.push(RaceResultRow {
                season,
                round,
                driver_id,
                constructor_id,
                position: classified_position(result),
                original_points: points(result).with_context(|| format!("result {} has invalid points", i))?,
                status: text(result.get("status")).unwrap_or_default(),
            });
        }

        Ok(RaceResults(rows))
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn driver_name(driver: &Value) -> Option<String> {
    let given = text(driver.get("givenName")).unwrap_or_default();
    let family = text(driver.get("familyName")).unwrap_or_default();
    let name = format!("{} {}", given, family).trim().to_string();
    (!name.is_empty()).then_some(name)
}

impl Table for NameTable {
    fn normalize(request: &Request, body: &Value) -> Result<Self> {
        let mut names = NameTable::default();

        match request {
            Request::Drivers { .. } => {
                for driver in array(body, &["MRData", "DriverTable", "Drivers"])? {
                    let id = text(driver.get("driverId")).context("driver has no driverId")?;
                    if let Some(name) = driver_name(driver) {
                        names.0.insert(id, name);
                    }
                }
            }
            Request::Constructors { .. } => {
                for constructor in array(body, &["MRData", "ConstructorTable", "Constructors"])? {
                    let id = text(constructor.get("constructorId"))
                        .context("constructor has no constructorId")?;
                    if let Some(name) = text(constructor.get("name")).filter(|n| !n.is_empty()) {
                        names.0.insert(id, name);
                    }
                }
            }
            other => bail!("name normalizer used for {} request", other.kind()),
        }

        Ok(names)
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
