use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::cancel::CancelFlag;
use super::error::SeasonError;
use super::types::{ScoredRaceRow, SeasonOutcome, SeasonReport, SkippedRound};
use crate::ergast::{NameTable, RaceResults, RemoteSource, Request, Schedule};
use crate::fetch::Fetcher;
use crate::scoring::PointsTable;

/// One season's scored rows, sorted by (round, position).
#[derive(Debug, Clone)]
pub struct SeasonPoints {
    pub rows: Vec<ScoredRaceRow>,
    pub report: SeasonReport,
}

/// Fetch, score and name-join every race of `season`.
///
/// Rounds whose results cannot be fetched are skipped and listed in the
/// report. A season with no schedule or no fetchable round is `NoData`.
pub async fn build_season<S: RemoteSource>(
    fetcher: &Fetcher<S>,
    table: &PointsTable,
    season: u32,
    cancel: &CancelFlag,
) -> Result<SeasonPoints, SeasonError> {
    if cancel.is_cancelled() {
        return Err(SeasonError::Cancelled { season });
    }

    let schedule: Schedule = match fetcher.fetch(&Request::Schedule { season }).await {
        Ok(schedule) => schedule,
        Err(e) => {
            warn!(season, error = %e, "No schedule available");
            return Err(no_data(season, 0, Vec::new(), format!("schedule unavailable ({})", e)));
        }
    };

    let rounds = raced_rounds(&schedule, Utc::now().date_naive());
    if rounds.is_empty() {
        return Err(no_data(season, 0, Vec::new(), "no race has taken place yet".to_string()));
    }
    info!(season, rounds = rounds.len(), "Processing season");

    let drivers = lookup_names(fetcher, Request::Drivers { season }).await;
    let constructors = lookup_names(fetcher, Request::Constructors { season }).await;

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut processed = 0;

    for &round in &rounds {
        if cancel.is_cancelled() {
            return Err(SeasonError::Cancelled { season });
        }

        let event = schedule.event(round);
        let race_name = event.map(|e| e.race_name.as_str()).unwrap_or_default();

        match fetcher.fetch::<RaceResults>(&Request::Results { season, round }).await {
            Ok(results) => {
                debug!(
                    season,
                    round,
                    race = race_name,
                    circuit = event.map(|e| e.circuit_name.as_str()).unwrap_or_default(),
                    entries = results.0.len(),
                    "Scored round"
                );
                rows.extend(score_results(results, table, &drivers, &constructors));
                processed += 1;
            }
            Err(e) => {
                warn!(season, round, race = race_name, error = %e, "Skipping round");
                skipped.push(SkippedRound {
                    round,
                    race_name: race_name.to_string(),
                });
            }
        }
    }

    if rows.is_empty() {
        return Err(no_data(
            season,
            rounds.len(),
            skipped,
            "no round results could be fetched".to_string(),
        ));
    }

    sort_rows(&mut rows);
    info!(season, processed, requested = rounds.len(), "Season complete");

    Ok(SeasonPoints {
        rows,
        report: SeasonReport {
            season,
            requested_rounds: rounds.len(),
            processed_rounds: processed,
            skipped_rounds: skipped,
            outcome: SeasonOutcome::Scored,
        },
    })
}

fn no_data(season: u32, requested: usize, skipped: Vec<SkippedRound>, reason: String) -> SeasonError {
    SeasonError::NoData {
        season,
        reason: reason.clone(),
        report: SeasonReport::no_data(season, requested, skipped, reason),
    }
}

/// Rounds on the calendar that have already been run. Undated rounds are kept.
fn raced_rounds(schedule: &Schedule, today: NaiveDate) -> Vec<u32> {
    schedule
        .rounds()
        .into_iter()
        .filter(|round| {
            let date = schedule.event(*round).and_then(|event| event.date);
            !matches!(date, Some(date) if date > today)
        })
        .collect()
}

/// Name lookups only feed the join, so a failure degrades to raw ids
async fn lookup_names<S: RemoteSource>(fetcher: &Fetcher<S>, request: Request) -> NameTable {
    match fetcher.fetch::<NameTable>(&request).await {
        Ok(names) => names,
        Err(e) => {
            warn!(request = %request, error = %e, "Name lookup unavailable, using ids");
            NameTable::default()
        }
    }
}

/// Apply the points table and join display names
pub fn score_results(
    results: RaceResults,
    table: &PointsTable,
    drivers: &NameTable,
    constructors: &NameTable,
) -> Vec<ScoredRaceRow> {
    results
        .0
        .into_iter()
        .map(|result| {
            let new_points = table.score(result.position);
            let driver_name = drivers.resolve(&result.driver_id);
            let constructor_name = constructors.resolve(&result.constructor_id);
            ScoredRaceRow::new(result, new_points, driver_name, constructor_name)
        })
        .collect()
}

/// Order by round, then classified position, unclassified entries last
pub fn sort_rows(rows: &mut [ScoredRaceRow]) {
    rows.sort_by(|a, b| {
        (a.round, a.position.unwrap_or(u32::MAX), &a.driver_id)
            .cmp(&(b.round, b.position.unwrap_or(u32::MAX), &b.driver_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::DiskCache;
    use crate::ergast::RaceEvent;
    use crate::fetch::FetchConfig;
    use crate::testing::{script_season, ScriptedSource};
    use std::time::Duration;

    const PODIUM: [(&str, &str, &str); 4] = [
        ("max_verstappen", "red_bull", "1"),
        ("perez", "red_bull", "2"),
        ("hamilton", "mercedes", "3"),
        ("russell", "mercedes", "R"),
    ];

    fn fetcher(source: ScriptedSource) -> Fetcher<ScriptedSource> {
        Fetcher::new(
            source,
            DiskCache::in_memory(),
            FetchConfig {
                max_attempts: 3,
                retry_delay: Duration::ZERO,
                request_interval: Duration::ZERO,
            },
        )
    }

    #[tokio::test]
    async fn test_build_season_scores_and_joins() {
        let source = ScriptedSource::new();
        script_season(&source, 2023, &[1, 2], &PODIUM);
        let fetcher = fetcher(source);

        let season = build_season(&fetcher, &PointsTable::default(), 2023, &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(season.rows.len(), 8);
        let first = &season.rows[0];
        assert_eq!(first.round, 1);
        assert_eq!(first.driver_name, "Max Verstappen");
        assert_eq!(first.constructor_name, "Red Bull");
        assert_eq!(first.new_points, 25.0);
        assert_eq!(first.original_points, 25.0);

        let unclassified = &season.rows[3];
        assert_eq!(unclassified.driver_id, "russell");
        assert_eq!(unclassified.position, None);
        assert_eq!(unclassified.new_points, 0.0);

        assert_eq!(season.report.processed_rounds, 2);
        assert!(season.report.skipped_rounds.is_empty());
        assert!(season.report.is_scored());
    }

    #[tokio::test]
    async fn test_failed_round_is_skipped() {
        let source = ScriptedSource::new();
        let rounds: Vec<u32> = (1..=10).collect();
        script_season(&source, 2022, &rounds, &PODIUM);
        let round5 = Request::Results { season: 2022, round: 5 };
        source.clear(&round5);
        source.fail(&round5, "HTTP 502");
        let fetcher = fetcher(source);

        let season = build_season(&fetcher, &PointsTable::default(), 2022, &CancelFlag::new())
            .await
            .unwrap();

        let mut seen: Vec<u32> = season.rows.iter().map(|r| r.round).collect();
        seen.dedup();
        assert_eq!(seen, vec![1, 2, 3, 4, 6, 7, 8, 9, 10]);
        assert_eq!(season.report.requested_rounds, 10);
        assert_eq!(season.report.processed_rounds, 9);
        assert_eq!(
            season.report.skipped_rounds,
            vec![SkippedRound {
                round: 5,
                race_name: "Grand Prix 5".to_string(),
            }]
        );
        assert_eq!(fetcher.source().calls(&round5), 3);
    }

    #[tokio::test]
    async fn test_missing_names_fall_back_to_ids() {
        let source = ScriptedSource::new();
        source.respond(
            &Request::Schedule { season: 2021 },
            crate::testing::schedule_body(2021, &[1]),
        );
        source.respond(
            &Request::Results { season: 2021, round: 1 },
            crate::testing::results_body(2021, 1, &[("bottas", "mercedes", "1")]),
        );
        source.fail(&Request::Drivers { season: 2021 }, "unavailable");
        source.fail(&Request::Constructors { season: 2021 }, "unavailable");
        let fetcher = fetcher(source);

        let season = build_season(&fetcher, &PointsTable::default(), 2021, &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(season.rows[0].driver_name, "bottas");
        assert_eq!(season.rows[0].constructor_name, "mercedes");
    }

    #[tokio::test]
    async fn test_no_schedule_is_no_data() {
        let fetcher = fetcher(ScriptedSource::new());

        let err = build_season(&fetcher, &PointsTable::default(), 2099, &CancelFlag::new())
            .await
            .unwrap_err();

        match err {
            SeasonError::NoData { season, report, .. } => {
                assert_eq!(season, 2099);
                assert!(!report.is_scored());
            }
            other => panic!("expected NoData, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_all_rounds_failing_is_no_data() {
        let source = ScriptedSource::new();
        source.respond(
            &Request::Schedule { season: 2020 },
            crate::testing::schedule_body(2020, &[1, 2]),
        );
        let fetcher = fetcher(source);

        let err = build_season(&fetcher, &PointsTable::default(), 2020, &CancelFlag::new())
            .await
            .unwrap_err();

        let SeasonError::NoData { report, .. } = err else {
            panic!("expected NoData");
        };
        assert_eq!(report.requested_rounds, 2);
        let skipped: Vec<u32> = report.skipped_rounds.iter().map(|s| s.round).collect();
        assert_eq!(skipped, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let source = ScriptedSource::new();
        script_season(&source, 2023, &[1], &PODIUM);
        let fetcher = fetcher(source);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let err = build_season(&fetcher, &PointsTable::default(), 2023, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, SeasonError::Cancelled { season: 2023 }));
        assert_eq!(fetcher.source().total_calls(), 0);
    }

    /// Sets `cancel` while serving `trigger`, then answers like `inner`
    struct CancelOnRequest {
        inner: ScriptedSource,
        trigger: Request,
        cancel: CancelFlag,
    }

    impl RemoteSource for CancelOnRequest {
        async fn get(&self, request: &Request) -> anyhow::Result<serde_json::Value> {
            if *request == self.trigger {
                self.cancel.cancel();
            }
            self.inner.get(request).await
        }
    }

    #[tokio::test]
    async fn test_cancelled_between_rounds() {
        let inner = ScriptedSource::new();
        script_season(&inner, 2023, &[1, 2, 3], &PODIUM);
        let cancel = CancelFlag::new();
        let source = CancelOnRequest {
            inner,
            trigger: Request::Results { season: 2023, round: 1 },
            cancel: cancel.clone(),
        };
        let fetcher = Fetcher::new(
            source,
            DiskCache::in_memory(),
            FetchConfig {
                max_attempts: 3,
                retry_delay: Duration::ZERO,
                request_interval: Duration::ZERO,
            },
        );

        let err = build_season(&fetcher, &PointsTable::default(), 2023, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, SeasonError::Cancelled { season: 2023 }));
        let calls = |round| fetcher.source().inner.calls(&Request::Results { season: 2023, round });
        assert_eq!(calls(1), 1);
        assert_eq!(calls(2), 0);
        assert_eq!(calls(3), 0);
    }

    #[test]
    fn test_future_rounds_are_not_requested() {
        let event = |round, date| RaceEvent {
            season: 2030,
            round,
            race_name: String::new(),
            circuit_name: String::new(),
            date,
        };
        let schedule = Schedule(vec![
            event(1, NaiveDate::from_ymd_opt(2030, 3, 1)),
            event(2, NaiveDate::from_ymd_opt(2030, 3, 15)),
            event(3, None),
        ]);
        let today = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();

        assert_eq!(raced_rounds(&schedule, today), vec![1, 3]);
    }

    #[test]
    fn test_sort_rows_unclassified_last() {
        let row = |round, driver: &str, position| ScoredRaceRow {
            season: 2023,
            round,
            driver_id: driver.to_string(),
            constructor_id: "team".to_string(),
            position,
            original_points: 0.0,
            status: String::new(),
            new_points: 0.0,
            driver_name: driver.to_string(),
            constructor_name: "team".to_string(),
        };
        let mut rows = vec![
            row(2, "a", Some(1)),
            row(1, "b", None),
            row(1, "c", Some(2)),
            row(1, "d", Some(1)),
        ];
        sort_rows(&mut rows);

        let order: Vec<_> = rows.iter().map(|r| r.driver_id.as_str()).collect();
        assert_eq!(order, vec!["d", "c", "b", "a"]);
    }
}
