use std::ops::RangeInclusive;
use tracing::{info, warn};

use super::cancel::CancelFlag;
use super::cumulative::accumulate;
use super::error::{RunError, SeasonError};
use super::season::build_season;
use super::types::{CumulativeRow, ScoredRaceRow, SeasonReport};
use crate::ergast::RemoteSource;
use crate::fetch::Fetcher;
use crate::scoring::PointsTable;

/// Concatenated datasets for every season that produced data.
#[derive(Debug, Clone, Default)]
pub struct RunOutput {
    pub race_points: Vec<ScoredRaceRow>,
    pub cumulative: Vec<CumulativeRow>,
    /// One report per requested season, including the ones without data
    pub reports: Vec<SeasonReport>,
}

impl RunOutput {
    pub fn scored_seasons(&self) -> usize {
        self.reports.iter().filter(|r| r.is_scored()).count()
    }
}

/// Score and accumulate every season in `seasons`.
///
/// Seasons without data are reported and skipped. Fails only when the whole
/// range yields nothing, or when cancelled between units of work.
pub async fn run<S: RemoteSource>(
    fetcher: &Fetcher<S>,
    table: &PointsTable,
    seasons: RangeInclusive<u32>,
    cancel: &CancelFlag,
) -> Result<RunOutput, RunError> {
    let (start, end) = (*seasons.start(), *seasons.end());
    if start > end {
        return Err(RunError::InvalidRange { start, end });
    }

    info!(start, end, table = table.name(), "Recomputing points");
    let mut output = RunOutput::default();

    for season in seasons {
        match build_season(fetcher, table, season, cancel).await {
            Ok(points) => {
                output.cumulative.extend(accumulate(&points.rows));
                output.race_points.extend(points.rows);
                output.reports.push(points.report);
            }
            Err(SeasonError::NoData { reason, report, .. }) => {
                warn!(season, %reason, "Season skipped");
                output.reports.push(report);
            }
            Err(SeasonError::Cancelled { season }) => {
                warn!(season, "Cancelled");
                return Err(RunError::Cancelled);
            }
        }
    }

    if output.scored_seasons() == 0 {
        return Err(RunError::TotalFailure {
            start,
            end,
            reports: output.reports,
        });
    }

    Ok(output)
}
