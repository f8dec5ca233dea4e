use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::fetch::StatsSnapshot;
use crate::pipeline::{SeasonOutcome, SeasonReport, StandingRow, TeammatePairing};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format points without a trailing ".0" (25, 4.5, 0)
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        let formatted = format!("{:.2}", points);
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Places gained ("+2"), lost ("-1") or kept ("=")
pub fn format_position_change(change: i64) -> String {
    match change {
        0 => "=".to_string(),
        c if c > 0 => format!("+{}", c),
        c => c.to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Pad to `width` chars, counting chars rather than bytes
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len >= width {
        text.to_string()
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// One line per requested season: rounds processed, skipped rounds, or why
/// the season produced nothing.
pub fn format_season_summary(reports: &[SeasonReport], use_colors: bool) -> String {
    reports
        .iter()
        .map(|report| match &report.outcome {
            SeasonOutcome::Scored => {
                let rounds = format!("{}/{} rounds", report.processed_rounds, report.requested_rounds);
                let skipped = if report.skipped_rounds.is_empty() {
                    String::new()
                } else {
                    let list = report
                        .skipped_rounds
                        .iter()
                        .map(|skipped| {
                            if skipped.race_name.is_empty() {
                                skipped.round.to_string()
                            } else {
                                format!("{} ({})", skipped.round, skipped.race_name)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("  skipped: {}", list)
                };
                if use_colors {
                    format!("{}  {}{}", report.season.bold(), rounds.green(), skipped.yellow())
                } else {
                    format!("{}  {}{}", report.season, rounds, skipped)
                }
            }
            SeasonOutcome::NoData(reason) => {
                let text = format!("no data ({})", reason);
                if use_colors {
                    format!("{}  {}", report.season.bold(), text.red())
                } else {
                    format!("{}  {}", report.season, text)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Standings grouped by season with a header line per season.
///
/// Columns: position, driver, constructor, new points, change versus the
/// original table, original points. `top` limits the rows per season.
pub fn format_standings_table(rows: &[StandingRow], top: Option<usize>, use_colors: bool) -> String {
    if rows.is_empty() {
        return "No standings to show.".to_string();
    }

    let term_width = get_terminal_width();
    let points_width = 6;
    let change_width = 4;
    let separator = "  ";
    // "99." + driver + constructor + points + change + "(was 99, 9999)"
    let fixed_width = 3 + points_width + change_width + 16 + separator.len() * 4;
    let (driver_width, constructor_width) = match term_width {
        Some(width) if width > fixed_width + 20 => {
            let available = width - fixed_width;
            let driver = (available * 3 / 5).min(24);
            (driver, (available - driver).min(20))
        }
        Some(_) => (14, 10),
        None => (24, 20),
    };

    let mut lines = Vec::new();
    let mut current_season = None;
    let mut shown = 0;

    for row in rows {
        if current_season != Some(row.season) {
            if current_season.is_some() {
                lines.push(String::new());
            }
            let header = format!("Season {}", row.season);
            lines.push(if use_colors { header.bold().to_string() } else { header });
            current_season = Some(row.season);
            shown = 0;
        }
        if top.is_some_and(|limit| shown >= limit) {
            continue;
        }
        shown += 1;

        let index = format!("{:>2}.", row.position);
        let driver = pad(&truncate_name(&row.driver_name, driver_width), driver_width);
        let constructor = pad(&truncate_name(&row.constructor_name, constructor_width), constructor_width);
        let points = format!("{:>width$}", format_points(row.points), width = points_width);
        let change = format!("{:>width$}", format_position_change(row.position_change), width = change_width);
        let was = format!("(was {}, {})", row.original_position, format_points(row.original_points));

        if use_colors {
            let change = if row.position_change > 0 {
                change.green().to_string()
            } else if row.position_change < 0 {
                change.red().to_string()
            } else {
                change.dimmed().to_string()
            };
            lines.push(format!(
                "{}{}{}{}{}{}{}{}{}",
                index.dimmed(),
                separator,
                driver,
                separator,
                constructor.cyan(),
                points.bold(),
                change,
                separator,
                was.dimmed()
            ));
        } else {
            lines.push(format!(
                "{}{}{}{}{}{}{}{}{}",
                index, separator, driver, separator, constructor, points, change, separator, was
            ));
        }
    }

    lines.join("\n")
}

/// Head-to-head per constructor; unpaired teams list their drivers instead.
pub fn format_teammate_table(pairings: &[TeammatePairing], use_colors: bool) -> String {
    if pairings.is_empty() {
        return "No teammate data to show.".to_string();
    }

    pairings
        .iter()
        .map(|pairing| {
            let team = format!("{} {}", pairing.season(), pairing.constructor_name());
            let team = if use_colors { team.bold().to_string() } else { team };
            match pairing {
                TeammatePairing::Pair {
                    drivers: [a, b],
                    shared_races,
                    ..
                } => format!(
                    "{}\n  {} {} pts ({} orig)  vs  {} {} pts ({} orig)\n  head-to-head {}-{} over {} races",
                    team,
                    a.driver_name,
                    format_points(a.points),
                    format_points(a.original_points),
                    b.driver_name,
                    format_points(b.points),
                    format_points(b.original_points),
                    a.ahead,
                    b.ahead,
                    shared_races
                ),
                TeammatePairing::Unpaired { drivers, .. } => {
                    let note = format!("{} drivers, not compared: {}", drivers.len(), drivers.join(", "));
                    if use_colors {
                        format!("{}\n  {}", team, note.yellow())
                    } else {
                        format!("{}\n  {}", team, note)
                    }
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Single-line fetch counters for the end-of-run summary
pub fn format_fetch_stats(stats: &StatsSnapshot) -> String {
    format!(
        "{} cache hits, {} network calls, {} cache writes, {} failed fetches",
        stats.cache_hits, stats.network_calls, stats.cache_writes, stats.failures
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{SkippedRound, TeammateScore};

    fn standing(season: u32, position: u32, name: &str, change: i64) -> StandingRow {
        StandingRow {
            season,
            position,
            driver_id: name.to_lowercase(),
            driver_name: name.to_string(),
            constructor_name: "Red Bull".to_string(),
            points: 100.0 - position as f64,
            wins: 0,
            original_position: (position as i64 + change) as u32,
            original_points: 50.5,
            position_change: change,
        }
    }

    fn score(name: &str, points: f64, ahead: u32) -> TeammateScore {
        TeammateScore {
            driver_id: name.to_lowercase(),
            driver_name: name.to_string(),
            races: 3,
            points,
            original_points: points,
            ahead,
        }
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(25.0), "25");
        assert_eq!(format_points(0.0), "0");
        assert_eq!(format_points(4.5), "4.5");
        assert_eq!(format_points(0.25), "0.25");
        assert_eq!(format_points(1.001), "1");
    }

    #[test]
    fn test_format_position_change() {
        assert_eq!(format_position_change(0), "=");
        assert_eq!(format_position_change(3), "+3");
        assert_eq!(format_position_change(-2), "-2");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("Max Verstappen", 20), "Max Verstappen");
        assert_eq!(truncate_name("Max Verstappen", 8), "Max V...");
        assert_eq!(truncate_name("Kimi Räikkönen", 7), "Kimi...");
        assert_eq!(truncate_name("Alonso", 3), "Alo");
    }

    #[test]
    fn test_pad_counts_chars() {
        assert_eq!(pad("Pérez", 7), "Pérez  ");
        assert_eq!(pad("Hamilton", 4), "Hamilton");
    }

    #[test]
    fn test_season_summary() {
        let reports = vec![
            SeasonReport {
                season: 2022,
                requested_rounds: 22,
                processed_rounds: 20,
                skipped_rounds: vec![
                    SkippedRound {
                        round: 5,
                        race_name: "Miami Grand Prix".to_string(),
                    },
                    SkippedRound {
                        round: 9,
                        race_name: String::new(),
                    },
                ],
                outcome: SeasonOutcome::Scored,
            },
            SeasonReport::no_data(2099, 0, vec![], "schedule unavailable".to_string()),
        ];

        let result = format_season_summary(&reports, false);
        let lines: Vec<&str> = result.lines().collect();

        assert_eq!(lines[0], "2022  20/22 rounds  skipped: 5 (Miami Grand Prix), 9");
        assert_eq!(lines[1], "2099  no data (schedule unavailable)");
    }

    #[test]
    fn test_standings_table_empty() {
        assert_eq!(format_standings_table(&[], None, false), "No standings to show.");
    }

    #[test]
    fn test_standings_table_groups_and_limits() {
        let rows = vec![
            standing(2021, 1, "Verstappen", 0),
            standing(2021, 2, "Hamilton", 0),
            standing(2021, 3, "Bottas", 1),
            standing(2022, 1, "Leclerc", -1),
        ];

        let result = format_standings_table(&rows, Some(2), false);

        assert!(result.contains("Season 2021"));
        assert!(result.contains("Season 2022"));
        assert!(result.contains("Verstappen"));
        assert!(result.contains("Hamilton"));
        assert!(!result.contains("Bottas"));
        assert!(result.contains("-1"));
        assert!(result.contains("(was 1, 50.5)"));
    }

    #[test]
    fn test_teammate_table() {
        let pairings = vec![
            TeammatePairing::Pair {
                season: 2023,
                constructor_id: "mercedes".to_string(),
                constructor_name: "Mercedes".to_string(),
                drivers: [score("Hamilton", 234.0, 12), score("Russell", 175.0, 8)],
                shared_races: 20,
            },
            TeammatePairing::Unpaired {
                season: 2023,
                constructor_id: "alphatauri".to_string(),
                constructor_name: "AlphaTauri".to_string(),
                drivers: vec!["De Vries".to_string(), "Ricciardo".to_string(), "Tsunoda".to_string()],
            },
        ];

        let result = format_teammate_table(&pairings, false);

        assert!(result.contains("2023 Mercedes"));
        assert!(result.contains("head-to-head 12-8 over 20 races"));
        assert!(result.contains("3 drivers, not compared: De Vries, Ricciardo, Tsunoda"));
    }

    #[test]
    fn test_fetch_stats_line() {
        let stats = StatsSnapshot {
            cache_hits: 4,
            network_calls: 2,
            cache_writes: 2,
            failures: 0,
        };
        assert_eq!(
            format_fetch_stats(&stats),
            "4 cache hits, 2 network calls, 2 cache writes, 0 failed fetches"
        );
    }
}
