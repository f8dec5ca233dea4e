pub mod export;
pub mod formatter;

pub use export::{write_datasets, write_table, OutputFormat};
pub use formatter::{
    format_fetch_stats, format_points, format_position_change, format_season_summary,
    format_standings_table, format_teammate_table, should_use_colors,
};
