use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::pipeline::{RunOutput, StandingRow};

/// File format for exported datasets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Write `race_points`, `cumulative` and `standings` into `dir`.
///
/// Each file is written atomically, so an interrupted export never leaves a
/// half-written table behind. Returns the paths written, in that order.
pub fn write_datasets(
    dir: &Path,
    format: OutputFormat,
    output: &RunOutput,
    standings: &[StandingRow],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory at {}", dir.display()))?;

    let paths = vec![
        write_table(dir, "race_points", format, &output.race_points)?,
        write_table(dir, "cumulative", format, &output.cumulative)?,
        write_table(dir, "standings", format, standings)?,
    ];

    info!(dir = %dir.display(), files = paths.len(), "Exported datasets");
    Ok(paths)
}

/// Write one dataset as `{dir}/{name}.{ext}`
pub fn write_table<T: Serialize>(dir: &Path, name: &str, format: OutputFormat, rows: &[T]) -> Result<PathBuf> {
    let path = dir.join(format!("{}.{}", name, format.extension()));

    let mut file = AtomicWriteFile::open(&path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    match format {
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut file);
            for row in rows {
                writer
                    .serialize(row)
                    .with_context(|| format!("Failed to write CSV row to {}", path.display()))?;
            }
            writer.flush().context("Failed to flush CSV writer")?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut file, rows)
                .with_context(|| format!("Failed to serialize {}", name))?;
        }
    }

    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(path)
}
