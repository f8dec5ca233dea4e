use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use f1_repoint::cache::{entry_count, DiskCache};
use f1_repoint::config::Config;
use f1_repoint::ergast::{create_client, ErgastClient};
use f1_repoint::fetch::Fetcher;
use f1_repoint::output::{self, OutputFormat};
use f1_repoint::pipeline::{self, CancelFlag, RunError, RunOutput};
use f1_repoint::scoring::PointsTable;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
/// No season in the requested range produced any data
const EXIT_NO_DATA: i32 = 2;
/// Invalid config file or arguments
const EXIT_CONFIG: i32 = 4;
const EXIT_CANCELLED: i32 = 130;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Recompute points for a range of seasons and export the tables
    Run {
        /// First season of the range
        #[arg(long)]
        from: u32,

        /// Last season of the range (defaults to --from)
        #[arg(long)]
        to: Option<u32>,

        /// Export directory (overrides output.dir)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Export format (overrides output.format)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Standings rows to print per season
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Print one season's standings under both scoring tables
    Standings {
        season: u32,

        /// Limit the table to the first N drivers
        #[arg(long)]
        top: Option<usize>,
    },
    /// Compare teammates within one season under the configured table
    Teammates { season: u32 },
    /// Inspect or clear the response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Show the cache location and entry count
    Info,
    /// Remove every cached response
    Clear,
}

#[derive(Parser, Debug)]
#[command(name = "f1-repoint")]
#[command(about = "Recompute Formula 1 championship points under an alternate scoring table", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/f1-repoint/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep fetched responses in memory only
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

/// RUST_LOG takes precedence; otherwise `--verbose` selects debug
fn init_logging(verbose: bool) {
    let default_level = if verbose { "f1_repoint=debug" } else { "f1_repoint=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    let config = match f1_repoint::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config.validate() {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let cache_config = config.cache_config(cli.no_cache);

    // Cache maintenance never touches the network
    if let Commands::Cache { action } = &cli.command {
        let code = match action {
            CacheAction::Info => {
                println!("Cache directory: {}", cache_config.path.display());
                println!("Enabled: {}", if cache_config.enabled { "yes" } else { "no" });
                println!("Entries: {}", entry_count(&cache_config.path));
                EXIT_SUCCESS
            }
            CacheAction::Clear => match DiskCache::new(cache_config.path.clone()).clear() {
                Ok(()) => {
                    println!("Cleared cache at {}", cache_config.path.display());
                    EXIT_SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to clear cache: {:#}", e);
                    EXIT_ERROR
                }
            },
        };
        std::process::exit(code);
    }

    let client = match create_client(&config.api.base_url, config.timeout()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create HTTP client: {:#}", e);
            std::process::exit(EXIT_ERROR);
        }
    };

    let table = PointsTable::from_config(&config.scoring);
    let fetcher = Fetcher::new(client, DiskCache::from_config(&cache_config), config.fetch_config());
    debug!(
        table = table.name(),
        points = ?table.points(),
        cache = ?fetcher.cache().path(),
        "Ready"
    );

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current round");
            handler_flag.cancel();
        }
    });

    let use_colors = output::should_use_colors();

    let code = match cli.command {
        Commands::Run {
            from,
            to,
            output_dir,
            format,
            top,
        } => {
            let to = to.unwrap_or(from);
            match recompute(&fetcher, &table, from, to, &cancel).await {
                Ok(result) => export_run(&config, &result, output_dir, format, top, use_colors),
                Err(code) => code,
            }
        }
        Commands::Standings { season, top } => {
            match recompute(&fetcher, &table, season, season, &cancel).await {
                Ok(result) => {
                    let standings = pipeline::standings(&result.cumulative);
                    println!("{}", output::format_standings_table(&standings, top, use_colors));
                    EXIT_SUCCESS
                }
                Err(code) => code,
            }
        }
        Commands::Teammates { season } => {
            match recompute(&fetcher, &table, season, season, &cancel).await {
                Ok(result) => {
                    let pairings = pipeline::compare_teammates(&result.race_points);
                    println!("{}", output::format_teammate_table(&pairings, use_colors));
                    EXIT_SUCCESS
                }
                Err(code) => code,
            }
        }
        Commands::Cache { .. } => EXIT_SUCCESS,
    };

    if cli.verbose {
        eprintln!();
        eprintln!("Fetch: {}", output::format_fetch_stats(&fetcher.stats()));
        eprintln!("Total time: {:?}", start_time.elapsed());
    }

    std::process::exit(code);
}

/// Run the pipeline and map fatal outcomes to exit codes
async fn recompute(
    fetcher: &Fetcher<ErgastClient>,
    table: &PointsTable,
    from: u32,
    to: u32,
    cancel: &CancelFlag,
) -> Result<RunOutput, i32> {
    match pipeline::run(fetcher, table, from..=to, cancel).await {
        Ok(result) => Ok(result),
        Err(RunError::InvalidRange { start, end }) => {
            eprintln!("Invalid season range {}-{}: --from must not be after --to", start, end);
            Err(EXIT_CONFIG)
        }
        Err(RunError::TotalFailure { start, end, reports }) => {
            eprintln!("{}", output::format_season_summary(&reports, false));
            eprintln!("No usable data for seasons {}-{}. Nothing was written.", start, end);
            Err(EXIT_NO_DATA)
        }
        Err(RunError::Cancelled) => {
            eprintln!("Cancelled. Nothing was written.");
            Err(EXIT_CANCELLED)
        }
    }
}

fn export_run(
    config: &Config,
    result: &RunOutput,
    output_dir: Option<PathBuf>,
    format: Option<OutputFormat>,
    top: usize,
    use_colors: bool,
) -> i32 {
    let dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let format = format.unwrap_or(config.output.format);
    let standings = pipeline::standings(&result.cumulative);

    let paths = match output::write_datasets(&dir, format, result, &standings) {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Export failed: {:#}", e);
            return EXIT_ERROR;
        }
    };

    println!("{}", output::format_season_summary(&result.reports, use_colors));
    println!();
    println!("{}", output::format_standings_table(&standings, Some(top), use_colors));
    println!();
    for path in &paths {
        println!("Wrote {}", path.display());
    }
    info!(
        seasons = result.scored_seasons(),
        rows = result.race_points.len(),
        "Run complete"
    );

    EXIT_SUCCESS
}
