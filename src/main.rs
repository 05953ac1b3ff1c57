// csv2timeline - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Settings loading and logging initialisation (debug mode support)
// 3. Configuration loading
// 4. The conversion run

use csv2timeline::app::{self, pipeline::RunRequest};
use csv2timeline::core::discovery::DiscoveryConfig;
use csv2timeline::core::model::RunSummary;
use csv2timeline::platform::config::{self as settings, PlatformPaths, Settings};
use csv2timeline::util::{self, error::Csv2TimelineError, logging::TracingLog};

use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// csv2timeline - Convert CSV log exports into one normalised timeline.
///
/// Every CSV file in the input directory is matched against the named
/// configurations by its header row, turned into timeline events and
/// appended to <OUTPUT>/timeline.csv.
#[derive(Parser, Debug)]
#[command(name = "csv2timeline", version, about)]
struct Cli {
    /// Directory containing the CSV files to convert.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Directory receiving timeline.csv (must exist).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Label of the originating system, written to every event.
    #[arg(short = 's', long = "source-system")]
    source_system: Option<String>,

    /// Configuration file (default: ./config.toml, then the platform
    /// config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Settings file (default: settings.toml in the platform config
    /// directory).
    #[arg(long = "settings")]
    settings: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (Some(input), Some(output), Some(source_system)) =
        (cli.input.clone(), cli.output.clone(), cli.source_system.clone())
    else {
        // Not enough to run: show usage instead.
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
        println!();
        return ExitCode::SUCCESS;
    };

    // Collected before logging starts, emitted once it is up.
    let (platform_paths, mut startup_warnings) = PlatformPaths::resolve();
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| platform_paths.settings_file());
    let (settings, settings_warnings) =
        settings::load_settings(&settings_path, cli.settings.is_some());
    startup_warnings.extend(settings_warnings);

    let run_log = settings.run_log.then(|| run_log_path(&output));
    let log_file_error =
        util::logging::init(cli.debug, settings.log_level.as_deref(), run_log.as_deref()).err();

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "csv2timeline starting"
    );

    if let (Some(e), Some(path)) = (log_file_error, run_log.as_deref()) {
        tracing::warn!(path = %path.display(), error = %e, "Could not create run log file");
    }
    for warning in &startup_warnings {
        tracing::warn!("{warning}");
    }
    tracing::debug!(config = %platform_paths.config_dir.display(), "Platform paths resolved");

    match run(&cli, input, output, source_system, &settings, &platform_paths) {
        Ok(summary) => {
            tracing::info!(
                events = summary.events_written,
                failed = summary.files_failed,
                "Done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Run aborted");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    cli: &Cli,
    input: PathBuf,
    output: PathBuf,
    source_system: String,
    settings: &Settings,
    platform_paths: &PlatformPaths,
) -> Result<RunSummary, Csv2TimelineError> {
    let (config_path, configs) = app::config_loader::load(
        cli.config.as_deref(),
        Some(platform_paths.config_dir.as_path()),
    )?;
    tracing::debug!(path = %config_path.display(), "Using configuration file");

    let request = RunRequest {
        discovery: DiscoveryConfig {
            max_depth: settings.max_depth,
            include_patterns: settings.include_patterns.clone(),
        },
        timestamp_format: settings.timestamp_format.clone(),
        ..RunRequest::new(input, output, source_system)
    };

    app::pipeline::run(&request, &configs, &TracingLog)
}

/// `<output>/csv2timeline_<UTC timestamp>.log`
fn run_log_path(output: &Path) -> PathBuf {
    output.join(format!(
        "{}{}.log",
        util::constants::RUN_LOG_PREFIX,
        chrono::Utc::now().format("%Y%m%d_%H%M%S")
    ))
}
