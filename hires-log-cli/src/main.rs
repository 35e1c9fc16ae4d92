//! Hi-Res Log CLI Application
//!
//! Command-line interface for the hires-log-engine library.
//! It adds what the engine leaves to its caller:
//! - Controller log file parsing
//! - Hourly file discovery by site, date and start time
//! - Reference table loading (TOML)
//! - Report generation (JSON/CSV/TXT)

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use config::OutputFormat;
use hires_log_engine::{Engine, QueryWindow};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

mod config;
mod discovery;
mod logfile;
mod report;

/// Hi-Res Log Engine - Extract signal status intervals from controller logs
#[derive(Parser, Debug)]
#[command(name = "hires-log-cli")]
#[command(about = "Extract signal status intervals from hi-res controller logs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a log file (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Root directory with one sub-directory per site
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Site (location) id
    #[arg(short, long)]
    site: Option<String>,

    /// Date of the first hourly file (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Start hour of the first file (HHMM)
    #[arg(long)]
    time: Option<String>,

    /// Number of hourly files to read
    #[arg(long, value_name = "COUNT")]
    hours: Option<usize>,

    /// Path to reference tables (TOML); built-in tables when absent
    #[arg(short, long, value_name = "FILE")]
    reference: Option<PathBuf>,

    /// Query window start (YYYY-MM-DD HH:MM:SS[.fff])
    #[arg(long, value_parser = parse_window_bound)]
    start: Option<NaiveDateTime>,

    /// Query window end (YYYY-MM-DD HH:MM:SS[.fff])
    #[arg(long, value_parser = parse_window_bound)]
    end: Option<NaiveDateTime>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Hi-Res Log CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using engine library v{}", hires_log_engine::VERSION);

    // Load config file, then apply command line overrides
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => config::AppConfig::default(),
    };
    merge_args(&mut config, &args);

    // Resolve input files
    let (files, hour_window) = resolve_input(&config)?;
    if files.is_empty() {
        bail!("No input specified; use --log FILE or --dir/--site/--date (see --help)");
    }

    // Load reference tables and create engine
    let reference = config::load_reference(config.reference.path.as_deref())?;
    log::info!(
        "Reference tables: {} pairing rules, {} single events",
        reference.pairs.len(),
        reference.singles.len()
    );
    let engine = Engine::new(reference)?;

    // Parse log files
    let raw = logfile::read_log_files(&files)?;
    let log = engine.annotate(raw);
    log::info!("Loaded {} events", log.len());

    // Query window: explicit bounds, then the selected hours, then the log itself
    let start = config
        .window
        .start
        .or(hour_window.map(|(start, _)| start))
        .or(log.first_timestamp());
    let end = config
        .window
        .end
        .or(hour_window.and_then(|(_, end)| end))
        .or(log.last_timestamp());
    let (Some(start), Some(end)) = (start, end) else {
        bail!("Log contains no events and no query window was given");
    };

    let site = config.input.site.clone().unwrap_or_else(|| "unknown".to_string());
    let window = QueryWindow::new(site, start, end)?;
    log::info!("Query window {} → {}", window.start, window.end);

    // Run the pipeline
    let output = engine.process(&log, &window)?;
    let stats = output.stats();
    log::info!(
        "Extracted {} intervals ({} synthetic endpoints), {} single events, {} flash periods",
        stats.num_intervals,
        stats.num_synthetic_endpoints,
        stats.num_singles,
        stats.num_flash_periods
    );

    // Write report
    match &config.output.path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let mut writer = BufWriter::new(file);
            report::write_report(&output, config.output.format, &mut writer)?;
            writer.flush()?;
            log::info!("✓ Report written to {:?}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            report::write_report(&output, config.output.format, &mut writer)?;
        }
    }

    Ok(())
}

/// Command line arguments override the configuration file
fn merge_args(config: &mut config::AppConfig, args: &Args) {
    if !args.log.is_empty() {
        config.input.files = args.log.clone();
    }
    if args.dir.is_some() {
        config.input.dir = args.dir.clone();
    }
    if args.site.is_some() {
        config.input.site = args.site.clone();
    }
    if args.date.is_some() {
        config.input.date = args.date.clone();
    }
    if args.time.is_some() {
        config.input.time = args.time.clone();
    }
    if args.hours.is_some() {
        config.input.hours = args.hours;
    }
    if args.reference.is_some() {
        config.reference.path = args.reference.clone();
    }
    if args.start.is_some() {
        config.window.start = args.start;
    }
    if args.end.is_some() {
        config.window.end = args.end;
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.output.is_some() {
        config.output.path = args.output.clone();
    }
}

type HourWindow = Option<(NaiveDateTime, Option<NaiveDateTime>)>;

/// Explicit files win; otherwise discover hourly files under the site directory
fn resolve_input(config: &config::AppConfig) -> Result<(Vec<PathBuf>, HourWindow)> {
    let input = &config.input;
    if !input.files.is_empty() {
        return Ok((input.files.clone(), None));
    }

    let (Some(dir), Some(site), Some(date)) = (&input.dir, &input.site, &input.date) else {
        return Ok((Vec::new(), None));
    };

    let time = input.time.as_deref();
    let files = discovery::select_files(dir, site, date, time, input.hours)?;
    let window = discovery::hour_window(date, time, input.hours)?;
    Ok((files, Some(window)))
}

fn parse_window_bound(text: &str) -> std::result::Result<NaiveDateTime, String> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DD HH:MM:SS[.fff], got {:?}", text))
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
