//! Event Log Extractor CLI Application
//!
//! This is the command-line interface for the event log extractor.
//! It uses the nslog-extractor library and adds:
//! - Multi-session processing (one rayon task per session)
//! - Device event file loading and alignment
//! - TOML configuration
//! - Report generation (TXT/JSON)

use anyhow::{bail, Context, Result};
use clap::Parser;
use nslog_extractor::{find_onsets, Category, EventLogExtractor};
use rayon::prelude::*;
use std::path::PathBuf;

mod config;
mod events;
mod report;

use config::{AppConfig, OutputFormat, SessionConfig, TableName};
use report::{AlignmentSummary, ImpedanceSummary, SessionReport, Stage, TableCounts};

/// Event Log Extractor - Build event timelines from acquisition event logs
#[derive(Parser, Debug)]
#[command(name = "nslog-cli")]
#[command(about = "Extract trial, sentence and impedance timelines from EEG event logs", long_about = None)]
#[command(version)]
struct Args {
    /// Path to event log file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    log: Vec<PathBuf>,

    /// Path to device event file(s), paired with --log in order (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    events: Vec<PathBuf>,

    /// Table the device events correspond to
    #[arg(long, value_enum, default_value_t = TableName::Trial)]
    align_table: TableName,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("Event Log Extractor CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using extractor library v{}", nslog_extractor::VERSION);

    let app_config = build_config(&args)?;

    if app_config.sessions.is_empty() {
        println!("Event Log Extractor - No input specified");
        println!("\nQuick Start:");
        println!("  nslog-cli --log sfv_eeg_011ts_nsevent");
        println!("  nslog-cli --log sfv_eeg_011ts_nsevent --events sfv_eeg_011ts_events.tsv");
        println!("\nFor multiple sessions and custom experiment layouts:");
        println!("  nslog-cli --config config.toml");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let extractor = EventLogExtractor::new(app_config.extractor.clone())
        .context("Invalid extractor configuration")?;

    let reports = process_sessions(&extractor, &app_config.sessions);

    let rendered = report::render(&reports, app_config.output.format)?;
    match &app_config.output.path {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    let failed = reports.iter().filter(|r| r.has_failures()).count();
    if failed > 0 {
        bail!("{} of {} sessions had failing stages", failed, reports.len());
    }

    Ok(())
}

/// Merge the config file (if any) with command-line sessions and overrides
fn build_config(args: &Args) -> Result<AppConfig> {
    let mut app_config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if !args.events.is_empty() && args.events.len() != args.log.len() {
        bail!(
            "--events given {} times but --log {} times; they are paired in order",
            args.events.len(),
            args.log.len()
        );
    }

    for (i, log) in args.log.iter().enumerate() {
        app_config.sessions.push(SessionConfig {
            log: log.clone(),
            events: args.events.get(i).cloned(),
            align_table: args.align_table,
            orig_time: None,
        });
    }

    if let Some(format) = args.format {
        app_config.output.format = format;
    }
    if let Some(path) = &args.output {
        app_config.output.path = Some(path.clone());
    }

    Ok(app_config)
}

/// Process sessions in parallel; reports come back in input order
fn process_sessions(
    extractor: &EventLogExtractor,
    sessions: &[SessionConfig],
) -> Vec<SessionReport> {
    // Sessions share nothing but the read-only extractor
    sessions
        .par_iter()
        .map(|session| process_session(extractor, session))
        .collect()
}

/// Run every stage for one session, isolating stage failures
fn process_session(extractor: &EventLogExtractor, session: &SessionConfig) -> SessionReport {
    let extracted = match extractor.extract_file(&session.log) {
        Ok(extracted) => extracted,
        Err(e) => {
            log::error!("{:?}: {}", session.log, e);
            return SessionReport {
                log: session.log.clone(),
                subject: nslog_extractor::subject_id_from_path(&session.log),
                tables: Stage::Failed(e.to_string()),
                impedances: Stage::Skipped,
                alignment: Stage::Skipped,
            };
        }
    };

    let tables = Stage::Ok(TableCounts {
        umbrella: extracted.tables.umbrella.len(),
        practice: extracted.tables.practice.len(),
        trial: extracted.tables.trial.len(),
        sentence: extracted.tables.sentence.len(),
        trial_onsets: extractor.trial_onsets(&extracted).len(),
    });

    let impedances = Stage::from_result(extractor.impedances(&extracted).map(|intervals| {
        let annotations = extractor.impedance_annotations(&intervals, session.orig_time);
        ImpedanceSummary {
            variant: intervals.variant,
            intervals: intervals.intervals,
            annotations,
        }
    }));
    if let Stage::Failed(e) = &impedances {
        log::error!("{:?}: {}", session.log, e);
    }

    let alignment = match &session.events {
        None => Stage::Skipped,
        Some(events_path) => {
            let result = events::load_sample_events(events_path)
                .map_err(anyhow::Error::from)
                .and_then(|events| {
                    let records = extracted.table(session.align_table.into());
                    Ok(extractor.align(records, &events)?)
                })
                .map(|relabeled| {
                    let onsets = find_onsets(&relabeled);
                    AlignmentSummary {
                        table: Category::from(session.align_table).to_string(),
                        aligned: relabeled.len(),
                        onsets: onsets.len(),
                        onset_samples: onsets.iter().map(|e| e.sample).collect(),
                    }
                });
            if let Err(e) = &result {
                log::error!("{:?}: {}", session.log, e);
            }
            Stage::from_result(result)
        }
    };

    SessionReport {
        log: session.log.clone(),
        subject: extracted.subject,
        tables,
        impedances,
        alignment,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

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
