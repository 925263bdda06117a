pub mod core;
pub mod models;
pub mod platform;

use anyhow::{anyhow, Context};
use crate::core::config::Config;
use crate::core::session::TrainingSession;
use crate::models::exercise::{ExerciseKind, SessionSummary};
use crate::platform::pose::{LandmarkSource, ReplaySource};
use std::io::BufReader;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: rep-trainer [--exercise curl|squat] [--input <landmarks.jsonl>] [--config <settings.json>]

Counts repetitions from recorded pose landmarks (one JSON frame per line).
Reads from stdin when --input is not given.";

/// Command line options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub exercise: Option<ExerciseKind>,
    pub input: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub help: bool,
}

impl CliArgs {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg, None),
            };

            let mut value = |name: &str| {
                inline
                    .clone()
                    .or_else(|| args.next())
                    .ok_or_else(|| format!("Missing value for {}", name))
            };

            match flag.as_str() {
                "--exercise" | "-e" => {
                    parsed.exercise = Some(ExerciseKind::from_string(&value("--exercise")?)?);
                }
                "--input" | "-i" => parsed.input = Some(PathBuf::from(value("--input")?)),
                "--config" | "-c" => parsed.config = Some(PathBuf::from(value("--config")?)),
                "--help" | "-h" => parsed.help = true,
                other => return Err(format!("Unknown argument: {}", other)),
            }
        }

        Ok(parsed)
    }
}

/// Initialize the tracing subscriber; `RUST_LOG` takes precedence over the configured level
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

/// Feed every frame from `source` through a session and print feedback changes
pub async fn run_replay(
    source: &mut dyn LandmarkSource,
    session: &TrainingSession,
    kind: ExerciseKind,
) -> anyhow::Result<SessionSummary> {
    info!("{}", source.get_source_info());
    let (_, mut reports) = session.start(kind).await?;

    let printer = tokio::spawn(async move {
        let mut last_feedback = String::new();
        while let Some(report) = reports.recv().await {
            if report.update.feedback != last_feedback {
                println!(
                    "[{:>8} ms] Reps: {} | {}",
                    report.timestamp,
                    report.update.whole_reps(),
                    report.update.feedback
                );
                last_feedback = report.update.feedback;
            }
        }
    });

    let mut read_result = Ok(());
    loop {
        match source.next_frame() {
            Ok(Some(frame)) => {
                if let Err(e) = session.submit(frame).await {
                    read_result = Err(anyhow::Error::from(e));
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                read_result = Err(anyhow::Error::from(e));
                break;
            }
        }
    }

    // Stop even when reading failed so the worker is not left running
    let summary = session.stop().await?;
    printer.await.context("Feedback printer task failed")?;

    read_result.context(source.get_source_info())?;
    Ok(summary)
}

pub async fn run(args: impl IntoIterator<Item = String>) -> anyhow::Result<()> {
    let args = CliArgs::parse(args).map_err(|e| anyhow!("{}\n\n{}", e, USAGE))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .map_err(|e| anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.log_level)?;

    let kind = args.exercise.unwrap_or(config.exercise);
    info!("Starting {} analysis...", kind.display_name());

    let mut source: Box<dyn LandmarkSource> = match &args.input {
        Some(path) => Box::new(
            ReplaySource::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(ReplaySource::new(BufReader::new(std::io::stdin()), "stdin")),
    };

    let session = TrainingSession::new(config);
    let summary = run_replay(source.as_mut(), &session, kind).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
