//! Replay a recorded detection session through the emotion pipeline.
//!
//! Usage:
//!   emoscope-replay session.jsonl                       # One summary line per cycle
//!   emoscope-replay session.jsonl --json                # One FrameReport per line
//!   emoscope-replay session.jsonl --mode timeline -n 60 # Timeline over 60 cycles

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use emoscope_aggregate::Mode;
use emoscope_core::{EmoscopeResult, FrameSize};
use emoscope_expand::{EmotionExpander, EmotionLibrary, ExpanderConfig, JitterMode};
use emoscope_runtime::{
    init_tracing, BlankCapture, Command, Pipeline, ReplayDetector, RuntimeConfig,
};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "emoscope-replay")]
#[command(author, version, about = "Replay recorded face detections through the emotion pipeline", long_about = None)]
struct Args {
    /// Recording: one JSON array of face observations per line
    #[arg(required = true)]
    recording: PathBuf,

    /// Custom emotion library (JSON table keyed by base expression)
    #[arg(long)]
    library: Option<PathBuf>,

    /// Panel to report [default: EMOSCOPE_MODE or analyze]
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Number of detection cycles
    #[arg(short = 'n', long, default_value = "10")]
    cycles: u64,

    /// Seed for intensity jitter (off when absent)
    #[arg(long)]
    seed: Option<u64>,

    /// Top 8 emotions from the 3 strongest expressions
    #[arg(long)]
    wide: bool,

    /// Delay between cycles [default: EMOSCOPE_CYCLE_DELAY or 100ms]
    #[arg(long)]
    delay: Option<humantime::Duration>,

    /// Rescale detections to WIDTHxHEIGHT
    #[arg(long, value_parser = parse_size)]
    display: Option<FrameSize>,

    /// Advance the practice target every N cycles (practice mode)
    #[arg(long)]
    advance_every: Option<u64>,

    /// Output reports as JSON lines
    #[arg(short, long)]
    json: bool,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

fn parse_size(raw: &str) -> Result<FrameSize, String> {
    let (w, h) = raw
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", raw))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok(FrameSize::new(width, height))
}

/// Flags override `base`, which carries the environment
fn build_config(args: &Args, base: RuntimeConfig) -> EmoscopeResult<RuntimeConfig> {
    let mut config = base;
    if let Some(delay) = args.delay {
        config.cycle_delay = *delay;
    }
    if let Some(mode) = args.mode {
        config.initial_mode = mode;
    }
    config.max_cycles = Some(args.cycles);
    config.display_size = args.display;
    if args.wide {
        config.expander = ExpanderConfig {
            jitter: config.expander.jitter,
            ..ExpanderConfig::wide()
        };
    }
    if let Some(seed) = args.seed {
        config.expander.jitter = JitterMode::Seeded(seed);
    }
    config.validate()?;
    Ok(config)
}

async fn replay(args: Args) -> EmoscopeResult<()> {
    let config = build_config(&args, RuntimeConfig::from_env()?)?;
    info!(recording = %args.recording.display(), mode = %config.initial_mode, "Starting replay");

    let detector = ReplayDetector::open(args.recording.clone());
    let mut pipeline = Pipeline::new(
        config.clone(),
        Box::new(BlankCapture::default()),
        Box::new(detector),
    )?;

    if let Some(path) = &args.library {
        let json = tokio::fs::read_to_string(path).await?;
        let library = EmotionLibrary::from_json(&json)?;
        info!(entries = library.vocabulary().len(), "Using custom emotion library");
        pipeline = pipeline.with_expander(EmotionExpander::new(Arc::new(library), config.expander.clone()));
    }

    pipeline.start().await?;

    let handle = pipeline.handle();
    let mut reports = pipeline.report_stream();
    let runner = tokio::spawn(async move { pipeline.run().await });

    let interrupt = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current cycle");
            interrupt.shutdown();
        }
    });

    // ends when the loop finishes and drops the pipeline
    while let Some(report) = reports.recv().await {
        if args.json {
            println!("{}", serde_json::to_string(&report)?);
        } else {
            println!("{}", report);
        }

        if let Some(every) = args.advance_every {
            if every > 0 && report.cycle % every == 0 && !handle.try_send(Command::NextPracticeTarget) {
                warn!(cycle = report.cycle, "Practice command dropped");
            }
        }
    }

    let stats = runner
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;
    info!(
        cycles = stats.cycles,
        completed = stats.completed,
        failed = stats.failed_cycles,
        timeouts = stats.timeouts,
        faces = stats.faces_seen,
        "Replay finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_json);

    match replay(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Replay failed");
            ExitCode::FAILURE
        }
    }
}
