//! Replay a recorded JSON-lines session and print one result per frame.
//!
//! Usage: framecoach-replay <recording.jsonl | ->

use std::io::{self, BufReader};

use anyhow::Context;
use tracing::info;

use framecoach_session::{init_tracing, metrics, Replayer, SessionConfig};

fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    let path = std::env::args()
        .nth(1)
        .context("usage: framecoach-replay <recording.jsonl | ->")?;

    let prometheus = if std::env::var("METRICS_DUMP").map(|v| v == "1").unwrap_or(false) {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let config = SessionConfig::from_env();
    info!(?config, "Replay config");
    let mut replayer = Replayer::new(config.evaluator()?);

    let stdout = io::stdout();
    let summary = if path == "-" {
        replayer.run(io::stdin().lock(), stdout.lock())?
    } else {
        let file = std::fs::File::open(&path).with_context(|| format!("opening {}", path))?;
        replayer.run(BufReader::new(file), stdout.lock())?
    };

    eprintln!(
        "replayed {} events: {} frames, {} perfect, {} locks",
        summary.events, summary.frames, summary.perfect_frames, summary.locks
    );

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
