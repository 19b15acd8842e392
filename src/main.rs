use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use speedometer::{demo, init_tracing, run_window, DelayedSource, GaugeOptions, Player, TimeSeries};

/// Component id the delayed time source registers under.
const DELAYED_COMPONENT: &str = "player";

#[derive(Parser, Debug)]
#[command(name = "speedometer")]
#[command(about = "Replay a recorded series on an analog gauge")]
#[command(version)]
struct Args {
    /// Path to a JSON5 options file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Series file to play, overriding the configured one.
    #[arg(short, long)]
    data: Option<String>,

    /// Play a generated series instead of a recording.
    #[arg(long, conflicts_with = "data")]
    demo: bool,

    /// Bind to a component time source that becomes ready after this many milliseconds.
    #[arg(long)]
    source_delay_ms: Option<u64>,

    /// Log level, overriding the configured one.
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut options = match &args.config {
        Some(path) => GaugeOptions::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => GaugeOptions::default(),
    };
    if let Some(level) = args.log_level {
        options.logging.level = level;
    }
    init_tracing(&options.logging).context("Failed to initialize logging")?;

    if let Some(data) = args.data {
        options.data.json = Some(data);
    }

    let series: Option<TimeSeries> = if args.demo {
        options.data.json = None;
        let series = demo::random_walk(&mut rand::rng(), 1200, 10.0, 180.0, "m")
            .context("Failed to generate demo series")?;
        info!(samples = series.len(), "Playing generated series");
        Some(series)
    } else {
        None
    };

    let delayed = args.source_delay_ms.map(|ms| DelayedSource {
        component: DELAYED_COMPONENT.to_string(),
        delay: Duration::from_millis(ms),
    });

    let title = match options.data_path() {
        Some(path) => format!("Speedometer - {path}"),
        None => "Speedometer".to_string(),
    };

    let player = Player::new(options, series, delayed);
    run_window(&title, player).context("Player window failed")?;

    Ok(())
}
