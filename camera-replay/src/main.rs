//! # Saorsa Camera Replay
//!
//! Prints the observer log of a scenario as JSON lines.

use camera_core::CameraConfig;
use camera_replay::{CliArgs, Replay, Scenario};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured tracing with optional JSON format.
///
/// Set `RUST_LOG` to control log levels (default: info,camera_core=debug).
/// Set `RUST_LOG_FORMAT=json` for JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,camera_core=debug,camera_replay=debug"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true);

    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => {
            tracing::info!("Loading camera config from {:?}", path);
            CameraConfig::from_path(path)?
        }
        None => CameraConfig::default(),
    };
    config.strict_mode |= args.strict;

    let scenario = Scenario::from_path(&args.scenario)
        .map_err(|e| anyhow::anyhow!("Failed to load scenario {:?}: {}", args.scenario, e))?;

    let mut replay = Replay::new(&config, args.options())?;
    let log = replay.run(&scenario).await?;

    for entry in &log {
        println!("{}", serde_json::to_string(entry)?);
    }

    tracing::info!(entries = log.len(), "Replay finished");
    Ok(())
}
