use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use showreel::composite::Compositor;
use showreel::config::Settings;
use showreel::engine::WebDriverEngine;
use showreel::scenario;
use showreel::sequencer::Sequencer;

#[derive(Parser)]
#[command(
    name = "showreel",
    about = "Records a scripted browser demo and trims the capture to the timed narrative"
)]
struct Cli {
    /// Optional TOML settings file overriding the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the scripted session and write the timing record
    Record,
    /// Trim the raw recording to start at the loaded anchor
    Composite,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());

    match cli.command {
        Command::Record => record(&settings).await,
        Command::Composite => composite(&settings).await,
    }
}

async fn record(settings: &Settings) -> Result<()> {
    // The capture side of the session writes into videos/; start from an
    // empty directory so the compositor's exactly-one-file contract holds.
    let videos_dir = settings.videos_dir();
    if videos_dir.exists() {
        fs::remove_dir_all(&videos_dir)
            .with_context(|| format!("failed to clear {}", videos_dir.display()))?;
    }
    fs::create_dir_all(&videos_dir)
        .with_context(|| format!("failed to create {}", videos_dir.display()))?;

    let scenario = scenario::build(settings)?;
    let engine = WebDriverEngine::connect(&settings.webdriver_url, settings.viewport)
        .await
        .context("failed to open the automation session")?;

    // The sequencer tears the session down on every exit path; the record is
    // only persisted after that teardown.
    let record = Sequencer::new(&engine, settings.pacing())
        .run(&scenario)
        .await?;
    let timings_path = settings.timings_path();
    record.write(&timings_path)?;
    tracing::info!(
        path = %timings_path.display(),
        beats = record.event_times.len(),
        "timing record written"
    );
    Ok(())
}

async fn composite(settings: &Settings) -> Result<()> {
    let compositor = Compositor::new(
        settings.videos_dir(),
        settings.timings_path(),
        settings.output_path(),
        settings.encoder_path.clone(),
    );
    let output = compositor.run().await?;
    tracing::info!(path = %output.display(), "composite written");
    println!("{}", output.display());
    Ok(())
}
