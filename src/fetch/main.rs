//! One-shot boundary resolution to a GeoJSON file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use barangay_bounds::config::Config;
use barangay_bounds::geojson::to_feature_collection;
use barangay_bounds::ResolutionOutcome;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Squares around each centroid, no network
    Approximate,
    /// Overpass geometry with per-area fallback
    Authoritative,
}

#[derive(Parser, Debug)]
#[command(name = "fetch")]
#[command(about = "Resolve barangay boundaries and write GeoJSON")]
struct Args {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value = "authoritative")]
    mode: Mode,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean GeoJSON
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let resolver = config.build_resolver()?;

    let boundaries = match args.mode {
        Mode::Approximate => resolver.resolve_approximate(),
        Mode::Authoritative => {
            let resolution = resolver.resolve_authoritative().await;
            match &resolution.outcome {
                ResolutionOutcome::Authoritative => {
                    info!("All {} boundaries are authoritative", resolution.boundaries.len())
                }
                ResolutionOutcome::PartialFallback { approximated } => {
                    warn!("Approximated {} areas: {}", approximated.len(), approximated.join(", "))
                }
                ResolutionOutcome::TotalFallback { error } => {
                    warn!("Geometry service unavailable, all areas approximated: {}", error)
                }
            }
            resolution.boundaries
        }
    };

    let fc = to_feature_collection(&boundaries, Some(resolver.areas()));

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {:?}", path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &fc)?;
            writer.flush()?;
            info!("Wrote {} features to {:?}", fc.features.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &fc)?;
            writeln!(writer)?;
        }
    }

    Ok(())
}
