use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use solaris::{
    color::ColorRamp,
    config::AppConfig,
    noise::SeededNoise,
    score::score_location,
    solar::SolarEstimator,
    sun::SunSummary,
    tiles::{HeatTileGenerator, MAX_GRID_SIZE},
    web::{self, WebServerConfig},
    Region,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Solaris solar-potential map service")]
struct Cli {
    /// Path to the YAML config (defaults are used when the file is absent)
    #[arg(long, default_value = "config/solaris.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the map UI and JSON API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print heat tiles for a viewport as JSON
    Tiles {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 0.4)]
        lat_delta: f64,
        #[arg(long, default_value_t = 0.4)]
        lon_delta: f64,
        /// RFC 3339 instant; now when omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_GRID_SIZE as i64))]
        grid: Option<u32>,
    },
    /// Print the solar score for a location
    Score {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        name: Option<String>,
    },
    /// Print sun elevation, azimuth and event times
    Sun {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging.level);

    match cli.command {
        Command::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            web::run(WebServerConfig {
                app: config,
                host,
                port,
            })
            .await?;
        }
        Command::Tiles {
            lat,
            lon,
            lat_delta,
            lon_delta,
            at,
            grid,
        } => {
            let region = Region::new(lat, lon, lat_delta, lon_delta);
            let generator = HeatTileGenerator::new(
                SolarEstimator::new(SeededNoise::new(config.heatmap.noise_seed)),
                ColorRamp::default(),
                config.heatmap.min_value,
            );
            let grid = grid.unwrap_or(config.heatmap.grid_size);
            let tiles = generator.generate(&region, at.unwrap_or_else(Utc::now), grid);
            println!("{}", serde_json::to_string_pretty(&tiles)?);
        }
        Command::Score { lat, lon, name } => {
            let result = score_location(lat, lon, name.as_deref());
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Sun { lat, lon, at } => {
            let summary = SunSummary::at(at.unwrap_or_else(Utc::now), lat, lon);
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_grid_is_bounded() {
        let parsed = Cli::try_parse_from(["solaris", "tiles", "--lat", "26.3", "--lon", "73.0", "--grid", "256"]);
        assert!(parsed.is_ok());

        for grid in ["0", "257", "70000"] {
            let parsed = Cli::try_parse_from(["solaris", "tiles", "--lat", "26.3", "--lon", "73.0", "--grid", grid]);
            assert!(parsed.is_err(), "grid {grid} accepted");
        }
    }
}
