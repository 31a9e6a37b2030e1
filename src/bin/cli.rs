use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worldgen::seeds::parse_world_seed;
use worldgen::{GenerationConstants, generate_world, snapshot};

/// Детерминированный генератор мира: сид → JSON-снимок
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Целочисленный сид мира
    #[arg(value_parser = parse_seed, allow_negative_numbers = true)]
    seed: i64,

    /// Путь к TOML-файлу с переопределениями констант
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Печатать SHA-256 канонического JSON вместо самого мира
    #[arg(long, conflicts_with = "pretty")]
    hash: bool,

    /// Печатать JSON с отступами
    #[arg(long)]
    pretty: bool,
}

fn parse_seed(input: &str) -> Result<i64, String> {
    parse_world_seed(input).map_err(|err| err.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout занят снимком, журнал идёт в stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let constants = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "загрузка конфигурации");
            GenerationConstants::from_toml_file(path)?
        }
        None => GenerationConstants::default(),
    };

    let world = generate_world(cli.seed, &constants)?;

    let output = if cli.hash {
        snapshot::canonical_hash(&world)?
    } else if cli.pretty {
        snapshot::pretty_json(&world)?
    } else {
        snapshot::canonical_json(&world)?
    };
    println!("{output}");

    Ok(())
}
