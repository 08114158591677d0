//! trunkline - chord progression explorer
//!
//! Subcommands:
//! - `trunkline map` - Print a key's progression map
//! - `trunkline suggest` - Walk a chord path and list what could come next
//! - `trunkline config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harmony::Key;
use trunkconf::TrunkConfig;

mod commands;
mod report;
mod telemetry;

#[derive(Parser)]
#[command(name = "trunkline")]
#[command(about = "Chord progression recommendation and trunk exploration")]
#[command(version)]
struct Cli {
    /// Config file to load instead of ./trunkline.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding markov_model.json and patterns.json
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the progression map for a key
    Map {
        /// Tonic (e.g., C, F#, Bb)
        #[arg(short, long, default_value = "C")]
        key: String,

        /// Scale type: major or minor
        #[arg(short, long, default_value = "major")]
        scale: String,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Grow a path from the tonic and suggest the next chord
    Suggest {
        /// Tonic (e.g., C, F#, Bb)
        #[arg(short, long, default_value = "C")]
        key: String,

        /// Scale type: major or minor
        #[arg(short, long, default_value = "major")]
        scale: String,

        /// Chords after the tonic, comma separated (e.g., G,Am,F)
        #[arg(short, long, value_delimiter = ',')]
        path: Vec<String>,

        /// Only consult these genres (repeatable)
        #[arg(short, long)]
        genre: Vec<String>,

        /// Candidates to show per list
        #[arg(short, long, default_value = "8")]
        top: usize,

        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Also list the files and variables that contributed
        #[arg(long)]
        sources: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, sources) = TrunkConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.model_dir {
        config.paths.model_dir = dir;
    }

    telemetry::init(&config.telemetry.log_level);

    match cli.command {
        Commands::Map { key, scale, json } => {
            let key = parse_key(&key, &scale)?;
            commands::map(key, json)?;
        }
        Commands::Suggest {
            key,
            scale,
            path,
            genre,
            top,
            json,
        } => {
            let key = parse_key(&key, &scale)?;
            let request = commands::SuggestRequest {
                key,
                path,
                genres: genre,
                top,
                json,
            };
            commands::suggest(&config, request).await?;
        }
        Commands::Config { sources: show } => {
            commands::config(&config, show.then_some(&sources));
        }
    }

    Ok(())
}

fn parse_key(tonic: &str, scale: &str) -> Result<Key> {
    Key::parse(tonic, scale).with_context(|| format!("Invalid key: {tonic} {scale}"))
}
