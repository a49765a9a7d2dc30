use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use tft_detect::{best_comps, DetectError, Lobby};

#[derive(Parser, Debug)]
#[command(author, version, about = "Score known team comps against a detected lobby", long_about = None)]
struct Args {
    /// lobby JSON path ({"my_units": [...], "enemy_units": [[...], ...]})
    lobby: PathBuf,

    /// compositions metadata path
    #[arg(long, default_value = "data/latest/comps.json")]
    comps: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        error!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => return Err(DetectError::Usage(err.to_string()).into()),
    };

    let raw = fs::read_to_string(&args.lobby)
        .map_err(|_| DetectError::NotFound(args.lobby.clone()))?;
    let lobby: Lobby = serde_json::from_str(&raw)
        .map_err(|err| DetectError::Decode(format!("{}: {err}", args.lobby.display())))?;

    let scored = best_comps(&lobby, &args.comps)?;
    println!("{}", serde_json::to_string(&scored)?);
    Ok(())
}
