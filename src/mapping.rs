use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{DetectError, DetectResult};

#[derive(Debug, Deserialize)]
struct ChampionEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChampionFile {
    data: serde_json::Map<String, serde_json::Value>,
}

/// Loads the class-index → champion-name table from `champions.json`.
///
/// Entries are taken in file order, which must match the training class-index
/// order. A missing or unreadable file yields an empty table and detections
/// fall back to raw class indices; a present-but-malformed file is an error.
pub fn load_champion_mapping(path: &Path) -> DetectResult<Vec<String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(
                "champion metadata unavailable at {}: {err}; falling back to raw class indices",
                path.display()
            );
            return Ok(Vec::new());
        }
    };
    parse_champion_names(&raw)
        .map_err(|err| DetectError::Decode(format!("{}: {err}", path.display())))
}

fn parse_champion_names(raw: &str) -> Result<Vec<String>, String> {
    let file: ChampionFile = serde_json::from_str(raw).map_err(|err| err.to_string())?;
    file.data
        .into_iter()
        .map(|(key, value)| {
            let entry: ChampionEntry = serde_json::from_value(value)
                .map_err(|err| format!("champion entry {key}: {err}"))?;
            Ok(entry.name)
        })
        .collect()
}
