use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

const TOP_COMPS: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub name: String,
    pub champions: Vec<String>,
    pub base_power: f32,
}

/// The player's board plus one vector per opponent board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lobby {
    pub my_units: Vec<String>,
    pub enemy_units: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredComp {
    pub name: String,
    pub score: f32,
}

/// Scores a composition for a lobby:
///
///   score = base_power + 0.6 * personal_affinity - 0.4 * overlap
///
/// where `personal_affinity` is the fraction of the comp's champions the
/// player already owns and `overlap` the fraction that appears on any enemy
/// board. An empty comp scores its base power.
pub fn score(comp: &Composition, lobby: &Lobby) -> f32 {
    if comp.champions.is_empty() {
        return comp.base_power;
    }

    let total = comp.champions.len() as f32;
    let affinity = personal_affinity(&lobby.my_units, comp);

    let enemy_set: HashSet<&String> = lobby.enemy_units.iter().flatten().collect();
    let contested = comp
        .champions
        .iter()
        .filter(|champ| enemy_set.contains(*champ))
        .count() as f32;
    let overlap = contested / total;

    comp.base_power + 0.6 * affinity - 0.4 * overlap
}

/// Fraction of the comp's champions already on the player's board.
pub fn personal_affinity(my_units: &[String], comp: &Composition) -> f32 {
    if comp.champions.is_empty() {
        return 0.0;
    }
    let owned = comp
        .champions
        .iter()
        .filter(|champ| my_units.contains(*champ))
        .count() as f32;
    owned / comp.champions.len() as f32
}

/// Scores every known composition against the lobby and returns the top
/// three, best first.
pub fn best_comps(lobby: &Lobby, comps_path: &Path) -> DetectResult<Vec<ScoredComp>> {
    let raw = match fs::read_to_string(comps_path) {
        Ok(raw) => raw,
        Err(_) => return Err(DetectError::NotFound(comps_path.to_path_buf())),
    };
    let comps: Vec<Composition> = serde_json::from_str(&raw)
        .map_err(|err| DetectError::Decode(format!("{}: {err}", comps_path.display())))?;

    let mut scored: Vec<ScoredComp> = comps
        .iter()
        .map(|comp| ScoredComp {
            name: comp.name.clone(),
            score: score(comp, lobby),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(TOP_COMPS);
    Ok(scored)
}
