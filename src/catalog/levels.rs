//! Leveled dataset: `{ "levels": [ { "target": {...}, "similar": [{...}, {...}] } ] }`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::MoleculeRef;
use crate::consts::DECOYS_PER_LEVEL;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid dataset JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dataset has no levels")]
    Empty,
    #[error("dataset has {0} levels but none are usable")]
    NoValidLevels(usize),
}

/// A target and the two decoys shown with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub target: MoleculeRef,
    pub similar: Vec<MoleculeRef>,
}

impl Level {
    /// Exactly two decoys, all three files distinct
    pub fn is_valid(&self) -> bool {
        self.similar.len() == DECOYS_PER_LEVEL
            && self.similar.iter().all(|m| m.file != self.target.file)
            && self.similar[0].file != self.similar[1].file
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    levels: Vec<Level>,
}

#[derive(Debug, Serialize)]
struct DocumentOut<'a> {
    levels: &'a [Level],
    total: usize,
}

/// Validated levels, ascending by target atom count
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LevelSet {
    levels: Vec<Level>,
}

impl LevelSet {
    /// Keep valid levels and sort them into a difficulty ramp.
    /// Fails when nothing usable remains.
    pub fn new(levels: Vec<Level>) -> Result<Self, DatasetError> {
        if levels.is_empty() {
            return Err(DatasetError::Empty);
        }
        let total = levels.len();
        let mut valid: Vec<Level> = levels
            .into_iter()
            .filter(|level| {
                let ok = level.is_valid();
                if !ok {
                    log::warn!("Skipping malformed level for '{}'", level.target.name);
                }
                ok
            })
            .collect();
        if valid.is_empty() {
            return Err(DatasetError::NoValidLevels(total));
        }
        valid.sort_by_key(|l| l.target.atom_count);
        Ok(Self { levels: valid })
    }

    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let doc: Document = serde_json::from_str(json)?;
        Self::new(doc.levels)
    }

    pub fn to_json(&self) -> Result<String, DatasetError> {
        let doc = DocumentOut {
            levels: &self.levels,
            total: self.levels.len(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// Level played at a given score: one step per correct answer, capped at the last
    pub fn index_for_score(&self, score: u32) -> usize {
        (score as usize).min(self.levels.len().saturating_sub(1))
    }
}
