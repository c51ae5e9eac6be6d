//! Molecule catalog and leveled dataset
//!
//! The leveled dataset is produced offline (see [`builder`]) and read-only at
//! runtime. When it is missing the game samples from the flat catalog.

pub mod builder;
pub mod levels;

use serde::{Deserialize, Serialize};

pub use levels::{DatasetError, Level, LevelSet};

/// A molecule known to the game
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoleculeRef {
    pub name: String,
    /// File name (dataset) or path (catalog)
    pub file: String,
    #[serde(default)]
    pub atom_count: u32,
}

impl MoleculeRef {
    pub fn new(name: impl Into<String>, file: impl Into<String>, atom_count: u32) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            atom_count,
        }
    }

    /// Catalog entry from a bare path; the name is the file stem
    pub fn from_path(path: &str) -> Self {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let name = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name);
        Self::new(name, path, 0)
    }

    /// Path to fetch, resolving bare file names against `molecule_dir`
    pub fn resolve(&self, molecule_dir: &str) -> String {
        if self.file.contains('/') || molecule_dir.is_empty() {
            self.file.clone()
        } else if molecule_dir.ends_with('/') {
            format!("{molecule_dir}{}", self.file)
        } else {
            format!("{molecule_dir}/{}", self.file)
        }
    }
}

/// Flat list of molecules for random rounds
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub entries: Vec<MoleculeRef>,
}

impl Catalog {
    /// Catalog without duplicate files (first occurrence wins)
    pub fn new(entries: Vec<MoleculeRef>) -> Self {
        let mut unique: Vec<MoleculeRef> = Vec::with_capacity(entries.len());
        for entry in entries {
            if !unique.iter().any(|e| e.file == entry.file) {
                unique.push(entry);
            }
        }
        Self { entries: unique }
    }

    /// Build from paths, dropping blanks and duplicates
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        Self::new(
            paths
                .iter()
                .map(|p| p.as_ref().trim())
                .filter(|p| !p.is_empty())
                .map(MoleculeRef::from_path)
                .collect(),
        )
    }

    /// Parse a JSON array of paths
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let paths: Vec<String> = serde_json::from_str(json)?;
        Ok(Self::from_paths(&paths))
    }

    /// Every molecule referenced by a leveled dataset
    pub fn from_levels(levels: &LevelSet) -> Self {
        Self::new(
            levels
                .iter()
                .flat_map(|level| std::iter::once(&level.target).chain(level.similar.iter()))
                .cloned()
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_names() {
        let m = MoleculeRef::from_path("data/DB/caffeine.mol2");
        assert_eq!(m.name, "caffeine");
        assert_eq!(m.file, "data/DB/caffeine.mol2");
        assert_eq!(MoleculeRef::from_path("noext").name, "noext");
    }

    #[test]
    fn test_resolve() {
        let bare = MoleculeRef::new("a", "a.mol2", 5);
        assert_eq!(bare.resolve("data/DB/"), "data/DB/a.mol2");
        assert_eq!(bare.resolve("data/DB"), "data/DB/a.mol2");
        assert_eq!(bare.resolve(""), "a.mol2");
        let pathed = MoleculeRef::new("b", "other/b.mol2", 5);
        assert_eq!(pathed.resolve("data/DB/"), "other/b.mol2");
    }

    #[test]
    fn test_catalog_dedupes() {
        let c = Catalog::from_paths(&["x.mol2", " x.mol2 ", "", "y.mol2"]);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_catalog_from_levels() {
        let json = r#"{"levels": [
            {"target": {"name": "a", "file": "a.mol2", "atom_count": 5},
             "similar": [{"name": "b", "file": "b.mol2", "atom_count": 5},
                         {"name": "c", "file": "c.mol2", "atom_count": 6}]},
            {"target": {"name": "d", "file": "d.mol2", "atom_count": 9},
             "similar": [{"name": "a", "file": "a.mol2", "atom_count": 5},
                         {"name": "e", "file": "e.mol2", "atom_count": 9}]}
        ]}"#;
        let levels = LevelSet::from_json(json).unwrap();
        let c = Catalog::from_levels(&levels);
        let files: Vec<_> = c.entries.iter().map(|e| e.file.as_str()).collect();
        assert_eq!(files, ["a.mol2", "b.mol2", "c.mol2", "d.mol2", "e.mol2"]);
    }

    #[test]
    fn test_catalog_json() {
        let c = Catalog::from_json(r#"["a.mol2", "b.mol2", "c.mol2"]"#).unwrap();
        assert_eq!(c.len(), 3);
        assert!(Catalog::from_json(r#"{"a": 1}"#).is_err());
    }
}
