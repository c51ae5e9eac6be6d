//! Offline level builder
//!
//! Turns a pool of molecules into a difficulty ramp: targets ascending by atom
//! count, each paired with the two closest unused molecules in size.

use std::collections::HashSet;

use super::levels::{DatasetError, Level, LevelSet};
use super::MoleculeRef;
use crate::consts::DECOYS_PER_LEVEL;
use crate::molecule::MolError;
use crate::molecule::mol2::read_header_text;

/// Threshold widening steps tried when too few decoys fall within the base threshold
const WIDEN_STEPS: [f64; 8] = [1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Molecules smaller than this are ignored
    pub min_atoms: u32,
    /// Allowed atom-count difference as a fraction of the target's count
    pub similarity: f64,
    pub max_levels: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            min_atoms: 5,
            similarity: 0.2,
            max_levels: 120,
        }
    }
}

impl MoleculeRef {
    /// Catalog entry from MOL2 text (name and atom count from the header)
    pub fn from_mol2(file: &str, mol2: &str) -> Result<Self, MolError> {
        let header = read_header_text(mol2)?;
        Ok(Self::new(header.name, file, header.atom_count as u32))
    }
}

/// Build the leveled dataset
pub fn build_levels(
    molecules: &[MoleculeRef],
    options: BuildOptions,
) -> Result<LevelSet, DatasetError> {
    let mut pool: Vec<&MoleculeRef> = molecules
        .iter()
        .filter(|m| m.atom_count >= options.min_atoms)
        .collect();
    pool.sort_by_key(|m| m.atom_count);
    log::info!(
        "Building levels from {} molecules with at least {} atoms",
        pool.len(),
        options.min_atoms
    );

    let mut used: HashSet<&str> = HashSet::new();
    let mut levels = Vec::new();

    for &target in &pool {
        if levels.len() >= options.max_levels {
            break;
        }
        if used.contains(target.file.as_str()) {
            continue;
        }

        let decoys = find_similar(target, &pool, &used, options.similarity);
        if decoys.len() < DECOYS_PER_LEVEL {
            log::debug!("No decoys left for '{}'", target.name);
            continue;
        }

        used.insert(target.file.as_str());
        for &d in &decoys {
            used.insert(d.file.as_str());
        }
        levels.push(Level {
            target: target.clone(),
            similar: decoys.into_iter().cloned().collect(),
        });
    }

    log::info!("Built {} levels", levels.len());
    LevelSet::new(levels)
}

/// Two unused molecules closest in size to `target`
fn find_similar<'a>(
    target: &MoleculeRef,
    pool: &[&'a MoleculeRef],
    used: &HashSet<&str>,
    similarity: f64,
) -> Vec<&'a MoleculeRef> {
    let available: Vec<&'a MoleculeRef> = pool
        .iter()
        .copied()
        .filter(|m| m.file != target.file && !used.contains(m.file.as_str()))
        .collect();
    let diff = |m: &MoleculeRef| (m.atom_count as f64 - target.atom_count as f64).abs();
    let within = |limit: f64| -> Vec<&'a MoleculeRef> {
        available.iter().copied().filter(|m| diff(*m) <= limit).collect()
    };

    let base = target.atom_count as f64 * similarity;
    let mut candidates = within(base);
    for step in WIDEN_STEPS {
        if candidates.len() >= DECOYS_PER_LEVEL {
            break;
        }
        candidates = within(base * step);
    }
    if candidates.len() < DECOYS_PER_LEVEL {
        candidates = available;
    }

    candidates.sort_by(|a, b| diff(*a).total_cmp(&diff(*b)));
    candidates.truncate(DECOYS_PER_LEVEL);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::FALLBACK_MOL2;

    fn pool(counts: &[u32]) -> Vec<MoleculeRef> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| MoleculeRef::new(format!("m{i}"), format!("m{i}.mol2"), c))
            .collect()
    }

    #[test]
    fn test_levels_ascending_and_disjoint() {
        let molecules = pool(&[30, 6, 10, 7, 31, 11, 6, 29, 12]);
        let set = build_levels(&molecules, BuildOptions::default()).unwrap();

        assert_eq!(set.len(), 3);
        let counts: Vec<u32> = set.iter().map(|l| l.target.atom_count).collect();
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));

        let mut seen = HashSet::new();
        for level in set.iter() {
            assert!(level.is_valid());
            for m in std::iter::once(&level.target).chain(&level.similar) {
                assert!(seen.insert(m.file.clone()), "{} used twice", m.file);
            }
        }
    }

    #[test]
    fn test_decoys_are_closest() {
        let molecules = pool(&[10, 11, 12, 9, 40]);
        let set = build_levels(&molecules, BuildOptions::default()).unwrap();
        let first = set.get(0).unwrap();
        // Target 9, closest unused: 10 and 11
        assert_eq!(first.target.atom_count, 9);
        let decoy_counts: Vec<u32> = first.similar.iter().map(|m| m.atom_count).collect();
        assert_eq!(decoy_counts, vec![10, 11]);
    }

    #[test]
    fn test_widening_and_closest_fallback() {
        // Nothing within 20% of 10; widening reaches 16 (x3) and the closest fallback takes 100
        let molecules = pool(&[10, 16, 100]);
        let set = build_levels(&molecules, BuildOptions::default()).unwrap();
        let level = set.get(0).unwrap();
        assert_eq!(level.target.atom_count, 10);
        let decoy_counts: Vec<u32> = level.similar.iter().map(|m| m.atom_count).collect();
        assert_eq!(decoy_counts, vec![16, 100]);
    }

    #[test]
    fn test_min_atoms_filter() {
        let molecules = pool(&[3, 4, 4, 5, 6, 6]);
        let set = build_levels(&molecules, BuildOptions::default()).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.iter().all(|l| l.target.atom_count >= 5));
    }

    #[test]
    fn test_max_levels() {
        let molecules = pool(&[5, 5, 5, 6, 6, 6, 7, 7, 7]);
        let options = BuildOptions {
            max_levels: 2,
            ..Default::default()
        };
        assert_eq!(build_levels(&molecules, options).unwrap().len(), 2);
    }

    #[test]
    fn test_too_few_molecules() {
        let molecules = pool(&[8, 9]);
        assert!(matches!(
            build_levels(&molecules, BuildOptions::default()),
            Err(DatasetError::Empty)
        ));
    }

    #[test]
    fn test_from_mol2_header() {
        let m = MoleculeRef::from_mol2("methane.mol2", FALLBACK_MOL2).unwrap();
        assert_eq!(m, MoleculeRef::new("methane", "methane.mol2", 5));
        assert!(MoleculeRef::from_mol2("x.mol2", "").is_err());
    }
}
