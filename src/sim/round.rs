//! Round planning
//!
//! Picks the target and decoys for a round: from the leveled dataset when
//! there is one, otherwise by sampling the flat catalog.

use rand::Rng;
use rand::seq::SliceRandom;
use rand::seq::index;
use thiserror::Error;

use crate::catalog::{Catalog, Level, LevelSet, MoleculeRef};
use crate::consts::OPTION_COUNT;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("need at least {needed} molecules for a round, catalog has {available}")]
    InsufficientCatalog { needed: usize, available: usize },
}

/// Selected molecules for one round, options already shuffled
#[derive(Debug, Clone, PartialEq)]
pub struct RoundPlan {
    pub target: MoleculeRef,
    pub options: Vec<MoleculeRef>,
    pub correct_index: usize,
    /// Dataset level the round came from (None for catalog sampling)
    pub level_index: Option<usize>,
}

pub fn plan_round<R: Rng + ?Sized>(
    levels: Option<&LevelSet>,
    catalog: &Catalog,
    score: u32,
    rng: &mut R,
) -> Result<RoundPlan, RoundError> {
    let leveled = levels.and_then(|set| {
        let index = set.index_for_score(score);
        set.get(index).map(|level| (index, level))
    });

    match leveled {
        Some((index, level)) => Ok(plan_from_level(level, index, rng)),
        None => plan_from_catalog(catalog, rng),
    }
}

pub fn plan_from_level<R: Rng + ?Sized>(level: &Level, index: usize, rng: &mut R) -> RoundPlan {
    let mut plan = arrange(level.target.clone(), level.similar.clone(), rng);
    plan.level_index = Some(index);
    plan
}

/// Random target plus two distinct random decoys; no size matching
pub fn plan_from_catalog<R: Rng + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> Result<RoundPlan, RoundError> {
    if catalog.len() < OPTION_COUNT {
        return Err(RoundError::InsufficientCatalog {
            needed: OPTION_COUNT,
            available: catalog.len(),
        });
    }

    let picks = index::sample(rng, catalog.len(), OPTION_COUNT).into_vec();
    let target = catalog.entries[picks[0]].clone();
    let decoys = picks[1..]
        .iter()
        .map(|&i| catalog.entries[i].clone())
        .collect();

    Ok(arrange(target, decoys, rng))
}

/// Shuffle decoys and drop the target into a random position
fn arrange<R: Rng + ?Sized>(
    target: MoleculeRef,
    mut decoys: Vec<MoleculeRef>,
    rng: &mut R,
) -> RoundPlan {
    decoys.shuffle(rng);
    let correct_index = rng.random_range(0..=decoys.len());
    let mut options = decoys;
    options.insert(correct_index, target.clone());

    RoundPlan {
        target,
        options,
        correct_index,
        level_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::HashSet;

    fn levels() -> LevelSet {
        let m = |n: &str, c: u32| MoleculeRef::new(n, format!("{n}.mol2"), c);
        let level = |target: MoleculeRef, a: MoleculeRef, b: MoleculeRef| Level {
            target,
            similar: vec![a, b],
        };
        LevelSet::new(vec![
            level(m("a", 5), m("b", 5), m("c", 6)),
            level(m("d", 8), m("e", 8), m("f", 9)),
            level(m("g", 12), m("h", 12), m("i", 13)),
        ])
        .unwrap()
    }

    fn catalog(n: usize) -> Catalog {
        Catalog::from_paths(&(0..n).map(|i| format!("data/DB/m{i}.mol2")).collect::<Vec<_>>())
    }

    fn assert_well_formed(plan: &RoundPlan) {
        assert_eq!(plan.options.len(), OPTION_COUNT);
        assert_eq!(plan.options[plan.correct_index], plan.target);
        let files: HashSet<_> = plan.options.iter().map(|m| m.file.as_str()).collect();
        assert_eq!(files.len(), OPTION_COUNT);
        let matches = plan.options.iter().filter(|m| **m == plan.target).count();
        assert_eq!(matches, 1);
    }

    #[test]
    fn test_level_follows_score() {
        let set = levels();
        let mut rng = Pcg32::seed_from_u64(1);
        for (score, expected) in [(0, 0), (1, 1), (2, 2), (3, 2), (40, 2)] {
            let plan = plan_round(Some(&set), &Catalog::default(), score, &mut rng).unwrap();
            assert_eq!(plan.level_index, Some(expected));
            assert_eq!(plan.target, set.get(expected).unwrap().target);
            assert_well_formed(&plan);
        }
    }

    #[test]
    fn test_fallback_without_levels() {
        let mut rng = Pcg32::seed_from_u64(7);
        let c = catalog(10);
        for _ in 0..200 {
            let plan = plan_round(None, &c, 0, &mut rng).unwrap();
            assert_eq!(plan.level_index, None);
            assert_well_formed(&plan);
        }
    }

    #[test]
    fn test_fallback_with_exactly_three() {
        let mut rng = Pcg32::seed_from_u64(3);
        let plan = plan_round(None, &catalog(3), 5, &mut rng).unwrap();
        assert_well_formed(&plan);
    }

    #[test]
    fn test_insufficient_catalog() {
        let mut rng = Pcg32::seed_from_u64(3);
        assert_eq!(
            plan_round(None, &catalog(2), 0, &mut rng),
            Err(RoundError::InsufficientCatalog {
                needed: 3,
                available: 2
            })
        );
    }

    #[test]
    fn test_correct_index_varies() {
        let set = levels();
        let mut rng = Pcg32::seed_from_u64(99);
        let positions: HashSet<usize> = (0..100)
            .map(|_| {
                plan_round(Some(&set), &Catalog::default(), 0, &mut rng)
                    .unwrap()
                    .correct_index
            })
            .collect();
        assert_eq!(positions.len(), OPTION_COUNT);
    }

    #[test]
    fn test_same_seed_same_plan() {
        let c = catalog(8);
        let a = plan_round(None, &c, 0, &mut Pcg32::seed_from_u64(5)).unwrap();
        let b = plan_round(None, &c, 0, &mut Pcg32::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);
    }
}
