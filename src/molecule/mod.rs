//! Molecule structures parsed from MOL2 text
//!
//! Only what the viewers need: element, position and bonds.

pub mod mol2;

use glam::Vec3;
use thiserror::Error;

pub use mol2::parse_mol2;

/// Built-in structure shown when a molecule file cannot be fetched (methane)
pub const FALLBACK_MOL2: &str = "@<TRIPOS>MOLECULE
methane
 5 4 0 0 0
SMALL
NO_CHARGES

@<TRIPOS>ATOM
      1 C1          0.0000    0.0000    0.0000 C.3     1  MOL       0.0000
      2 H1          0.6291    0.6291    0.6291 H       1  MOL       0.0000
      3 H2         -0.6291   -0.6291    0.6291 H       1  MOL       0.0000
      4 H3         -0.6291    0.6291   -0.6291 H       1  MOL       0.0000
      5 H4          0.6291   -0.6291   -0.6291 H       1  MOL       0.0000
@<TRIPOS>BOND
     1     1     2    1
     2     1     3    1
     3     1     4    1
     4     1     5    1
";

#[derive(Debug, Error, PartialEq)]
pub enum MolError {
    #[error("missing {0} section")]
    MissingSection(&'static str),
    #[error("failed to parse MOL2 data: {details} (at line ~{line})")]
    Parse { line: usize, details: String },
}

impl MolError {
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Parse a MOL2 bond type (`1`, `2`, `3`, `ar`, `am`)
    pub fn from_mol2(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "1" | "am" => Some(Self::Single),
            "2" => Some(Self::Double),
            "3" => Some(Self::Triple),
            "ar" => Some(Self::Aromatic),
            _ => None,
        }
    }

    /// Number of lines drawn for this bond
    pub fn strokes(&self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double | BondOrder::Aromatic => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Element symbol, normalized (`C`, `Cl`, ...)
    pub element: String,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    /// Indices into `Molecule::atoms`
    pub a: usize,
    pub b: usize,
    pub order: BondOrder,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
}

impl Molecule {
    pub fn positions(&self) -> Vec<Vec3> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Overwrite atom positions in order. Extra or missing entries are ignored.
    pub fn set_positions(&mut self, positions: &[Vec3]) {
        for (atom, &p) in self.atoms.iter_mut().zip(positions) {
            atom.position = p;
        }
    }

    /// Largest distance of any atom from the centroid
    pub fn radius(&self) -> f32 {
        let Some(center) = crate::sim::rotation::centroid(&self.positions()) else {
            return 0.0;
        };
        self.atoms
            .iter()
            .map(|a| a.position.distance(center))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_parses() {
        let mol = parse_mol2(FALLBACK_MOL2).unwrap();
        assert_eq!(mol.name, "methane");
        assert_eq!(mol.atoms.len(), 5);
        assert_eq!(mol.bonds.len(), 4);
        assert_eq!(mol.atoms[0].element, "C");
        assert!(mol.atoms[1..].iter().all(|a| a.element == "H"));
    }

    #[test]
    fn test_bond_order_tokens() {
        assert_eq!(BondOrder::from_mol2("1"), Some(BondOrder::Single));
        assert_eq!(BondOrder::from_mol2("AR"), Some(BondOrder::Aromatic));
        assert_eq!(BondOrder::from_mol2("3"), Some(BondOrder::Triple));
        assert_eq!(BondOrder::from_mol2("du"), None);
        assert_eq!(BondOrder::Triple.strokes(), 3);
    }

    #[test]
    fn test_radius_of_fallback() {
        let mol = parse_mol2(FALLBACK_MOL2).unwrap();
        let expected = (3.0f32 * 0.6291 * 0.6291).sqrt();
        assert!((mol.radius() - expected).abs() < 1e-3);
    }

    #[test]
    fn test_set_positions_partial() {
        let mut mol = parse_mol2(FALLBACK_MOL2).unwrap();
        mol.set_positions(&[Vec3::ONE]);
        assert_eq!(mol.atoms[0].position, Vec3::ONE);
        assert_ne!(mol.atoms[1].position, Vec3::ONE);
    }
}
