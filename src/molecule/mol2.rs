//! Tripos MOL2 reader
//!
//! Reads the MOLECULE header, ATOM block and BOND block. Substructure and
//! charge data are ignored.

use std::collections::HashMap;

use glam::Vec3;

use super::{Atom, Bond, BondOrder, MolError, Molecule};

const MOLECULE_SECTION: &str = "@<TRIPOS>MOLECULE";
const ATOM_SECTION: &str = "@<TRIPOS>ATOM";
const BOND_SECTION: &str = "@<TRIPOS>BOND";

/// Header fields only, without parsing atoms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mol2Header {
    pub name: String,
    pub atom_count: usize,
    pub bond_count: usize,
}

pub fn parse_mol2(text: &str) -> Result<Molecule, MolError> {
    let lines: Vec<(usize, &str)> = text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();

    let header = read_header(&lines)?;

    let atom_start =
        find_section(&lines, ATOM_SECTION).ok_or(MolError::MissingSection(ATOM_SECTION))?;
    // Next section marker after the atoms (BOND, SUBSTRUCTURE, ...) or EOF
    let atom_end = next_section(&lines, atom_start + 1);

    let (atoms, id_map) = parse_atoms(&lines[atom_start + 1..atom_end], header.atom_count)?;

    let bonds = match find_section(&lines, BOND_SECTION) {
        Some(start) => {
            let end = next_section(&lines, start + 1);
            parse_bonds(&lines[start + 1..end], header.bond_count, &id_map)?
        }
        None => Vec::new(),
    };

    Ok(Molecule {
        name: header.name,
        atoms,
        bonds,
    })
}

/// Parse the MOLECULE record: name line then counts line
pub fn read_header_text(text: &str) -> Result<Mol2Header, MolError> {
    let lines: Vec<(usize, &str)> = text.lines().enumerate().map(|(i, l)| (i + 1, l)).collect();
    read_header(&lines)
}

fn read_header(lines: &[(usize, &str)]) -> Result<Mol2Header, MolError> {
    let mol_idx = find_section(lines, MOLECULE_SECTION)
        .ok_or(MolError::MissingSection(MOLECULE_SECTION))?;

    let mut data = lines[mol_idx + 1..]
        .iter()
        .take_while(|(_, l)| !l.trim_start().starts_with('@'))
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'));

    let name = data
        .next()
        .map(|(_, l)| l.trim().to_string())
        .unwrap_or_else(|| String::from("MOL2"));

    let (line_no, counts) = data
        .next()
        .ok_or_else(|| MolError::parse(lines[mol_idx].0 + 1, "missing counts line"))?;
    let mut parts = counts.split_whitespace();
    let atom_count = parts
        .next()
        .and_then(|p| p.parse::<usize>().ok())
        .ok_or_else(|| MolError::parse(*line_no, "invalid atom count in counts line"))?;
    let bond_count = parts
        .next()
        .map(|p| p.parse::<usize>())
        .transpose()
        .map_err(|_| MolError::parse(*line_no, "invalid bond count in counts line"))?
        .unwrap_or(0);

    Ok(Mol2Header {
        name,
        atom_count,
        bond_count,
    })
}

fn find_section(lines: &[(usize, &str)], name: &str) -> Option<usize> {
    lines
        .iter()
        .position(|(_, line)| line.trim().eq_ignore_ascii_case(name))
}

fn next_section(lines: &[(usize, &str)], from: usize) -> usize {
    lines[from..]
        .iter()
        .position(|(_, line)| line.trim_start().starts_with("@<TRIPOS>"))
        .map(|p| from + p)
        .unwrap_or(lines.len())
}

fn data_lines<'a>(block: &'a [(usize, &'a str)]) -> impl Iterator<Item = &'a (usize, &'a str)> {
    block
        .iter()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
}

fn parse_atoms(
    block: &[(usize, &str)],
    expected: usize,
) -> Result<(Vec<Atom>, HashMap<usize, usize>), MolError> {
    let mut atoms = Vec::with_capacity(expected);
    let mut id_map = HashMap::with_capacity(expected);

    for (ln, raw) in data_lines(block).take(expected) {
        let parts: Vec<_> = raw.split_whitespace().collect();
        if parts.len() < 6 {
            return Err(MolError::parse(*ln, "invalid ATOM line"));
        }
        let id = parts[0]
            .parse::<usize>()
            .map_err(|_| MolError::parse(*ln, "invalid atom id in ATOM line"))?;
        let coord = |i: usize, axis: &str| {
            parts[i]
                .parse::<f32>()
                .map_err(|_| {
                    MolError::parse(*ln, format!("invalid {axis} coordinate in ATOM line"))
                })
        };
        let position = Vec3::new(coord(2, "x")?, coord(3, "y")?, coord(4, "z")?);

        let element = element_symbol(parts[5])
            .or_else(|| element_symbol(parts[1]))
            .ok_or_else(|| MolError::parse(*ln, "unable to infer element"))?;

        id_map.insert(id, atoms.len());
        atoms.push(Atom { element, position });
    }

    if atoms.len() < expected {
        return Err(MolError::parse(
            block.last().map(|(ln, _)| *ln).unwrap_or(0),
            "ATOM section ended before expected atom count",
        ));
    }

    Ok((atoms, id_map))
}

fn parse_bonds(
    block: &[(usize, &str)],
    expected: usize,
    id_map: &HashMap<usize, usize>,
) -> Result<Vec<Bond>, MolError> {
    let mut bonds = Vec::with_capacity(expected);

    for (ln, raw) in data_lines(block).take(expected) {
        let parts: Vec<_> = raw.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(MolError::parse(*ln, "invalid BOND line"));
        }
        let atom_index = |i: usize| {
            parts[i]
                .parse::<usize>()
                .ok()
                .and_then(|id| id_map.get(&id).copied())
                .ok_or_else(|| MolError::parse(*ln, "bond references unknown atom id"))
        };
        let a = atom_index(1)?;
        let b = atom_index(2)?;
        let order = BondOrder::from_mol2(parts[3])
            .ok_or_else(|| MolError::parse(*ln, "unsupported bond type in BOND line"))?;

        bonds.push(Bond { a, b, order });
    }

    Ok(bonds)
}

/// `C.ar` -> `C`, `Cl` -> `Cl`, `CL1` -> `Cl`, `H12` -> `H`
fn element_symbol(token: &str) -> Option<String> {
    let head = token.split('.').next().unwrap_or(token);
    let letters: Vec<char> = head.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let first = letters.first()?.to_ascii_uppercase();

    let two = letters
        .get(1)
        .map(|c| format!("{first}{}", c.to_ascii_lowercase()));
    match two {
        Some(sym) if is_two_letter_element(&sym) => Some(sym),
        _ => Some(first.to_string()),
    }
}

fn is_two_letter_element(sym: &str) -> bool {
    matches!(
        sym,
        "Cl" | "Br" | "Na" | "Mg" | "Al" | "Si" | "Ca" | "Fe" | "Zn" | "Cu" | "Li" | "Se" | "Mn"
            | "Co" | "Ni" | "Sn" | "Hg" | "Pt" | "Au" | "Ag" | "Be"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHANOL: &str = "@<TRIPOS>MOLECULE
ethanol
 3 2 1 0 0
SMALL
NO_CHARGES

@<TRIPOS>ATOM
      1 C1         -0.7480    0.0150    0.0240 C.3     1  EOH  0.0000
      2 C2          0.7660   -0.0140   -0.0070 C.3     1  EOH  0.0000
      3 O1          1.2000    1.3270    0.0430 O.3     1  EOH  0.0000
@<TRIPOS>BOND
     1     1     2    1
     2     2     3    1
@<TRIPOS>SUBSTRUCTURE
     1 EOH         1 GROUP
";

    #[test]
    fn test_parse_small_molecule() {
        let mol = parse_mol2(ETHANOL).unwrap();
        assert_eq!(mol.name, "ethanol");
        assert_eq!(mol.atoms.len(), 3);
        assert_eq!(mol.atoms[2].element, "O");
        assert_eq!(mol.atoms[1].position, Vec3::new(0.766, -0.014, -0.007));
        let bonds: Vec<(usize, usize, BondOrder)> =
            mol.bonds.iter().map(|b| (b.a, b.b, b.order)).collect();
        assert_eq!(
            bonds,
            vec![(0, 1, BondOrder::Single), (1, 2, BondOrder::Single)]
        );
    }

    #[test]
    fn test_header_only() {
        let header = read_header_text(ETHANOL).unwrap();
        assert_eq!(
            header,
            Mol2Header {
                name: "ethanol".into(),
                atom_count: 3,
                bond_count: 2,
            }
        );
    }

    #[test]
    fn test_missing_molecule_section() {
        assert_eq!(
            parse_mol2("@<TRIPOS>ATOM\n"),
            Err(MolError::MissingSection(MOLECULE_SECTION))
        );
    }

    #[test]
    fn test_truncated_atoms() {
        let text = ETHANOL.replace(" 3 2 1 0 0", " 4 2 1 0 0");
        assert!(matches!(parse_mol2(&text), Err(MolError::Parse { .. })));
    }

    #[test]
    fn test_bad_coordinate_reports_line() {
        let text = ETHANOL.replace("0.7660", "zero");
        match parse_mol2(&text) {
            Err(MolError::Parse { line, details }) => {
                assert_eq!(line, 9);
                assert!(details.contains('x'));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_bond_to_unknown_atom() {
        let text = ETHANOL.replace("     2     2     3    1", "     2     2     9    1");
        assert!(parse_mol2(&text).is_err());
    }

    #[test]
    fn test_missing_bond_section_is_ok() {
        let text = ETHANOL.split("@<TRIPOS>BOND").next().unwrap().to_string();
        let mol = parse_mol2(&text).unwrap();
        assert!(mol.bonds.is_empty());
    }

    #[test]
    fn test_element_symbols() {
        assert_eq!(element_symbol("C.ar").as_deref(), Some("C"));
        assert_eq!(element_symbol("Cl").as_deref(), Some("Cl"));
        assert_eq!(element_symbol("CL1").as_deref(), Some("Cl"));
        assert_eq!(element_symbol("H12").as_deref(), Some("H"));
        assert_eq!(element_symbol("N.pl3").as_deref(), Some("N"));
        assert_eq!(element_symbol("CA").as_deref(), Some("Ca"));
        assert_eq!(element_symbol("12"), None);
    }
}
