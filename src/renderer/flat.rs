//! 2D fallback viewer
//!
//! Keeps each slot's molecule in memory, applies rotations to the atom
//! coordinates and projects onto the XY plane. The resulting [`Sketch`] is
//! handed to a painter (a canvas on the web, nothing in headless runs).

use std::collections::HashMap;

use glam::{Mat3, Vec2, Vec3};

use super::style::element_style;
use super::{Axis, RenderError, Renderer, RendererKind};
use crate::molecule::{Molecule, parse_mol2};
use crate::settings::RenderStyle;
use crate::sim::rotation::centroid;

/// Padding around the molecule when fitting to the viewport (Angstrom)
const FIT_MARGIN: f32 = 1.5;

/// Atom disc in viewport coordinates ([-1, 1] after zoom-to-fit)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchAtom {
    pub center: Vec2,
    pub radius: f32,
    pub color: u32,
    /// Larger is closer to the viewer
    pub depth: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchBond {
    pub from: Vec2,
    pub to: Vec2,
    pub strokes: u8,
}

/// Draw list for one slot, atoms ordered back to front
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    pub atoms: Vec<SketchAtom>,
    pub bonds: Vec<SketchBond>,
}

type Painter = Box<dyn FnMut(&str, &Sketch)>;

struct FlatSlot {
    molecule: Molecule,
    style: RenderStyle,
    scale: f32,
}

#[derive(Default)]
pub struct FlatRenderer {
    slots: HashMap<String, FlatSlot>,
    painter: Option<Painter>,
}

impl FlatRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer that hands every rendered sketch to `painter`
    pub fn with_painter(painter: impl FnMut(&str, &Sketch) + 'static) -> Self {
        Self {
            slots: HashMap::new(),
            painter: Some(Box::new(painter)),
        }
    }

    /// Project the slot's molecule. `None` when nothing is loaded.
    pub fn sketch(&self, slot: &str) -> Option<Sketch> {
        let view = self.slots.get(slot)?;
        let center = centroid(&view.molecule.positions()).unwrap_or(Vec3::ZERO);
        let project = |p: Vec3| ((p - center) * view.scale).truncate();

        let mut atoms: Vec<SketchAtom> = view
            .molecule
            .atoms
            .iter()
            .map(|atom| {
                let style = element_style(&atom.element, view.style);
                SketchAtom {
                    center: project(atom.position),
                    radius: style.radius * view.scale,
                    color: style.color,
                    depth: (atom.position.z - center.z) * view.scale,
                }
            })
            .collect();
        atoms.sort_by(|a, b| a.depth.total_cmp(&b.depth));

        let bonds = view
            .molecule
            .bonds
            .iter()
            .filter_map(|bond| {
                let a = view.molecule.atoms.get(bond.a)?;
                let b = view.molecule.atoms.get(bond.b)?;
                Some(SketchBond {
                    from: project(a.position),
                    to: project(b.position),
                    strokes: bond.order.strokes(),
                })
            })
            .collect();

        Some(Sketch { atoms, bonds })
    }

    pub fn has_model(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }
}

impl Renderer for FlatRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::Flat
    }

    fn load_model(&mut self, slot: &str, mol2: &str) -> Result<(), RenderError> {
        let molecule = parse_mol2(mol2)?;
        self.slots.insert(
            slot.to_string(),
            FlatSlot {
                molecule,
                style: RenderStyle::default(),
                scale: 1.0,
            },
        );
        Ok(())
    }

    fn clear(&mut self, slot: &str) {
        self.slots.remove(slot);
    }

    fn rotate(&mut self, slot: &str, axis: Axis, degrees: f32) {
        let Some(view) = self.slots.get_mut(slot) else {
            return;
        };
        let positions = view.molecule.positions();
        let Some(center) = centroid(&positions) else {
            return;
        };
        let rotation = Mat3::from_axis_angle(axis.unit(), degrees.to_radians());
        let rotated: Vec<Vec3> = positions
            .iter()
            .map(|&p| rotation * (p - center) + center)
            .collect();
        view.molecule.set_positions(&rotated);
    }

    fn set_style(&mut self, slot: &str, style: RenderStyle) {
        if let Some(view) = self.slots.get_mut(slot) {
            view.style = style;
        }
    }

    fn zoom_to_fit(&mut self, slot: &str) {
        if let Some(view) = self.slots.get_mut(slot) {
            view.scale = 1.0 / (view.molecule.radius() + FIT_MARGIN);
        }
    }

    fn atom_positions(&self, slot: &str) -> Vec<Vec3> {
        self.slots
            .get(slot)
            .map(|v| v.molecule.positions())
            .unwrap_or_default()
    }

    fn set_atom_positions(&mut self, slot: &str, positions: &[Vec3]) {
        if let Some(view) = self.slots.get_mut(slot) {
            view.molecule.set_positions(positions);
        }
    }

    fn render(&mut self, slot: &str) {
        let Some(sketch) = self.sketch(slot) else {
            return;
        };
        if let Some(painter) = self.painter.as_mut() {
            painter(slot, &sketch);
        }
    }
}
