//! Molecule viewers
//!
//! The game talks to viewers only through [`Renderer`]. Two backends exist:
//! the 3D molecule library in the browser (`web`) and a 2D projection
//! fallback (`flat`). The backend is picked once at startup.

pub mod flat;
pub mod style;
#[cfg(target_arch = "wasm32")]
pub mod web;

use glam::Vec3;
use thiserror::Error;

use crate::molecule::MolError;
use crate::settings::RenderStyle;

pub use flat::{FlatRenderer, Sketch, SketchAtom, SketchBond};
pub use style::{ElementStyle, cpk_color, element_style};

/// Rotation axis for per-axis viewer rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Full 3D molecule viewer
    ThreeD,
    /// 2D projection fallback
    Flat,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no viewer surface for slot '{0}'")]
    NoSurface(String),
    #[error("molecule rejected: {0}")]
    Model(#[from] MolError),
    #[error("viewer backend failed: {0}")]
    Backend(String),
}

/// Capability offered by a molecule viewer backend.
///
/// Commands addressed to a slot without a loaded model are ignored.
pub trait Renderer {
    fn kind(&self) -> RendererKind;

    /// Replace the slot's model with the given MOL2 text
    fn load_model(&mut self, slot: &str, mol2: &str) -> Result<(), RenderError>;

    /// Drop the slot's model
    fn clear(&mut self, slot: &str);

    /// Rotate the slot's current orientation about a coordinate axis
    fn rotate(&mut self, slot: &str, axis: Axis, degrees: f32);

    /// Apply drawing style and per-element colors
    fn set_style(&mut self, slot: &str, style: RenderStyle);

    fn zoom_to_fit(&mut self, slot: &str);

    /// Atom positions in model order (empty when nothing is loaded)
    fn atom_positions(&self, slot: &str) -> Vec<Vec3>;

    fn set_atom_positions(&mut self, slot: &str, positions: &[Vec3]);

    fn render(&mut self, slot: &str);
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn kind(&self) -> RendererKind {
        (**self).kind()
    }

    fn load_model(&mut self, slot: &str, mol2: &str) -> Result<(), RenderError> {
        (**self).load_model(slot, mol2)
    }

    fn clear(&mut self, slot: &str) {
        (**self).clear(slot)
    }

    fn rotate(&mut self, slot: &str, axis: Axis, degrees: f32) {
        (**self).rotate(slot, axis, degrees)
    }

    fn set_style(&mut self, slot: &str, style: RenderStyle) {
        (**self).set_style(slot, style)
    }

    fn zoom_to_fit(&mut self, slot: &str) {
        (**self).zoom_to_fit(slot)
    }

    fn atom_positions(&self, slot: &str) -> Vec<Vec3> {
        (**self).atom_positions(slot)
    }

    fn set_atom_positions(&mut self, slot: &str, positions: &[Vec3]) {
        (**self).set_atom_positions(slot, positions)
    }

    fn render(&mut self, slot: &str) {
        (**self).render(slot)
    }
}
