//! Browser backends: the 3Dmol.js viewer bridge and the canvas painter for
//! the 2D fallback.
//!
//! Viewer handles are kept in a map owned by [`WebRenderer`], keyed by slot.
//! A slot `s` draws into the DOM element `#viewer-s` (3D) or `#canvas-s` (2D).

use std::collections::{BTreeSet, HashMap};

use glam::Vec3;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::style::{css_color, element_style};
use super::{Axis, RenderError, Renderer, RendererKind, Sketch};
use crate::molecule::parse_mol2;
use crate::settings::RenderStyle;

#[wasm_bindgen(inline_js = "
    export function mm_has_3dmol() {
        return typeof $3Dmol !== 'undefined';
    }

    export function mm_create_viewer(elementId) {
        const el = document.getElementById(elementId);
        if (!el) return null;
        return $3Dmol.createViewer(el, { backgroundColor: 'white' });
    }

    export function mm_load_model(viewer, text) {
        viewer.clear();
        viewer.addModel(text, 'mol2');
    }

    export function mm_clear(viewer) {
        viewer.clear();
        viewer.render();
    }

    export function mm_rotate(viewer, degrees, axis) {
        viewer.rotate(degrees, axis);
    }

    export function mm_set_element_style(viewer, elem, color, sphereScale, stickRadius) {
        const style = { sphere: { scale: sphereScale, color: color } };
        if (stickRadius > 0) {
            style.stick = { radius: stickRadius, color: color };
        }
        viewer.setStyle({ elem: elem }, style);
    }

    export function mm_zoom_to_fit(viewer) {
        viewer.zoomTo();
    }

    export function mm_render(viewer) {
        viewer.render();
    }

    export function mm_atom_positions(viewer) {
        const model = viewer.getModel();
        if (!model) return new Float32Array(0);
        const atoms = model.selectedAtoms({});
        const out = new Float32Array(atoms.length * 3);
        atoms.forEach((a, i) => {
            out[i * 3] = a.x;
            out[i * 3 + 1] = a.y;
            out[i * 3 + 2] = a.z;
        });
        return out;
    }

    export function mm_set_atom_positions(viewer, coords) {
        const model = viewer.getModel();
        if (!model) return;
        const atoms = model.selectedAtoms({});
        const n = Math.min(atoms.length, coords.length / 3);
        for (let i = 0; i < n; i++) {
            atoms[i].x = coords[i * 3];
            atoms[i].y = coords[i * 3 + 1];
            atoms[i].z = coords[i * 3 + 2];
        }
    }
")]
extern "C" {
    fn mm_has_3dmol() -> bool;
    fn mm_create_viewer(element_id: &str) -> JsValue;
    fn mm_load_model(viewer: &JsValue, text: &str);
    fn mm_clear(viewer: &JsValue);
    fn mm_rotate(viewer: &JsValue, degrees: f32, axis: &str);
    fn mm_set_element_style(
        viewer: &JsValue,
        elem: &str,
        color: &str,
        sphere_scale: f32,
        stick_radius: f32,
    );
    fn mm_zoom_to_fit(viewer: &JsValue);
    fn mm_render(viewer: &JsValue);
    fn mm_atom_positions(viewer: &JsValue) -> Vec<f32>;
    fn mm_set_atom_positions(viewer: &JsValue, coords: &[f32]);
}

/// Whether the 3D molecule library was loaded by the page
pub fn library_available() -> bool {
    mm_has_3dmol()
}

struct Viewer {
    handle: JsValue,
    /// Element symbols present in the loaded model
    elements: BTreeSet<String>,
}

/// 3D viewers, one per slot
#[derive(Default)]
pub struct WebRenderer {
    viewers: HashMap<String, Viewer>,
}

impl WebRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn viewer(&self, slot: &str) -> Option<&JsValue> {
        self.viewers.get(slot).map(|v| &v.handle)
    }
}

impl Renderer for WebRenderer {
    fn kind(&self) -> RendererKind {
        RendererKind::ThreeD
    }

    fn load_model(&mut self, slot: &str, mol2: &str) -> Result<(), RenderError> {
        // Validate before handing the text to the library
        let molecule = parse_mol2(mol2)?;
        let elements = molecule.atoms.iter().map(|a| a.element.clone()).collect();

        if !self.viewers.contains_key(slot) {
            let handle = mm_create_viewer(&format!("viewer-{slot}"));
            if handle.is_null() || handle.is_undefined() {
                return Err(RenderError::NoSurface(slot.to_string()));
            }
            self.viewers.insert(
                slot.to_string(),
                Viewer {
                    handle,
                    elements: BTreeSet::new(),
                },
            );
        }
        let viewer = self
            .viewers
            .get_mut(slot)
            .ok_or_else(|| RenderError::NoSurface(slot.to_string()))?;
        mm_load_model(&viewer.handle, mol2);
        viewer.elements = elements;
        Ok(())
    }

    fn clear(&mut self, slot: &str) {
        if let Some(viewer) = self.viewers.get_mut(slot) {
            mm_clear(&viewer.handle);
            viewer.elements.clear();
        }
    }

    fn rotate(&mut self, slot: &str, axis: Axis, degrees: f32) {
        if let Some(viewer) = self.viewer(slot) {
            mm_rotate(viewer, degrees, axis.as_str());
        }
    }

    fn set_style(&mut self, slot: &str, style: RenderStyle) {
        let Some(viewer) = self.viewers.get(slot) else {
            return;
        };
        for element in &viewer.elements {
            let look = element_style(element, style);
            mm_set_element_style(
                &viewer.handle,
                element,
                &css_color(look.color),
                style.sphere_scale(),
                style.stick_radius(),
            );
        }
    }

    fn zoom_to_fit(&mut self, slot: &str) {
        if let Some(viewer) = self.viewer(slot) {
            mm_zoom_to_fit(viewer);
        }
    }

    fn atom_positions(&self, slot: &str) -> Vec<Vec3> {
        let Some(viewer) = self.viewer(slot) else {
            return Vec::new();
        };
        mm_atom_positions(viewer)
            .chunks_exact(3)
            .map(|c| Vec3::new(c[0], c[1], c[2]))
            .collect()
    }

    fn set_atom_positions(&mut self, slot: &str, positions: &[Vec3]) {
        if let Some(viewer) = self.viewer(slot) {
            let coords: Vec<f32> = positions.iter().flat_map(|p| p.to_array()).collect();
            mm_set_atom_positions(viewer, &coords);
        }
    }

    fn render(&mut self, slot: &str) {
        if let Some(viewer) = self.viewer(slot) {
            mm_render(viewer);
        }
    }
}

/// Draw a sketch onto `#canvas-{slot}`, mapping [-1, 1] to the canvas square
pub fn paint_sketch(slot: &str, sketch: &Sketch) {
    let Some(canvas) = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(&format!("canvas-{slot}")))
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        log::debug!("No canvas for slot '{slot}'");
        return;
    };
    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        return;
    };

    let w = canvas.width() as f64;
    let h = canvas.height() as f64;
    let half = w.min(h) / 2.0;
    let to_px = |x: f32, y: f32| (w / 2.0 + x as f64 * half, h / 2.0 - y as f64 * half);

    ctx.set_fill_style_str("#ffffff");
    ctx.fill_rect(0.0, 0.0, w, h);

    ctx.set_stroke_style_str("#555555");
    for bond in &sketch.bonds {
        let (x0, y0) = to_px(bond.from.x, bond.from.y);
        let (x1, y1) = to_px(bond.to.x, bond.to.y);
        // Parallel strokes for multiple bonds
        let (dx, dy) = (x1 - x0, y1 - y0);
        let len = (dx * dx + dy * dy).sqrt().max(1e-6);
        let (nx, ny) = (-dy / len * 3.0, dx / len * 3.0);
        let strokes = bond.strokes.max(1) as f64;
        for i in 0..bond.strokes.max(1) {
            let offset = i as f64 - (strokes - 1.0) / 2.0;
            ctx.begin_path();
            ctx.move_to(x0 + nx * offset, y0 + ny * offset);
            ctx.line_to(x1 + nx * offset, y1 + ny * offset);
            ctx.stroke();
        }
    }

    for atom in &sketch.atoms {
        let (x, y) = to_px(atom.center.x, atom.center.y);
        let r = (atom.radius as f64 * half).max(2.0);
        ctx.begin_path();
        let _ = ctx.arc(x, y, r, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(&css_color(atom.color));
        ctx.fill();
        ctx.stroke();
    }
}
