//! Element colors and radii

use crate::settings::RenderStyle;

/// How a single element is drawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementStyle {
    /// 0xRRGGBB
    pub color: u32,
    /// Sphere radius in Angstrom
    pub radius: f32,
}

/// Jmol-style CPK color for an element symbol
pub fn cpk_color(element: &str) -> u32 {
    match element {
        "H" => 0xFFFFFF,
        "C" => 0x909090,
        "N" => 0x3050F8,
        "O" => 0xFF0D0D,
        "F" => 0x90E050,
        "P" => 0xFF8000,
        "S" => 0xFFFF30,
        "Cl" => 0x1FF01F,
        "Br" => 0xA62929,
        "I" => 0x940094,
        "Na" => 0xAB5CF2,
        "Mg" => 0x8AFF00,
        "Ca" => 0x3DFF00,
        "Fe" => 0xE06633,
        "Zn" => 0x7D80B0,
        "Si" => 0xF0C8A0,
        "B" => 0xFFB5B5,
        _ => 0xFF1493,
    }
}

/// Van der Waals radius (Angstrom)
fn vdw_radius(element: &str) -> f32 {
    match element {
        "H" => 1.10,
        "C" => 1.70,
        "N" => 1.55,
        "O" => 1.52,
        "F" => 1.47,
        "P" => 1.80,
        "S" => 1.80,
        "Cl" => 1.75,
        "Br" => 1.85,
        "I" => 1.98,
        _ => 1.80,
    }
}

pub fn element_style(element: &str, style: RenderStyle) -> ElementStyle {
    ElementStyle {
        color: cpk_color(element),
        radius: vdw_radius(element) * style.sphere_scale(),
    }
}

/// `#rrggbb` for CSS/canvas
pub fn css_color(color: u32) -> String {
    format!("#{:06x}", color & 0xFF_FFFF)
}
