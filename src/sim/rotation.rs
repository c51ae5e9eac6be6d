//! Seeded orientation for each rendered slot
//!
//! Every viewer (target + options) gets its own reproducible orientation:
//! the seed is derived from the slot id, the molecule path and the slot index,
//! so the same molecule shown in two slots never starts out looking the same.

use glam::{Mat3, Vec3};

use super::hash::hash_str;
use super::rng::SeededRng;
use crate::consts::{PATH_HASH_MULTIPLIER, SLOT_SEED_STRIDE};
use crate::renderer::{Axis, Renderer};

/// Per-axis rotation in degrees, applied X then Y then Z
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Extra rotation about an arbitrary axis through the molecule centroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTwist {
    pub axis: Vec3,
    pub degrees: f32,
}

/// Everything needed to orient one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPlan {
    pub seed: i64,
    pub orientation: Orientation,
    pub twist: Option<AxisTwist>,
}

/// Seed for a slot: `hash(slot) + hash(path) * 777 + index * stride`
pub fn slot_seed(slot_id: &str, molecule_path: &str, slot_index: usize) -> i64 {
    hash_str(slot_id) as i64
        + hash_str(molecule_path) as i64 * PATH_HASH_MULTIPLIER
        + slot_index as i64 * SLOT_SEED_STRIDE
}

impl RotationPlan {
    /// Derive the plan for a slot. `with_twist` enables the arbitrary-axis pass.
    pub fn for_slot(
        slot_id: &str,
        molecule_path: &str,
        slot_index: usize,
        with_twist: bool,
    ) -> Self {
        Self::from_seed(slot_seed(slot_id, molecule_path, slot_index), with_twist)
    }

    pub fn from_seed(seed: i64, with_twist: bool) -> Self {
        let mut rng = SeededRng::new(seed);
        let orientation = Orientation {
            x: rng.next_float(0.0, 360.0) as f32,
            y: rng.next_float(0.0, 360.0) as f32,
            z: rng.next_float(0.0, 360.0) as f32,
        };
        let twist = with_twist.then(|| AxisTwist {
            axis: Vec3::new(
                rng.next_float(-1.0, 1.0) as f32,
                rng.next_float(-1.0, 1.0) as f32,
                rng.next_float(-1.0, 1.0) as f32,
            ),
            degrees: rng.next_float(0.0, 360.0) as f32,
        });
        Self {
            seed,
            orientation,
            twist,
        }
    }

    /// Compose the rotations onto the slot's current orientation
    pub fn apply<R: Renderer + ?Sized>(&self, renderer: &mut R, slot: &str) {
        renderer.rotate(slot, Axis::X, self.orientation.x);
        renderer.rotate(slot, Axis::Y, self.orientation.y);
        renderer.rotate(slot, Axis::Z, self.orientation.z);

        if let Some(twist) = self.twist {
            rotate_model_about_axis(renderer, slot, twist.axis, twist.degrees);
        }
    }
}

/// Rodrigues rotation matrix `I + sin(θ)K + (1 - cos(θ))K²`.
/// Returns `None` for a zero-length (or non-finite) axis.
pub fn rodrigues_matrix(axis: Vec3, radians: f32) -> Option<Mat3> {
    let len = axis.length();
    if !len.is_finite() || len <= f32::EPSILON {
        return None;
    }
    let k = axis / len;

    // Cross-product matrix of k, column-major
    let skew = Mat3::from_cols(
        Vec3::new(0.0, k.z, -k.y),
        Vec3::new(-k.z, 0.0, k.x),
        Vec3::new(k.y, -k.x, 0.0),
    );

    Some(Mat3::IDENTITY + skew * radians.sin() + skew * skew * (1.0 - radians.cos()))
}

/// Mean atom position
pub fn centroid(positions: &[Vec3]) -> Option<Vec3> {
    if positions.is_empty() {
        return None;
    }
    let sum: Vec3 = positions.iter().copied().sum();
    Some(sum / positions.len() as f32)
}

/// Rotate positions in place about `axis` through their centroid.
/// Returns false (and leaves positions untouched) for empty input or a degenerate axis.
pub fn rotate_about_centroid(positions: &mut [Vec3], axis: Vec3, degrees: f32) -> bool {
    let Some(center) = centroid(positions) else {
        return false;
    };
    let Some(rotation) = rodrigues_matrix(axis, degrees.to_radians()) else {
        log::debug!("Skipping axis rotation: zero-length axis");
        return false;
    };

    for p in positions.iter_mut() {
        *p = rotation * (*p - center) + center;
    }
    true
}

/// Read atoms from the renderer, rotate about the centroid, write them back
pub fn rotate_model_about_axis<R: Renderer + ?Sized>(
    renderer: &mut R,
    slot: &str,
    axis: Vec3,
    degrees: f32,
) {
    let mut positions = renderer.atom_positions(slot);
    if rotate_about_centroid(&mut positions, axis, degrees) {
        renderer.set_atom_positions(slot, &positions);
    }
}
