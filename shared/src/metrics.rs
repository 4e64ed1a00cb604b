/*!
Shape metrics derived from a world-space bounding box.

Every classification predicate reads these numbers instead of raw geometry, which keeps the rule
table independent from mesh topology.

Conventions
- `thickness` is the vertical (Y) extent.
- `footprint_area` is the XZ area of the box.
- `aspect` is the planar aspect ratio, longer horizontal side over shorter (>= 1).
*/

use rapier3d::parry::bounding_volume::Aabb;

use crate::{
    constants::DIST_EPS,
    math::{Mat4, Point3, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshMetrics {
    pub size: Vec3,
    pub volume: f32,
    pub footprint_area: f32,
    pub max_dim: f32,
    pub min_dim: f32,
    pub thickness: f32,
    pub aspect: f32,
}

impl MeshMetrics {
    pub fn from_aabb(aabb: &Aabb) -> Self {
        let size = (aabb.maxs - aabb.mins).map(|v| v.max(0.0));
        let long = size.x.max(size.z);
        let short = size.x.min(size.z);

        Self {
            size,
            volume: size.x * size.y * size.z,
            footprint_area: size.x * size.z,
            max_dim: size.x.max(size.y).max(size.z),
            min_dim: size.x.min(size.y).min(size.z),
            thickness: size.y,
            aspect: if short > DIST_EPS { long / short } else { f32::INFINITY },
        }
    }

    /// Largest horizontal extent.
    #[inline]
    pub fn max_horizontal(&self) -> f32 {
        self.size.x.max(self.size.z)
    }

    /// True when fewer than two axes have a measurable extent (a point or a line).
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        let spans = [self.size.x, self.size.y, self.size.z]
            .iter()
            .filter(|&&v| v > DIST_EPS)
            .count();
        spans < 2
    }
}

/// Bounding box of `positions` after applying `matrix`.
///
/// Returns `None` for an empty buffer or when any transformed coordinate is not finite.
pub fn world_aabb(positions: &[[f32; 3]], matrix: &Mat4) -> Option<Aabb> {
    if positions.is_empty() {
        return None;
    }

    let mut aabb = Aabb::new_invalid();
    for p in positions {
        let w = matrix.transform_point(&Point3::new(p[0], p[1], p[2]));
        if !(w.x.is_finite() && w.y.is_finite() && w.z.is_finite()) {
            return None;
        }
        aabb.take_point(w);
    }
    Some(aabb)
}

/// Conservative world box of a local box under an affine matrix (all 8 corners).
pub fn transform_aabb(local: &Aabb, matrix: &Mat4) -> Aabb {
    let (lo, hi) = (local.mins, local.maxs);
    let mut out = Aabb::new_invalid();
    for i in 0..8 {
        let corner = Point3::new(
            if i & 1 == 0 { lo.x } else { hi.x },
            if i & 2 == 0 { lo.y } else { hi.y },
            if i & 4 == 0 { lo.z } else { hi.z },
        );
        out.take_point(matrix.transform_point(&corner));
    }
    out
}

/// Total area of the given triangles (m^2).
pub fn surface_area(positions: &[[f32; 3]], triangles: &[[u32; 3]]) -> f32 {
    triangles
        .iter()
        .map(|t| {
            let a = Vec3::from(positions[t[0] as usize]);
            let b = Vec3::from(positions[t[1] as usize]);
            let c = Vec3::from(positions[t[2] as usize]);
            (b - a).cross(&(c - a)).norm() * 0.5
        })
        .sum()
}
