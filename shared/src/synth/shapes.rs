use rapier3d::parry::bounding_volume::Aabb;

use crate::{config::SynthesisConfig, math::Vec3};

/// Axis-aligned box collider placement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoxPlan {
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Shrink a full size by the prop factor and clamp thin axes; returns half extents.
pub(crate) fn shrink_and_clamp(size: Vec3, config: &SynthesisConfig) -> Vec3 {
    let max_dim = size.x.max(size.y).max(size.z);
    let shrink = if max_dim < config.small_prop_max_dim {
        config.small_prop_shrink
    } else {
        config.large_prop_shrink
    };

    let full = Vec3::new(
        (size.x * shrink).max(config.min_plane_thickness),
        (size.y * shrink).max(config.min_vertical_thickness),
        (size.z * shrink).max(config.min_plane_thickness),
    );
    full * 0.5
}

/// Box collider for a prop from its world bounds.
pub fn prop_box(bounds: &Aabb, config: &SynthesisConfig) -> BoxPlan {
    let size = (bounds.maxs - bounds.mins).map(|v| v.max(0.0));
    BoxPlan {
        center: bounds.center().coords,
        half_extents: shrink_and_clamp(size, config),
    }
}

/// Two posts at the ends of the gate's width axis.
///
/// The opening between the posts is never narrower than `gate_min_gap`; when the art is too
/// narrow the posts are pushed outside its bounds instead of closing the gap.
pub fn gate_posts(bounds: &Aabb, config: &SynthesisConfig) -> [BoxPlan; 2] {
    let size = (bounds.maxs - bounds.mins).map(|v| v.max(0.0));
    let center = bounds.center().coords;

    let (axis, across) = if size.x >= size.z { (0, 2) } else { (2, 0) };
    let width = size[axis];

    let post_w = (width * config.gate_post_ratio).clamp(config.gate_post_min, config.gate_post_max);
    let inner_half = (config.gate_min_gap * 0.5).max(width * 0.5 - post_w);
    let offset = inner_half + post_w * 0.5;

    let mut half_extents = Vec3::zeros();
    half_extents[axis] = post_w * 0.5;
    half_extents[1] = size.y.max(config.min_vertical_thickness) * 0.5;
    half_extents[across] = size[across].max(config.gate_min_depth) * 0.5;

    let mut a = center;
    let mut b = center;
    a[axis] -= offset;
    b[axis] += offset;

    [
        BoxPlan {
            center: a,
            half_extents,
        },
        BoxPlan {
            center: b,
            half_extents,
        },
    ]
}

/// Clear width between two posts along the axis they are separated on.
pub fn opening_width(posts: &[BoxPlan; 2]) -> f32 {
    let d = posts[1].center - posts[0].center;
    let axis = if d.x.abs() >= d.z.abs() { 0 } else { 2 };
    d[axis].abs() - posts[0].half_extents[axis] - posts[1].half_extents[axis]
}
