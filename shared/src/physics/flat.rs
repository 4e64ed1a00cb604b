/*!
Deterministic, engine-free [`PhysicsPort`].

Model
- Optional infinite ground plane.
- Cuboids are solid axis-aligned boxes (the world AABB of the posed cuboid).
- Trimeshes are one-way floors at the top of their world AABB: the capsule can land on them
  from above but passes through their sides.
- Sweeps resolve X, then Z, then Y. A solid whose top is within the autostep height of the
  feet is stepped onto instead of blocking.
- Ball sensors are tested by distance to the capsule axis, cylinders by planar distance plus
  vertical span.

Good enough to exercise the controller and interaction rules without floating-point engine noise.
*/

use rapier3d::parry::bounding_volume::Aabb;

use super::{
    BodyId, CapsuleShape, ColliderDesc, ColliderId, ColliderShape, KccSettings, PhysicsPort,
    SweepRequest, SweepResult,
};
use crate::{
    error::PhysicsError,
    math::{Iso, Point3, Vec3},
    sensor_tag::SensorTag,
};

/// Vertical tolerance for "standing on" tests (meters).
const CONTACT_EPS: f32 = 1.0e-3;

#[derive(Clone, Debug)]
enum FlatShape {
    Solid(Aabb),
    Floor(Aabb),
    Ball { center: Vec3, radius: f32 },
    Cylinder { center: Vec3, radius: f32, half_height: f32 },
}

#[derive(Clone, Debug)]
struct FlatCollider {
    shape: FlatShape,
    tag: Option<SensorTag>,
    enabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct FlatWorld {
    ground_y: Option<f32>,
    bodies: Vec<Iso>,
    colliders: Vec<FlatCollider>,
    settings: KccSettings,
}

impl FlatWorld {
    pub fn new(settings: KccSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn with_ground_plane(mut self, y: f32) -> Self {
        self.ground_y = Some(y);
        self
    }

    fn posed_aabb(pose: &Iso, half: &Vec3) -> Aabb {
        let mut out = Aabb::new_invalid();
        for i in 0..8 {
            let local = Point3::new(
                if i & 1 == 0 { -half.x } else { half.x },
                if i & 2 == 0 { -half.y } else { half.y },
                if i & 4 == 0 { -half.z } else { half.z },
            );
            out.take_point(pose * local);
        }
        out
    }

    fn solids(&self) -> impl Iterator<Item = &Aabb> {
        self.colliders.iter().filter_map(|c| match &c.shape {
            FlatShape::Solid(aabb) if c.enabled => Some(aabb),
            _ => None,
        })
    }

    /// Heights the capsule can stand on at planar position `p`.
    fn supports_at(&self, p: &Vec3, radius: f32) -> Vec<f32> {
        let mut tops: Vec<f32> = self.ground_y.into_iter().collect();
        for c in self.colliders.iter().filter(|c| c.enabled) {
            let (aabb, reach) = match &c.shape {
                FlatShape::Solid(aabb) => (aabb, radius),
                FlatShape::Floor(aabb) => (aabb, 0.0),
                _ => continue,
            };
            if p.x >= aabb.mins.x - reach
                && p.x <= aabb.maxs.x + reach
                && p.z >= aabb.mins.z - reach
                && p.z <= aabb.maxs.z + reach
            {
                tops.push(aabb.maxs.y);
            }
        }
        tops
    }

    /// Solid boxes overlapping the region swept by the capsule's bounding box from `a` to `b`.
    fn blocking(&self, a: &Vec3, b: &Vec3, capsule: &CapsuleShape) -> Vec<Aabb> {
        let extent = Vec3::new(capsule.radius, capsule.half_total_height(), capsule.radius);
        let lo = a.inf(b) - extent;
        let hi = a.sup(b) + extent;
        self.solids()
            .filter(|s| {
                hi.x > s.mins.x
                    && lo.x < s.maxs.x
                    && hi.z > s.mins.z
                    && lo.z < s.maxs.z
                    && hi.y > s.mins.y + CONTACT_EPS
                    && lo.y < s.maxs.y - CONTACT_EPS
            })
            .copied()
            .collect()
    }

    /// Move along one horizontal axis (0 = X, 2 = Z), stepping up low obstacles.
    fn resolve_axis(&self, p: &mut Vec3, delta: f32, axis: usize, capsule: &CapsuleShape) {
        if delta == 0.0 {
            return;
        }
        let before = self.blocking(p, p, capsule);
        let mut next = *p;
        next[axis] += delta;

        let feet = p.y - capsule.half_total_height();
        let gap = self.settings.offset.min(0.01);
        for b in self.blocking(p, &next, capsule) {
            if before.contains(&b) {
                continue;
            }
            if b.maxs.y - feet <= self.settings.autostep_max_height {
                next.y = next.y.max(b.maxs.y + capsule.half_total_height());
                continue;
            }
            next[axis] = if delta > 0.0 {
                (b.mins[axis] - capsule.radius - gap).max(p[axis]).min(next[axis])
            } else {
                (b.maxs[axis] + capsule.radius + gap).min(p[axis]).max(next[axis])
            };
        }
        *p = next;
    }
}

impl PhysicsPort for FlatWorld {
    fn create_static_body(&mut self, pose: Iso) -> BodyId {
        self.bodies.push(pose);
        BodyId(self.bodies.len() as u32 - 1)
    }

    fn create_collider(
        &mut self,
        body: BodyId,
        desc: &ColliderDesc,
    ) -> Result<ColliderId, PhysicsError> {
        let pose = *self
            .bodies
            .get(body.0 as usize)
            .ok_or(PhysicsError::UnknownBody(body))?;

        let shape = match &desc.shape {
            ColliderShape::TriMesh { vertices, indices } => {
                if vertices.is_empty() || indices.is_empty() {
                    return Err(PhysicsError::ShapeCreation("empty triangle mesh".into()));
                }
                let mut aabb = Aabb::new_invalid();
                for v in vertices {
                    aabb.take_point(pose * *v);
                }
                FlatShape::Floor(aabb)
            }
            ColliderShape::Cuboid { half_extents } if desc.sensor => FlatShape::Ball {
                center: pose.translation.vector,
                radius: half_extents.norm(),
            },
            ColliderShape::Cuboid { half_extents } => {
                FlatShape::Solid(Self::posed_aabb(&pose, half_extents))
            }
            ColliderShape::Ball { radius } if desc.sensor => FlatShape::Ball {
                center: pose.translation.vector,
                radius: *radius,
            },
            ColliderShape::Ball { radius } => {
                FlatShape::Solid(Self::posed_aabb(&pose, &Vec3::repeat(*radius)))
            }
            ColliderShape::CylinderY {
                radius,
                half_height,
            }
            | ColliderShape::CapsuleY {
                radius,
                half_height,
            } => {
                if desc.sensor {
                    FlatShape::Cylinder {
                        center: pose.translation.vector,
                        radius: *radius,
                        half_height: *half_height,
                    }
                } else {
                    let half = Vec3::new(*radius, *half_height, *radius);
                    FlatShape::Solid(Self::posed_aabb(&pose, &half))
                }
            }
        };

        self.colliders.push(FlatCollider {
            shape,
            tag: if desc.sensor { desc.tag } else { None },
            enabled: true,
        });
        Ok(ColliderId(self.colliders.len() as u32 - 1))
    }

    fn set_collider_enabled(&mut self, collider: ColliderId, enabled: bool) -> bool {
        match self.colliders.get_mut(collider.0 as usize) {
            Some(c) => {
                c.enabled = enabled;
                true
            }
            None => false,
        }
    }

    fn is_collider_enabled(&self, collider: ColliderId) -> Option<bool> {
        self.colliders.get(collider.0 as usize).map(|c| c.enabled)
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    fn commit(&mut self) {}

    fn sweep_capsule(&mut self, request: &SweepRequest) -> SweepResult {
        let capsule = request.capsule;
        let half = capsule.half_total_height();
        let start = request.position;
        let mut p = start;

        self.resolve_axis(&mut p, request.desired.x, 0, &capsule);
        self.resolve_axis(&mut p, request.desired.z, 2, &capsule);

        // Autostep may already have lifted the capsule; vertical motion is applied on top.
        let feet_before = p.y - half;
        let mut grounded = false;
        let dy = request.desired.y;

        if dy <= 0.0 {
            let target_feet = feet_before + dy;
            let snap = if request.snap_to_ground {
                self.settings.snap_distance
            } else {
                0.0
            };

            // Highest surface at or below the feet that the motion (plus snap) reaches.
            let landing = self
                .supports_at(&p, capsule.radius)
                .into_iter()
                .filter(|&top| top <= feet_before + CONTACT_EPS && top >= target_feet - snap)
                .fold(None, |best: Option<f32>, top| Some(best.map_or(top, |b| b.max(top))));

            match landing {
                Some(top) => {
                    p.y = top + half;
                    grounded = true;
                }
                None => p.y += dy,
            }
        } else {
            let head_before = p.y + half;
            let mut target = p.y + dy;
            for b in self.solids() {
                let overlaps_xz = p.x + capsule.radius > b.mins.x
                    && p.x - capsule.radius < b.maxs.x
                    && p.z + capsule.radius > b.mins.z
                    && p.z - capsule.radius < b.maxs.z;
                if overlaps_xz && b.mins.y >= head_before - CONTACT_EPS {
                    target = target.min(b.mins.y - half - CONTACT_EPS).max(p.y);
                }
            }
            p.y = target;
        }

        SweepResult {
            translation: p - start,
            grounded,
        }
    }

    fn overlap_sensors(&self, center: Vec3, capsule: CapsuleShape) -> Vec<SensorTag> {
        let seg_lo = center.y - capsule.half_height;
        let seg_hi = center.y + capsule.half_height;

        self.colliders
            .iter()
            .filter(|c| c.enabled)
            .filter(|c| match &c.shape {
                FlatShape::Ball { center: s, radius } => {
                    let closest = Vec3::new(center.x, s.y.clamp(seg_lo, seg_hi), center.z);
                    (closest - s).norm_squared() <= (radius + capsule.radius).powi(2)
                }
                FlatShape::Cylinder {
                    center: s,
                    radius,
                    half_height,
                } => {
                    let dx = center.x - s.x;
                    let dz = center.z - s.z;
                    let planar = dx * dx + dz * dz <= (radius + capsule.radius).powi(2);
                    let vertical = seg_hi + capsule.radius >= s.y - half_height
                        && seg_lo - capsule.radius <= s.y + half_height;
                    planar && vertical
                }
                _ => false,
            })
            .filter_map(|c| c.tag)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const CAPSULE: CapsuleShape = CapsuleShape {
        radius: 0.35,
        half_height: 0.55,
    };

    fn request(position: Vec3, desired: Vec3) -> SweepRequest {
        SweepRequest {
            position,
            desired,
            capsule: CAPSULE,
            dt: 1.0 / 60.0,
            snap_to_ground: true,
        }
    }

    fn add_box(world: &mut FlatWorld, center: Vec3, half: Vec3) -> ColliderId {
        let body = world.create_static_body(Iso::translation(center.x, center.y, center.z));
        world
            .create_collider(
                body,
                &ColliderDesc::solid(ColliderShape::Cuboid { half_extents: half }, 1.0),
            )
            .expect("box")
    }

    #[test]
    fn lands_on_ground_plane() {
        let mut world = FlatWorld::default().with_ground_plane(0.0);
        let out = world.sweep_capsule(&request(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -0.5, 0.0)));
        assert!(out.grounded);
        assert_abs_diff_eq!(out.translation.y, -0.1, epsilon = 1.0e-5);
    }

    #[test]
    fn free_fall_without_support() {
        let mut world = FlatWorld::default();
        let out = world.sweep_capsule(&request(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -0.5, 0.0)));
        assert!(!out.grounded);
        assert_abs_diff_eq!(out.translation.y, -0.5);
    }

    #[test]
    fn wall_blocks_horizontal_motion() {
        let mut world = FlatWorld::default().with_ground_plane(0.0);
        add_box(&mut world, Vec3::new(2.0, 1.5, 0.0), Vec3::new(0.5, 1.5, 2.0));

        let out = world.sweep_capsule(&request(Vec3::new(0.0, 0.9, 0.0), Vec3::new(3.0, 0.0, 0.0)));
        assert!(out.translation.x < 1.5 - CAPSULE.radius + 1.0e-3);
        assert!(out.translation.x > 1.0);
    }

    #[test]
    fn low_step_is_climbed() {
        let mut world = FlatWorld::default().with_ground_plane(0.0);
        add_box(&mut world, Vec3::new(2.0, 0.1, 0.0), Vec3::new(1.0, 0.1, 1.0));

        let out = world.sweep_capsule(&request(Vec3::new(0.0, 0.9, 0.0), Vec3::new(1.5, -0.01, 0.0)));
        assert_abs_diff_eq!(out.translation.x, 1.5);
        assert!(out.grounded);
        assert_abs_diff_eq!(out.translation.y, 0.2, epsilon = 1.0e-4);
    }

    #[test]
    fn trimesh_is_a_one_way_floor() {
        let mut world = FlatWorld::default();
        let body = world.create_static_body(Iso::identity());
        world
            .create_collider(
                body,
                &ColliderDesc::solid(
                    ColliderShape::TriMesh {
                        vertices: vec![
                            Point3::new(-5.0, 2.0, -5.0),
                            Point3::new(5.0, 2.0, -5.0),
                            Point3::new(5.0, 2.0, 5.0),
                        ],
                        indices: vec![[0, 1, 2]],
                    },
                    1.0,
                ),
            )
            .expect("trimesh");

        let down = world.sweep_capsule(&request(Vec3::new(1.0, 3.0, 0.0), Vec3::new(0.0, -1.0, 0.0)));
        assert!(down.grounded);
        assert_abs_diff_eq!(down.translation.y, -0.1, epsilon = 1.0e-5);

        let up = world.sweep_capsule(&request(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)));
        assert_abs_diff_eq!(up.translation.y, 1.0);
    }

    #[test]
    fn ceiling_blocks_rise() {
        let mut world = FlatWorld::default().with_ground_plane(0.0);
        add_box(&mut world, Vec3::new(0.0, 3.0, 0.0), Vec3::new(2.0, 0.5, 2.0));

        let out = world.sweep_capsule(&request(Vec3::new(0.0, 0.9, 0.0), Vec3::new(0.0, 2.0, 0.0)));
        assert!(out.translation.y < 0.71);
        assert!(!out.grounded);
    }

    #[test]
    fn sensors_resolve_to_tags_until_disabled() {
        let mut world = FlatWorld::default();
        let body = world.create_static_body(Iso::translation(0.0, 2.0, 0.0));
        let id = world
            .create_collider(
                body,
                &ColliderDesc::sensor(ColliderShape::Ball { radius: 1.0 }, SensorTag::pickup(0)),
            )
            .expect("ball");

        let center = Vec3::new(0.5, 0.9, 0.0);
        assert_eq!(world.overlap_sensors(center, CAPSULE), vec![SensorTag::pickup(0)]);

        world.set_collider_enabled(id, false);
        assert!(world.overlap_sensors(center, CAPSULE).is_empty());
        assert!(!world.set_collider_enabled(ColliderId(99), true));
    }
}
