/*!
Narrow physics port used by the load pipeline and the character controller.

The rest of the crate never touches engine handles: bodies and colliders are addressed by
[`BodyId`]/[`ColliderId`], shapes are described by [`ColliderShape`], and queries go through the
two calls the controller and interaction layer need (capsule sweep, sensor overlap).

Implementations
- [`RapierWorld`]: static Rapier world plus Rapier's `KinematicCharacterController`.
- [`FlatWorld`]: deterministic axis-aligned stand-in for tests and headless runs.
*/

pub mod flat;
pub mod rapier_world;
pub mod settings;

pub use flat::FlatWorld;
pub use rapier_world::RapierWorld;
pub use settings::KccSettings;

use crate::{
    error::PhysicsError,
    math::{Iso, Point3, Vec3},
    sensor_tag::SensorTag,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// Shape family of a collider, for records and logs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    TriMesh,
    Box,
    Ball,
    Cylinder,
    Capsule,
}

/// Collider geometry in the owning body's local frame.
#[derive(Clone, Debug, PartialEq)]
pub enum ColliderShape {
    TriMesh {
        vertices: Vec<Point3>,
        indices: Vec<[u32; 3]>,
    },
    Cuboid {
        half_extents: Vec3,
    },
    Ball {
        radius: f32,
    },
    CylinderY {
        radius: f32,
        half_height: f32,
    },
    CapsuleY {
        radius: f32,
        half_height: f32,
    },
}

impl ColliderShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::TriMesh { .. } => ShapeKind::TriMesh,
            Self::Cuboid { .. } => ShapeKind::Box,
            Self::Ball { .. } => ShapeKind::Ball,
            Self::CylinderY { .. } => ShapeKind::Cylinder,
            Self::CapsuleY { .. } => ShapeKind::Capsule,
        }
    }

    /// Half extents of the shape's local bounding box.
    pub fn half_extents(&self) -> Vec3 {
        match self {
            Self::TriMesh { vertices, .. } => {
                let mut lo = Vec3::repeat(f32::MAX);
                let mut hi = Vec3::repeat(f32::MIN);
                for v in vertices {
                    lo = lo.inf(&v.coords);
                    hi = hi.sup(&v.coords);
                }
                if vertices.is_empty() {
                    Vec3::zeros()
                } else {
                    (hi - lo) * 0.5
                }
            }
            Self::Cuboid { half_extents } => *half_extents,
            Self::Ball { radius } => Vec3::repeat(*radius),
            Self::CylinderY {
                radius,
                half_height,
            } => Vec3::new(*radius, *half_height, *radius),
            Self::CapsuleY {
                radius,
                half_height,
            } => Vec3::new(*radius, half_height + radius, *radius),
        }
    }
}

/// Everything needed to create one collider.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    pub friction: f32,
    pub sensor: bool,
    pub tag: Option<SensorTag>,
}

impl ColliderDesc {
    pub fn solid(shape: ColliderShape, friction: f32) -> Self {
        Self {
            shape,
            friction,
            sensor: false,
            tag: None,
        }
    }

    pub fn sensor(shape: ColliderShape, tag: SensorTag) -> Self {
        Self {
            shape,
            friction: 0.0,
            sensor: true,
            tag: Some(tag),
        }
    }
}

/// Y-aligned capsule of the character.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleShape {
    /// Distance from the capsule center to its lowest point.
    #[inline]
    pub fn half_total_height(&self) -> f32 {
        self.half_height + self.radius
    }
}

/// Capsule sweep request. `position` is the capsule center.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepRequest {
    pub position: Vec3,
    pub desired: Vec3,
    pub capsule: CapsuleShape,
    pub dt: f32,
    pub snap_to_ground: bool,
}

/// Achievable movement for a [`SweepRequest`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SweepResult {
    pub translation: Vec3,
    pub grounded: bool,
}

/// Physics world surface used by synthesis and the controller.
pub trait PhysicsPort {
    /// Fixed body at `pose`; colliders attached to it are expressed in its frame.
    fn create_static_body(&mut self, pose: Iso) -> BodyId;

    fn create_collider(
        &mut self,
        body: BodyId,
        desc: &ColliderDesc,
    ) -> Result<ColliderId, PhysicsError>;

    /// Returns `false` when the collider does not exist.
    fn set_collider_enabled(&mut self, collider: ColliderId, enabled: bool) -> bool;

    fn is_collider_enabled(&self, collider: ColliderId) -> Option<bool>;

    fn collider_count(&self) -> usize;

    /// Bring query structures up to date after creating or toggling colliders.
    fn commit(&mut self);

    /// Resolve a desired capsule displacement against solid colliders (sensors excluded).
    fn sweep_capsule(&mut self, request: &SweepRequest) -> SweepResult;

    /// Tags of enabled sensors intersecting the capsule centered at `center`.
    fn overlap_sensors(&self, center: Vec3, capsule: CapsuleShape) -> Vec<SensorTag>;
}
