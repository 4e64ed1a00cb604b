//! Rapier-backed [`PhysicsPort`] for a static world.
//!
//! Design
//! - Every static gets a fixed rigid body with its collider attached at identity.
//! - Broad/narrow phases are refreshed with a collision-only `CollisionPipeline` step on
//!   `commit`, so the world can answer scene queries and drive Rapier's KCC without dynamics.
//! - Sensors stay in the collider set (excluded from sweeps by the query filter) and are tested
//!   exactly against the character capsule on overlap queries.

use log::warn;
use rapier3d::parry::query::intersection_test;
use rapier3d::prelude::*;

use super::{
    BodyId, CapsuleShape, ColliderDesc, ColliderId, ColliderShape, KccSettings, PhysicsPort,
    SweepRequest, SweepResult,
};
use crate::{
    error::PhysicsError,
    math::{Iso, Vec3},
    sensor_tag::{SensorTag, pack_tag, try_unpack_tag},
};

pub struct RapierWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    pipeline: CollisionPipeline,
    body_handles: Vec<RigidBodyHandle>,
    collider_handles: Vec<ColliderHandle>,
    sensors: Vec<ColliderHandle>,
    settings: KccSettings,
    dirty: bool,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(KccSettings::default())
    }
}

impl RapierWorld {
    pub fn new(settings: KccSettings) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            pipeline: CollisionPipeline::new(),
            body_handles: Vec::new(),
            collider_handles: Vec::new(),
            sensors: Vec::new(),
            settings,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &KccSettings {
        &self.settings
    }

    /// Borrowed `QueryPipeline` over solid statics.
    fn query_pipeline(&self) -> QueryPipeline<'_> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default().exclude_sensors(),
        )
    }

    /// Downward ray from `origin`; returns the hit distance.
    pub fn cast_down(&mut self, origin: Vec3, max_dist: f32) -> Option<f32> {
        if self.dirty {
            self.commit();
        }
        let ray = Ray::new(origin.into(), -Vec3::y());
        self.query_pipeline()
            .cast_ray_and_get_normal(&ray, max_dist.max(0.0), true)
            .map(|(_, hit)| hit.time_of_impact)
    }
}

fn build_collider(desc: &ColliderDesc) -> Result<Collider, PhysicsError> {
    let builder = match &desc.shape {
        ColliderShape::TriMesh { vertices, indices } => {
            ColliderBuilder::trimesh(vertices.clone(), indices.clone())
                .map_err(|e| PhysicsError::ShapeCreation(format!("{e:?}")))?
        }
        ColliderShape::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }
        ColliderShape::Ball { radius } => ColliderBuilder::ball(*radius),
        ColliderShape::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),
        ColliderShape::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),
    };

    Ok(builder
        .friction(desc.friction)
        .sensor(desc.sensor)
        .user_data(desc.tag.map(pack_tag).unwrap_or(0))
        .build())
}

impl PhysicsPort for RapierWorld {
    fn create_static_body(&mut self, pose: Iso) -> BodyId {
        let rb = RigidBodyBuilder::fixed().pose(pose).build();
        let handle = self.bodies.insert(rb);
        self.body_handles.push(handle);
        BodyId(self.body_handles.len() as u32 - 1)
    }

    fn create_collider(
        &mut self,
        body: BodyId,
        desc: &ColliderDesc,
    ) -> Result<ColliderId, PhysicsError> {
        let parent = *self
            .body_handles
            .get(body.0 as usize)
            .ok_or(PhysicsError::UnknownBody(body))?;

        let collider = build_collider(desc)?;
        let handle = self
            .colliders
            .insert_with_parent(collider, parent, &mut self.bodies);

        if desc.sensor {
            self.sensors.push(handle);
        }
        self.collider_handles.push(handle);
        self.dirty = true;
        Ok(ColliderId(self.collider_handles.len() as u32 - 1))
    }

    fn set_collider_enabled(&mut self, collider: ColliderId, enabled: bool) -> bool {
        let Some(co) = self
            .collider_handles
            .get(collider.0 as usize)
            .and_then(|h| self.colliders.get_mut(*h))
        else {
            warn!("set_collider_enabled: {:?}", PhysicsError::UnknownCollider(collider));
            return false;
        };
        if co.is_enabled() != enabled {
            co.set_enabled(enabled);
            self.dirty = true;
        }
        true
    }

    fn is_collider_enabled(&self, collider: ColliderId) -> Option<bool> {
        self.collider_handles
            .get(collider.0 as usize)
            .and_then(|h| self.colliders.get(*h))
            .map(|co| co.is_enabled())
    }

    fn collider_count(&self) -> usize {
        self.collider_handles.len()
    }

    fn commit(&mut self) {
        let hooks = ();
        let events = ();
        self.pipeline.step(
            0.0,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &hooks,
            &events,
        );
        self.dirty = false;
    }

    fn sweep_capsule(&mut self, request: &SweepRequest) -> SweepResult {
        if self.dirty {
            self.commit();
        }

        let controller = self.settings.controller(request.snap_to_ground);
        let query_pipeline = self.query_pipeline();
        let p = request.position;

        let corrected = controller.move_shape(
            request.dt,
            &query_pipeline,
            &Capsule::new_y(request.capsule.half_height, request.capsule.radius),
            &Iso::translation(p.x, p.y, p.z),
            request.desired,
            |_| {},
        );

        SweepResult {
            translation: corrected.translation,
            grounded: corrected.grounded,
        }
    }

    fn overlap_sensors(&self, center: Vec3, capsule: CapsuleShape) -> Vec<SensorTag> {
        let shape = Capsule::new_y(capsule.half_height, capsule.radius);
        let pose = Iso::translation(center.x, center.y, center.z);

        self.sensors
            .iter()
            .filter_map(|h| self.colliders.get(*h))
            .filter(|co| co.is_enabled())
            .filter(|co| {
                intersection_test(&pose, &shape, co.position(), co.shape()).unwrap_or(false)
            })
            .filter_map(|co| try_unpack_tag(co.user_data))
            .collect()
    }
}
