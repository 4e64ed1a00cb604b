/*!
ColliderSynthesizer: turns classified meshes and registry records into static colliders.

Shapes
- Walkable: exact world-space trimesh, plus a shrunk "core" box under large flat surfaces so
  the capsule cannot slip into seams between triangles. Instanced walkables get one unshrunk
  box per tile and no core.
- Prop: box from the world bounds, shrunk (more for small props) and clamped to a minimum
  thickness. Instanced props get one oriented box per instance.
- GateFrame: two posts at the edges of the width axis, always leaving `gate_min_gap` open.
- Pickup / portal / NPC: tagged sensors (ball / cylinder / cylinder).

Every collider has a stable name (`walk:3:tri`, `prop:7:i12`, `pickup:4`, ...). A name already
built is skipped, so running `build` twice over the same classification creates nothing new.
A mesh that fails is logged and skipped; the build always completes.
*/

mod shapes;

pub use shapes::{BoxPlan, gate_posts, opening_width, prop_box};

use std::collections::HashSet;

use log::{info, warn};

use crate::{
    classify::{ClassifiedMesh, MeshId, MeshRole, MeshSource},
    config::SynthesisConfig,
    constants::MIN_TRIANGLE_AREA2,
    error::{SynthError, SynthResult},
    math::{Iso, Point3, Vec3},
    physics::{BodyId, ColliderDesc, ColliderId, ColliderShape, PhysicsPort, ShapeKind},
    registry::Registries,
    sensor_tag::SensorTag,
};

/// One collider as built.
#[derive(Clone, Debug, PartialEq)]
pub struct ColliderRecord {
    pub name: String,
    pub mesh: Option<MeshId>,
    pub kind: ShapeKind,
    pub transform: Iso,
    pub half_extents: Vec3,
    pub friction: f32,
    pub sensor: bool,
    pub body: BodyId,
    pub collider: ColliderId,
    pub tag: Option<SensorTag>,
}

#[derive(Debug)]
pub struct SynthFailure {
    pub name: String,
    pub error: SynthError,
}

#[derive(Debug, Default)]
pub struct SynthesisReport {
    pub built: usize,
    pub skipped_duplicates: usize,
    pub failures: Vec<SynthFailure>,
}

/// A collider waiting to be emitted.
#[derive(Clone, Debug)]
struct Planned {
    name: String,
    pose: Iso,
    desc: ColliderDesc,
}

#[derive(Debug, Default)]
pub struct ColliderSynthesizer {
    config: SynthesisConfig,
    records: Vec<ColliderRecord>,
    names: HashSet<String>,
}

impl ColliderSynthesizer {
    pub fn new(config: SynthesisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn records(&self) -> &[ColliderRecord] {
        &self.records
    }

    pub fn records_for(&self, mesh: MeshId) -> impl Iterator<Item = &ColliderRecord> {
        self.records.iter().filter(move |r| r.mesh == Some(mesh))
    }

    pub fn solid_count(&self) -> usize {
        self.records.iter().filter(|r| !r.sensor).count()
    }

    /// Build colliders for `meshes` and the sensor-bearing records in `registries`.
    pub fn build<P: PhysicsPort>(
        &mut self,
        meshes: &[ClassifiedMesh],
        registries: &mut Registries,
        physics: &mut P,
    ) -> SynthesisReport {
        let mut report = SynthesisReport::default();

        for mesh in meshes {
            let planned = match self.plan_mesh(mesh) {
                Ok(planned) => planned,
                Err(error) => {
                    warn!("synthesis skipped '{}': {error}", mesh.name);
                    report.failures.push(SynthFailure {
                        name: mesh.name.clone(),
                        error,
                    });
                    continue;
                }
            };

            for plan in planned {
                self.emit_reported(plan, Some(mesh.id), physics, &mut report);
            }
        }

        self.build_sensors(registries, physics, &mut report);
        physics.commit();

        info!(
            "synthesis: built {}, duplicates skipped {}, failures {} (total colliders {})",
            report.built,
            report.skipped_duplicates,
            report.failures.len(),
            self.records.len()
        );
        report
    }

    fn build_sensors<P: PhysicsPort>(
        &mut self,
        registries: &mut Registries,
        physics: &mut P,
        report: &mut SynthesisReport,
    ) {
        let pickups: Vec<_> = registries
            .pickups
            .iter()
            .map(|(h, p)| (h, p.mesh, p.anchor, p.radius))
            .collect();
        for (handle, mesh, anchor, radius) in pickups {
            let plan = Planned {
                name: format!("pickup:{}", handle.index()),
                pose: Iso::translation(anchor.x, anchor.y, anchor.z),
                desc: ColliderDesc::sensor(
                    ColliderShape::Ball { radius },
                    SensorTag::pickup(handle.index()),
                ),
            };
            if let Some(id) = self.emit_reported(plan, Some(mesh), physics, report) {
                registries.set_pickup_collider(handle, id);
            }
        }

        let portals: Vec<_> = registries
            .portals
            .iter()
            .map(|(h, p)| (h, p.mesh, p.anchor, p.radius, p.half_height))
            .collect();
        for (handle, mesh, anchor, radius, half_height) in portals {
            let plan = Planned {
                name: format!("portal:{}", handle.index()),
                pose: Iso::translation(anchor.x, anchor.y + half_height, anchor.z),
                desc: ColliderDesc::sensor(
                    ColliderShape::CylinderY {
                        radius,
                        half_height,
                    },
                    SensorTag::portal(handle.index()),
                ),
            };
            if let Some(id) = self.emit_reported(plan, Some(mesh), physics, report) {
                registries.set_portal_collider(handle, id);
            }
        }

        let npcs: Vec<_> = registries
            .npcs
            .iter()
            .map(|(h, n)| (h, n.mesh, n.anchor, n.radius, n.half_height))
            .collect();
        for (handle, mesh, anchor, radius, half_height) in npcs {
            let plan = Planned {
                name: format!("npc:{}", handle.index()),
                pose: Iso::translation(anchor.x, anchor.y + half_height, anchor.z),
                desc: ColliderDesc::sensor(
                    ColliderShape::CylinderY {
                        radius,
                        half_height,
                    },
                    SensorTag::npc(handle.index()),
                ),
            };
            if let Some(id) = self.emit_reported(plan, Some(mesh), physics, report) {
                registries.set_npc_collider(handle, id);
            }
        }
    }

    /// Solid colliders for one mesh. Sensors come from the registries instead.
    fn plan_mesh(&self, mesh: &ClassifiedMesh) -> SynthResult<Vec<Planned>> {
        match mesh.role {
            MeshRole::Walkable => self.plan_walkable(mesh),
            MeshRole::Prop => Ok(self.plan_props(mesh)),
            MeshRole::GateFrame => Ok(self.plan_gate(mesh)),
            MeshRole::Water | MeshRole::Pickup | MeshRole::Excluded(_) => Ok(Vec::new()),
        }
    }

    fn plan_walkable(&self, mesh: &ClassifiedMesh) -> SynthResult<Vec<Planned>> {
        let friction = if mesh.slippery {
            self.config.slippery_friction
        } else {
            self.config.walkable_friction
        };

        let mut planned = match &mesh.source {
            MeshSource::Single {
                vertices,
                triangles,
            } => {
                let indices = clean_triangles(vertices, triangles);
                if indices.is_empty() {
                    return Err(SynthError::Degenerate(format!(
                        "'{}' has no usable triangles",
                        mesh.name
                    )));
                }
                vec![Planned {
                    name: format!("walk:{}:tri", mesh.id.0),
                    pose: Iso::identity(),
                    desc: ColliderDesc::solid(
                        ColliderShape::TriMesh {
                            vertices: vertices.clone(),
                            indices,
                        },
                        friction,
                    ),
                }]
            }
            // Instanced walkables keep no per-vertex data; use unshrunk oriented boxes.
            MeshSource::Instanced { .. } => {
                let unshrunk = SynthesisConfig {
                    small_prop_shrink: 1.0,
                    large_prop_shrink: 1.0,
                    ..self.config.clone()
                };
                self.instance_boxes(mesh, &unshrunk, "walk", friction)
            }
        };

        // Instanced tiles get no core; their union bounds span the gaps between tiles.
        let single = matches!(mesh.source, MeshSource::Single { .. });
        let m = &mesh.metrics;
        let c = &self.config;
        if single
            && m.footprint_area > c.core_min_area
            && m.thickness < c.core_max_thickness
            && m.max_dim > c.core_min_max_dim
        {
            let top = mesh.bounds.maxs.y - c.core_top_inset;
            let height = (m.thickness - c.core_top_inset).max(c.core_min_height);
            let center = mesh.bounds.center();
            planned.push(Planned {
                name: format!("walk:{}:core", mesh.id.0),
                pose: Iso::translation(center.x, top - height * 0.5, center.z),
                desc: ColliderDesc::solid(
                    ColliderShape::Cuboid {
                        half_extents: Vec3::new(
                            m.size.x * 0.5 * c.core_xz_shrink,
                            height * 0.5,
                            m.size.z * 0.5 * c.core_xz_shrink,
                        ),
                    },
                    friction,
                ),
            });
        }

        Ok(planned)
    }

    fn plan_props(&self, mesh: &ClassifiedMesh) -> Vec<Planned> {
        match &mesh.source {
            MeshSource::Single { .. } => {
                let plan = prop_box(&mesh.bounds, &self.config);
                vec![Planned {
                    name: format!("prop:{}:box", mesh.id.0),
                    pose: Iso::translation(plan.center.x, plan.center.y, plan.center.z),
                    desc: ColliderDesc::solid(
                        ColliderShape::Cuboid {
                            half_extents: plan.half_extents,
                        },
                        self.config.prop_friction,
                    ),
                }]
            }
            MeshSource::Instanced { .. } => {
                self.instance_boxes(mesh, &self.config, "prop", self.config.prop_friction)
            }
        }
    }

    /// One oriented box per instance, shrunk and clamped like a prop.
    fn instance_boxes(
        &self,
        mesh: &ClassifiedMesh,
        config: &SynthesisConfig,
        prefix: &str,
        friction: f32,
    ) -> Vec<Planned> {
        let MeshSource::Instanced {
            local_bounds,
            instances,
        } = &mesh.source
        else {
            return Vec::new();
        };

        let local_center = local_bounds.center();
        let local_size = local_bounds.maxs - local_bounds.mins;

        instances
            .iter()
            .map(|inst| {
                let t = &inst.transform;
                let size = local_size.component_mul(&t.scale.abs());
                let half = shapes::shrink_and_clamp(size, config);
                let center = t.to_matrix().transform_point(&local_center);
                Planned {
                    name: format!("{prefix}:{}:i{}", mesh.id.0, inst.index),
                    pose: Iso::from_parts(center.coords.into(), t.rotation),
                    desc: ColliderDesc::solid(ColliderShape::Cuboid { half_extents: half }, friction),
                }
            })
            .collect()
    }

    fn plan_gate(&self, mesh: &ClassifiedMesh) -> Vec<Planned> {
        let placements: Vec<(String, _)> = match &mesh.source {
            MeshSource::Single { .. } => vec![(format!("gate:{}", mesh.id.0), mesh.bounds)],
            MeshSource::Instanced { instances, .. } => instances
                .iter()
                .map(|i| (format!("gate:{}:i{}", mesh.id.0, i.index), i.bounds))
                .collect(),
        };

        placements
            .into_iter()
            .flat_map(|(base, bounds)| {
                let [a, b] = gate_posts(&bounds, &self.config);
                [("post-a", a), ("post-b", b)].map(|(suffix, plan)| Planned {
                    name: format!("{base}:{suffix}"),
                    pose: Iso::translation(plan.center.x, plan.center.y, plan.center.z),
                    desc: ColliderDesc::solid(
                        ColliderShape::Cuboid {
                            half_extents: plan.half_extents,
                        },
                        self.config.prop_friction,
                    ),
                })
            })
            .collect()
    }

    fn emit_reported<P: PhysicsPort>(
        &mut self,
        plan: Planned,
        mesh: Option<MeshId>,
        physics: &mut P,
        report: &mut SynthesisReport,
    ) -> Option<ColliderId> {
        let name = plan.name.clone();
        match self.emit(plan, mesh, physics) {
            Ok(Some(id)) => {
                report.built += 1;
                Some(id)
            }
            Ok(None) => {
                report.skipped_duplicates += 1;
                None
            }
            Err(error) => {
                warn!("collider '{name}' failed: {error}");
                report.failures.push(SynthFailure { name, error });
                None
            }
        }
    }

    /// Create one collider unless its name was already built.
    fn emit<P: PhysicsPort>(
        &mut self,
        plan: Planned,
        mesh: Option<MeshId>,
        physics: &mut P,
    ) -> SynthResult<Option<ColliderId>> {
        if self.names.contains(&plan.name) {
            return Ok(None);
        }

        let half_extents = plan.desc.shape.half_extents();
        let finite = plan.pose.translation.vector.iter().all(|v| v.is_finite())
            && half_extents.iter().all(|v| v.is_finite());
        if !finite {
            return Err(SynthError::NonFinite(plan.name));
        }

        let body = physics.create_static_body(plan.pose);
        let collider = physics.create_collider(body, &plan.desc)?;

        self.names.insert(plan.name.clone());
        self.records.push(ColliderRecord {
            name: plan.name,
            mesh,
            kind: plan.desc.shape.kind(),
            transform: plan.pose,
            half_extents,
            friction: plan.desc.friction,
            sensor: plan.desc.sensor,
            body,
            collider,
            tag: plan.desc.tag,
        });
        Ok(Some(collider))
    }
}

/// Valid triangles only: in-range, finite, non-zero area.
fn clean_triangles(vertices: &[Point3], triangles: &[[u32; 3]]) -> Vec<[u32; 3]> {
    triangles
        .iter()
        .filter(|t| {
            let [Some(a), Some(b), Some(c)] = (**t).map(|i| vertices.get(i as usize)) else {
                return false;
            };
            let finite = [a, b, c]
                .iter()
                .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
            finite && (b - a).cross(&(c - a)).norm_squared() > MIN_TRIANGLE_AREA2
        })
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::MeshClassifier,
        math::{Mat4, Transform},
        physics::FlatWorld,
        scene::{Material, MeshData, SceneGraph, SceneNode},
    };

    fn at(x: f32, y: f32, z: f32) -> Transform {
        Transform::from_translation(Vec3::new(x, y, z))
    }

    fn node(name: &str, size: [f32; 3], pos: Transform) -> SceneNode {
        SceneNode::mesh(name, MeshData::cuboid(size, Material::named("standard"))).with_transform(pos)
    }

    fn synth(roots: Vec<SceneNode>) -> (ColliderSynthesizer, Registries, SynthesisReport, FlatWorld) {
        let classification = MeshClassifier::default().classify(&SceneGraph::new(roots));
        let mut registries = classification.registries.clone();
        let mut physics = FlatWorld::default();
        let mut synth = ColliderSynthesizer::default();
        let report = synth.build(&classification.meshes, &mut registries, &mut physics);
        (synth, registries, report, physics)
    }

    #[test]
    fn bridge_gets_exactly_one_trimesh() {
        let (synth, _, report, _) = synth(vec![node("Bridge_02", [10.0, 0.4, 3.0], at(0.0, 1.0, 0.0))]);
        let records: Vec<_> = synth.records_for(MeshId(0)).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ShapeKind::TriMesh);
        assert_eq!(records[0].name, "walk:0:tri");
        assert_eq!(report.built, 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn large_flat_walkable_gets_core_box_inside_bounds() {
        let (synth, _, _, _) = synth(vec![node("Plaza", [20.0, 0.5, 20.0], at(0.0, -0.25, 0.0))]);
        let core = synth
            .records()
            .iter()
            .find(|r| r.name == "walk:0:core")
            .expect("core box");
        assert_eq!(core.kind, ShapeKind::Box);
        assert!(core.half_extents.x < 10.0);
        let top = core.transform.translation.vector.y + core.half_extents.y;
        assert!(top < 0.0);
    }

    #[test]
    fn slippery_walkable_uses_low_friction() {
        let (synth, _, _, _) = synth(vec![node("IceFloor", [6.0, 0.5, 4.0], at(0.0, 0.0, 0.0))]);
        let config = SynthesisConfig::default();
        assert_eq!(synth.records()[0].friction, config.slippery_friction);
    }

    #[test]
    fn prop_box_is_shrunk_and_named() {
        let (synth, _, _, _) = synth(vec![node("Rock", [4.0, 3.0, 4.0], at(0.0, 1.5, 0.0))]);
        let r = &synth.records()[0];
        assert_eq!(r.name, "prop:0:box");
        assert!((r.half_extents.x - 2.0 * 0.94).abs() < 1.0e-4);
    }

    #[test]
    fn instanced_props_get_one_box_per_instance() {
        let matrices: Vec<Mat4> = (0..4).map(|i| at(i as f32 * 5.0, 0.0, 0.0).to_matrix()).collect();
        let (synth, _, report, _) = synth(vec![SceneNode::instanced(
            "RockRow",
            MeshData::cuboid([3.0, 3.0, 3.0], Material::named("stone")),
            matrices,
        )]);
        assert_eq!(report.built, 4);
        let names: Vec<_> = synth.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["prop:0:i0", "prop:0:i1", "prop:0:i2", "prop:0:i3"]);
        assert!((synth.records()[3].transform.translation.vector.x - 15.0).abs() < 1.0e-4);
    }

    #[test]
    fn instanced_walkable_tiles_leave_the_gap_open() {
        let matrices = vec![
            at(0.0, -0.25, 0.0).to_matrix(),
            at(100.0, -0.25, 0.0).to_matrix(),
        ];
        let (synth, _, report, physics) = synth(vec![SceneNode::instanced(
            "Platform_Tile",
            MeshData::cuboid([20.0, 0.5, 20.0], Material::named("stone")),
            matrices,
        )]);
        assert!(report.failures.is_empty());
        let names: Vec<_> = synth.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["walk:0:i0", "walk:0:i1"]);
        assert_eq!(physics.collider_count(), 2);
        for r in synth.records() {
            let x = r.transform.translation.vector.x;
            assert!(x.abs() < 1.0e-3 || (x - 100.0).abs() < 1.0e-3, "collider at x = {x}");
            assert!(r.half_extents.x <= 10.0 + 1.0e-4);
        }
    }

    #[test]
    fn gate_frame_yields_two_posts_and_screen_yields_portal_sensor() {
        let screen = SceneNode::mesh(
            "Gate_Screen",
            MeshData::cuboid([3.0, 3.4, 0.05], Material::translucent("plasma", 0.5)),
        )
        .with_transform(at(0.0, 1.7, -10.0));
        let (synth, registries, _, _) =
            synth(vec![node("Gate_Frame", [4.0, 4.0, 0.6], at(0.0, 2.0, -10.0)), screen]);

        let posts: Vec<_> = synth.records_for(MeshId(0)).collect();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.kind == ShapeKind::Box && !p.sensor));
        assert_eq!(synth.records_for(MeshId(1)).filter(|r| !r.sensor).count(), 0);

        let (_, portal) = registries.portals.iter().next().expect("portal");
        assert!(portal.collider.is_some());
    }

    #[test]
    fn pickup_sensor_is_tagged_and_linked() {
        let (synth, registries, _, _) = synth(vec![node("Coin_07", [0.4, 0.4, 0.4], at(0.0, 2.0, 0.0))]);
        let sensor = synth.records().iter().find(|r| r.sensor).expect("sensor");
        assert_eq!(sensor.kind, ShapeKind::Ball);
        assert_eq!(sensor.tag, Some(SensorTag::pickup(0)));
        assert!((sensor.half_extents.x - 1.0).abs() < 1.0e-6);

        let (_, record) = registries.pickups.iter().next().expect("pickup");
        assert_eq!(record.collider, Some(sensor.collider));
    }

    #[test]
    fn rebuild_is_idempotent() {
        let classification = MeshClassifier::default().classify(&SceneGraph::new(vec![
            node("Bridge", [10.0, 0.4, 3.0], at(0.0, 0.0, 0.0)),
            node("Coin", [0.4, 0.4, 0.4], at(0.0, 2.0, 0.0)),
        ]));
        let mut registries = classification.registries.clone();
        let mut physics = FlatWorld::default();
        let mut synth = ColliderSynthesizer::default();

        let first = synth.build(&classification.meshes, &mut registries, &mut physics);
        let second = synth.build(&classification.meshes, &mut registries, &mut physics);
        assert_eq!(first.built, 2);
        assert_eq!(second.built, 0);
        assert_eq!(second.skipped_duplicates, 2);
        assert_eq!(physics.collider_count(), 2);
    }

    #[test]
    fn degenerate_walkable_fails_alone() {
        let mut classification = MeshClassifier::default().classify(&SceneGraph::new(vec![
            node("Bridge", [10.0, 0.4, 3.0], at(0.0, 0.0, 0.0)),
            node("Rock", [3.0, 3.0, 3.0], at(20.0, 1.5, 0.0)),
        ]));
        // Collapse the bridge into a line after classification.
        if let MeshSource::Single { vertices, .. } = &mut classification.meshes[0].source {
            for v in vertices.iter_mut() {
                v.y = 0.0;
                v.z = 0.0;
            }
        }

        let mut registries = classification.registries.clone();
        let mut physics = FlatWorld::default();
        let mut synth = ColliderSynthesizer::default();
        let report = synth.build(&classification.meshes, &mut registries, &mut physics);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, SynthError::Degenerate(_)));
        assert_eq!(report.built, 1);
        assert_eq!(synth.records()[0].name, "prop:1:box");
    }

    #[test]
    fn excluded_meshes_build_nothing() {
        let (synth, _, _, _) = synth(vec![node("Skybox", [500.0, 300.0, 500.0], at(0.0, 0.0, 0.0))]);
        assert!(synth.records().is_empty());
    }
}
