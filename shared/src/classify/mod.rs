/*!
MeshClassifier: one pass over the scene graph that assigns every mesh a gameplay role and fills
the pickup, ladder, portal and NPC registries on the way.

Notes
- Malformed meshes (no positions, no area, hidden) are skipped without side effects.
- Instanced meshes are classified once from their first usable instance, then expanded per
  instance (bounded by `ClassifierConfig::max_instances`) so each instance gets its own record
  and, later, its own collider.
- The role decision itself lives in [`rules`]; this module only gathers inputs and records.
*/

pub mod rules;

use log::{debug, info};
use rapier3d::parry::bounding_volume::Aabb;

use crate::{
    config::{ClassifierConfig, SensorConfig},
    flags::{NodeFlag, NodeFlags},
    math::{Mat4, Point3, Transform, Vec3},
    metrics::{MeshMetrics, surface_area, transform_aabb, world_aabb},
    registry::{LadderVolume, NpcRecord, PickupRecord, PortalRecord, Registries},
    scene::{MeshData, NodeContent, SceneGraph, SceneLeaf},
    vocabulary::{Lexicon, Vocabulary, tokenize, tokenize_mesh},
};
use rules::{Marker, RuleInput};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExclusionReason {
    Degenerate,
    GateScreen,
    Backdrop,
    Negligible,
    NoCollide,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshRole {
    Walkable,
    Prop,
    Water,
    Pickup,
    GateFrame,
    Excluded(ExclusionReason),
}

/// One placement of an instanced mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceTransform {
    pub index: u32,
    /// Instance matrix as authored (relative to the owning node).
    pub matrix: Mat4,
    /// Decomposed world transform.
    pub transform: Transform,
    pub bounds: Aabb,
}

#[derive(Clone, Debug, PartialEq)]
pub enum MeshSource {
    /// World-space geometry of a plain mesh.
    Single {
        vertices: Vec<Point3>,
        triangles: Vec<[u32; 3]>,
    },
    Instanced {
        local_bounds: Aabb,
        instances: Vec<InstanceTransform>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedMesh {
    pub id: MeshId,
    pub name: String,
    pub material: String,
    pub role: MeshRole,
    /// World bounds (union over instances for instanced meshes).
    pub bounds: Aabb,
    /// Metrics of `bounds`, or of the representative instance for instanced meshes.
    pub metrics: MeshMetrics,
    pub source: MeshSource,
    pub slippery: bool,
}

impl ClassifiedMesh {
    pub fn is_instanced(&self) -> bool {
        matches!(self.source, MeshSource::Instanced { .. })
    }
}

/// Output of one classification pass.
#[derive(Clone, Debug, Default)]
pub struct Classification {
    pub meshes: Vec<ClassifiedMesh>,
    pub registries: Registries,
    /// Meshes skipped as malformed or hidden.
    pub skipped: usize,
}

impl Classification {
    pub fn with_role(&self, role: MeshRole) -> impl Iterator<Item = &ClassifiedMesh> {
        self.meshes.iter().filter(move |m| m.role == role)
    }

    pub fn walkables(&self) -> impl Iterator<Item = &ClassifiedMesh> {
        self.with_role(MeshRole::Walkable)
    }

    pub fn props(&self) -> impl Iterator<Item = &ClassifiedMesh> {
        self.with_role(MeshRole::Prop)
    }

    pub fn waters(&self) -> impl Iterator<Item = &ClassifiedMesh> {
        self.with_role(MeshRole::Water)
    }

    pub fn count(&self, role: MeshRole) -> usize {
        self.with_role(role).count()
    }

    pub fn get(&self, id: MeshId) -> Option<&ClassifiedMesh> {
        self.meshes.get(id.0 as usize)
    }
}

/// One world placement of a leaf's geometry.
struct Occurrence {
    index: Option<u32>,
    base_matrix: Mat4,
    world: Mat4,
    bounds: Aabb,
}

#[derive(Clone, Debug, Default)]
pub struct MeshClassifier {
    pub config: ClassifierConfig,
    pub sensors: SensorConfig,
    pub vocabulary: Vocabulary,
}

impl MeshClassifier {
    pub fn new(config: ClassifierConfig, sensors: SensorConfig, vocabulary: Vocabulary) -> Self {
        Self {
            config,
            sensors,
            vocabulary,
        }
    }

    pub fn classify(&self, scene: &SceneGraph) -> Classification {
        let mut out = Classification::default();

        for leaf in scene.leaves() {
            if !self.classify_leaf(&leaf, &mut out) {
                out.skipped += 1;
            }
        }

        info!(
            "classified {} meshes (walkable {}, prop {}, water {}, pickup {}, gate {}, excluded {}), skipped {}",
            out.meshes.len(),
            out.count(MeshRole::Walkable),
            out.count(MeshRole::Prop),
            out.count(MeshRole::Water),
            out.count(MeshRole::Pickup),
            out.count(MeshRole::GateFrame),
            out.meshes
                .iter()
                .filter(|m| matches!(m.role, MeshRole::Excluded(_)))
                .count(),
            out.skipped,
        );
        info!(
            "registries: {} pickups, {} ladders, {} portals, {} npcs",
            out.registries.pickups.len(),
            out.registries.ladders.len(),
            out.registries.portals.len(),
            out.registries.npcs.len(),
        );

        out
    }

    /// Returns `false` when the leaf was skipped.
    fn classify_leaf(&self, leaf: &SceneLeaf<'_>, out: &mut Classification) -> bool {
        if leaf.flags.has(NodeFlag::Hidden) {
            debug!("skip '{}': hidden", leaf.name);
            return false;
        }

        let (mesh, instances) = match leaf.content {
            NodeContent::Mesh(mesh) => (mesh, None),
            NodeContent::Instanced { mesh, instances } => (mesh, Some(instances.as_slice())),
            NodeContent::Group => return false,
        };

        let Some(positions) = mesh.positions.as_deref() else {
            debug!("skip '{}': no position buffer", leaf.name);
            return false;
        };
        let triangles = mesh.triangles();
        if surface_area(positions, &triangles) <= crate::constants::DIST_EPS {
            debug!("skip '{}': zero area", leaf.name);
            return false;
        }

        let occurrences = match instances {
            None => match world_aabb(positions, &leaf.world) {
                Some(bounds) => vec![Occurrence {
                    index: None,
                    base_matrix: leaf.world,
                    world: leaf.world,
                    bounds,
                }],
                None => Vec::new(),
            },
            Some(instances) => self.expand_instances(leaf, positions, instances),
        };

        let Some(first) = occurrences.first() else {
            debug!("skip '{}': no usable placement", leaf.name);
            return false;
        };

        let metrics = MeshMetrics::from_aabb(&first.bounds);
        if metrics.is_degenerate() {
            debug!("skip '{}': degenerate bounds", leaf.name);
            return false;
        }

        let tokens = tokenize_mesh(leaf.name, &mesh.material.name);
        let name_tokens = tokenize(leaf.name);
        let verdict = rules::evaluate(&RuleInput {
            tokens: &tokens,
            name_tokens: &name_tokens,
            metrics: &metrics,
            material: &mesh.material,
            flags: leaf.flags,
            vocabulary: &self.vocabulary,
            config: &self.config,
        });

        let role = apply_no_collide(verdict.role, leaf.flags);
        let id = MeshId(out.meshes.len() as u32);
        debug!("'{}' -> {:?} via {}", leaf.name, role, verdict.rule);

        self.register(leaf.name, id, role, &verdict.markers, &occurrences, &mut out.registries);

        let bounds = occurrences
            .iter()
            .skip(1)
            .fold(first.bounds, |acc, o| union(&acc, &o.bounds));

        let source = match instances {
            None => MeshSource::Single {
                vertices: positions
                    .iter()
                    .map(|p| leaf.world.transform_point(&Point3::from(*p)))
                    .collect(),
                triangles,
            },
            Some(_) => MeshSource::Instanced {
                local_bounds: local_bounds(mesh),
                instances: occurrences
                    .iter()
                    .filter_map(|o| {
                        Some(InstanceTransform {
                            index: o.index?,
                            matrix: o.base_matrix,
                            transform: Transform::decompose(&o.world)?,
                            bounds: o.bounds,
                        })
                    })
                    .collect(),
            },
        };

        out.meshes.push(ClassifiedMesh {
            id,
            name: leaf.name.to_string(),
            material: mesh.material.name.clone(),
            role,
            bounds,
            metrics,
            source,
            slippery: self.vocabulary.matches(Lexicon::Slippery, &tokens),
        });
        true
    }

    /// Per-instance world placements, capped. Instances that do not decompose are dropped.
    fn expand_instances(
        &self,
        leaf: &SceneLeaf<'_>,
        positions: &[[f32; 3]],
        instances: &[Mat4],
    ) -> Vec<Occurrence> {
        let Some(local) = world_aabb(positions, &Mat4::identity()) else {
            return Vec::new();
        };

        if instances.len() > self.config.max_instances {
            debug!(
                "'{}': {} instances, expanding first {}",
                leaf.name,
                instances.len(),
                self.config.max_instances
            );
        }

        instances
            .iter()
            .take(self.config.max_instances)
            .enumerate()
            .filter_map(|(i, matrix)| {
                let world = leaf.world * matrix;
                Transform::decompose(&world)?;
                Some(Occurrence {
                    index: Some(i as u32),
                    base_matrix: *matrix,
                    world,
                    bounds: transform_aabb(&local, &world),
                })
            })
            .collect()
    }

    fn register(
        &self,
        name: &str,
        id: MeshId,
        role: MeshRole,
        markers: &[Marker],
        occurrences: &[Occurrence],
        registries: &mut Registries,
    ) {
        for o in occurrences {
            let center = o.bounds.center().coords;
            let base = Vec3::new(center.x, o.bounds.mins.y, center.z);

            for marker in markers {
                match marker {
                    Marker::Ladder => {
                        registries
                            .ladders
                            .push(LadderVolume::from_bounds(name, id, o.bounds));
                    }
                    Marker::Npc => {
                        registries.npcs.push(NpcRecord {
                            name: name.to_string(),
                            mesh: id,
                            anchor: base,
                            radius: self.sensors.npc_radius,
                            half_height: self.sensors.npc_half_height,
                            collider: None,
                        });
                    }
                }
            }

            match role {
                MeshRole::Pickup => {
                    let max_dim = MeshMetrics::from_aabb(&o.bounds).max_dim;
                    registries.pickups.push(PickupRecord {
                        name: name.to_string(),
                        mesh: id,
                        anchor: center,
                        radius: self.sensors.pickup_radius_for(max_dim),
                        instance: o.index,
                        base_matrix: o.base_matrix,
                        display_matrix: o.base_matrix,
                        collected: false,
                        collider: None,
                    });
                }
                MeshRole::Excluded(ExclusionReason::GateScreen) => {
                    registries.portals.push(PortalRecord {
                        name: name.to_string(),
                        mesh: id,
                        anchor: base,
                        radius: self.sensors.portal_radius,
                        half_height: self.sensors.portal_half_height,
                        destination: None,
                        collider: None,
                    });
                }
                _ => {}
            }
        }
    }
}

fn apply_no_collide(role: MeshRole, flags: NodeFlags) -> MeshRole {
    match role {
        MeshRole::Walkable | MeshRole::Prop | MeshRole::GateFrame
            if flags.has(NodeFlag::NoCollide) =>
        {
            MeshRole::Excluded(ExclusionReason::NoCollide)
        }
        other => other,
    }
}

fn local_bounds(mesh: &MeshData) -> Aabb {
    mesh.positions
        .as_deref()
        .and_then(|p| world_aabb(p, &Mat4::identity()))
        .unwrap_or_else(|| Aabb::new(Point3::origin(), Point3::origin()))
}

fn union(a: &Aabb, b: &Aabb) -> Aabb {
    Aabb::new(a.mins.inf(&b.mins), a.maxs.sup(&b.maxs))
}
