/*!
PlatformSelector: picks a hub and four cardinal destinations among walkable platforms.

Conventions
- North is -Z, east is +X. Quadrants are decided by the sign of (dx, dz) from the hub.
- Anchors sit `spawn_clearance` above a platform's top surface.
- Destinations are always four. A quadrant with no candidate in the distance band borrows the
  next unused candidate beyond `min_distance`; if none is left, a synthetic anchor is placed
  `min_distance` from the hub in that quadrant's diagonal direction.
*/

use log::info;
use rapier3d::parry::bounding_volume::Aabb;

use crate::{
    classify::{ClassifiedMesh, MeshId, MeshRole, MeshSource},
    config::PlatformConfig,
    constants::DESTINATION_COUNT,
    math::{Vec3, planar_distance_sq},
    metrics::MeshMetrics,
};

/// Broad flat walkable; only lives during selection.
#[derive(Clone, Debug, PartialEq)]
pub struct PlatformCandidate {
    pub mesh: MeshId,
    /// Set for one tile of an instanced walkable.
    pub instance: Option<u32>,
    pub center: Vec3,
    pub top: f32,
    pub area: f32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl Quadrant {
    pub const ALL: [Quadrant; DESTINATION_COUNT] = [
        Quadrant::NorthEast,
        Quadrant::NorthWest,
        Quadrant::SouthEast,
        Quadrant::SouthWest,
    ];

    pub fn of(from: &Vec3, to: &Vec3) -> Self {
        let east = to.x - from.x >= 0.0;
        let north = to.z - from.z < 0.0;
        match (north, east) {
            (true, true) => Quadrant::NorthEast,
            (true, false) => Quadrant::NorthWest,
            (false, true) => Quadrant::SouthEast,
            (false, false) => Quadrant::SouthWest,
        }
    }

    /// Unit planar diagonal pointing into the quadrant.
    pub fn direction(self) -> Vec3 {
        let (x, z) = match self {
            Quadrant::NorthEast => (1.0, -1.0),
            Quadrant::NorthWest => (-1.0, -1.0),
            Quadrant::SouthEast => (1.0, 1.0),
            Quadrant::SouthWest => (-1.0, 1.0),
        };
        Vec3::new(x, 0.0, z) * std::f32::consts::FRAC_1_SQRT_2
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    pub position: Vec3,
    pub mesh: Option<MeshId>,
    /// True when no platform backed this anchor.
    pub synthetic: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlatformLayout {
    pub hub: Anchor,
    /// In [`Quadrant::ALL`] order.
    pub destinations: [Anchor; DESTINATION_COUNT],
}

impl PlatformLayout {
    pub fn destination(&self, quadrant: Quadrant) -> &Anchor {
        let i = Quadrant::ALL
            .iter()
            .position(|q| *q == quadrant)
            .unwrap_or_default();
        &self.destinations[i]
    }
}

#[derive(Clone, Debug, Default)]
pub struct PlatformSelector {
    pub config: PlatformConfig,
}

impl PlatformSelector {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }

    /// Broad flat walkables, largest first (ties by mesh id, then instance).
    /// Each tile of an instanced walkable is judged on its own world bounds.
    pub fn candidates<'a>(
        &self,
        meshes: impl IntoIterator<Item = &'a ClassifiedMesh>,
    ) -> Vec<PlatformCandidate> {
        let mut out: Vec<PlatformCandidate> = meshes
            .into_iter()
            .filter(|m| m.role == MeshRole::Walkable)
            .flat_map(|m| -> Vec<(MeshId, Option<u32>, Aabb, MeshMetrics)> {
                match &m.source {
                    MeshSource::Single { .. } => vec![(m.id, None, m.bounds, m.metrics)],
                    MeshSource::Instanced { instances, .. } => instances
                        .iter()
                        .map(|inst| {
                            let metrics = MeshMetrics::from_aabb(&inst.bounds);
                            (m.id, Some(inst.index), inst.bounds, metrics)
                        })
                        .collect(),
                }
            })
            .filter(|(_, _, _, metrics)| {
                metrics.footprint_area >= self.config.min_area
                    && metrics.thickness <= self.config.max_thickness
            })
            .map(|(mesh, instance, bounds, metrics)| PlatformCandidate {
                mesh,
                instance,
                center: bounds.center().coords,
                top: bounds.maxs.y,
                area: metrics.footprint_area,
            })
            .collect();

        out.sort_by(|a, b| {
            b.area
                .total_cmp(&a.area)
                .then(a.mesh.cmp(&b.mesh))
                .then(a.instance.cmp(&b.instance))
        });
        out
    }

    pub fn select<'a>(&self, meshes: impl IntoIterator<Item = &'a ClassifiedMesh>) -> PlatformLayout {
        let candidates = self.candidates(meshes);
        let layout = self.select_from(&candidates);

        info!(
            "platforms: {} candidates, hub {:?} at {:?}",
            candidates.len(),
            layout.hub.mesh,
            layout.hub.position
        );
        for (q, d) in Quadrant::ALL.iter().zip(&layout.destinations) {
            info!(
                "destination {q:?}: {:?} at {:?}{}",
                d.mesh,
                d.position,
                if d.synthetic { " (synthetic)" } else { "" }
            );
        }
        layout
    }

    pub fn select_from(&self, candidates: &[PlatformCandidate]) -> PlatformLayout {
        let c = &self.config;
        let anchor_of = |p: &PlatformCandidate| Anchor {
            position: Vec3::new(p.center.x, p.top + c.spawn_clearance, p.center.z),
            mesh: Some(p.mesh),
            synthetic: false,
        };

        let hub_index = candidates
            .iter()
            .take(c.hub_top_n)
            .enumerate()
            .map(|(i, p)| {
                let dist = planar_distance_sq(&Vec3::zeros(), &p.center).sqrt();
                (i, p.area - c.hub_distance_weight * dist)
            })
            .fold(None, |best: Option<(usize, f32)>, (i, score)| match best {
                Some((_, s)) if s >= score => best,
                _ => Some((i, score)),
            })
            .map(|(i, _)| i);

        let hub = match hub_index {
            Some(i) => anchor_of(&candidates[i]),
            None => Anchor {
                position: Vec3::new(0.0, c.spawn_clearance, 0.0),
                mesh: None,
                synthetic: true,
            },
        };
        let hub_center = hub_index.map_or(Vec3::zeros(), |i| candidates[i].center);

        let mut used: Vec<bool> = vec![false; candidates.len()];
        if let Some(i) = hub_index {
            used[i] = true;
        }

        let dist_of = |p: &PlatformCandidate| planar_distance_sq(&hub_center, &p.center).sqrt();
        let mut picks: [Option<usize>; DESTINATION_COUNT] = [None; DESTINATION_COUNT];

        // Largest in-band candidate per quadrant; candidates are already sorted by area.
        for (slot, quadrant) in Quadrant::ALL.iter().enumerate() {
            let found = candidates.iter().enumerate().find(|(i, p)| {
                !used[*i]
                    && Quadrant::of(&hub_center, &p.center) == *quadrant
                    && (c.min_distance..=c.max_distance).contains(&dist_of(p))
            });
            if let Some((i, _)) = found {
                used[i] = true;
                picks[slot] = Some(i);
            }
        }

        // Empty quadrants borrow the next unused candidate beyond the minimum distance.
        for pick in picks.iter_mut().filter(|p| p.is_none()) {
            let found = candidates
                .iter()
                .enumerate()
                .find(|(i, p)| !used[*i] && dist_of(p) >= c.min_distance);
            if let Some((i, _)) = found {
                used[i] = true;
                *pick = Some(i);
            }
        }

        let destinations = std::array::from_fn(|slot| match picks[slot] {
            Some(i) => anchor_of(&candidates[i]),
            None => Anchor {
                position: hub.position + Quadrant::ALL[slot].direction() * c.min_distance,
                mesh: None,
                synthetic: true,
            },
        });

        PlatformLayout { hub, destinations }
    }
}
