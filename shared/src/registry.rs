/*!
Owned arenas for gameplay records discovered during classification.

Records are addressed by typed [`Handle`]s (stable indices). Collaborators get read-only views;
the few mutations (collecting, respawning, linking colliders) go through [`Registries`].
*/

use std::{fmt, hash, marker::PhantomData};

use rapier3d::parry::bounding_volume::Aabb;

use crate::{
    classify::MeshId,
    math::{Mat4, Vec3},
    physics::ColliderId,
};

/// Typed index into a [`Registry<T>`].
pub struct Handle<T> {
    index: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub const fn new(index: u32) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub const fn index(self) -> u32 {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Handle<T> {}

impl<T> hash::Hash for Handle<T> {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index)
    }
}

/// Append-only arena.
#[derive(Clone, Debug)]
pub struct Registry<T> {
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Registry<T> {
    pub fn push(&mut self, item: T) -> Handle<T> {
        self.items.push(item);
        Handle::new(self.items.len() as u32 - 1)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.items.get(handle.index as usize)
    }

    pub(crate) fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.items.get_mut(handle.index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (Handle::new(i as u32), item))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A collectible. Instanced pickups remember which instance they came from.
#[derive(Clone, Debug, PartialEq)]
pub struct PickupRecord {
    pub name: String,
    pub mesh: MeshId,
    pub anchor: Vec3,
    pub radius: f32,
    pub instance: Option<u32>,
    /// Matrix as authored (world matrix, or instance matrix for instanced pickups).
    pub base_matrix: Mat4,
    /// Matrix the presentation layer should draw; zero-scaled once collected.
    pub display_matrix: Mat4,
    pub collected: bool,
    pub collider: Option<ColliderId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LadderVolume {
    pub name: String,
    pub mesh: MeshId,
    pub bounds: Aabb,
    /// Planar center line (x, z).
    pub center_x: f32,
    pub center_z: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl LadderVolume {
    pub fn from_bounds(name: impl Into<String>, mesh: MeshId, bounds: Aabb) -> Self {
        let center = bounds.center();
        Self {
            name: name.into(),
            mesh,
            bounds,
            center_x: center.x,
            center_z: center.z,
            min_y: bounds.mins.y,
            max_y: bounds.maxs.y,
        }
    }

    /// Is `p` within `tolerance` of the volume (planar box grown by tolerance, vertical span
    /// grown by tolerance)?
    pub fn is_near(&self, p: &Vec3, tolerance: f32) -> bool {
        p.x >= self.bounds.mins.x - tolerance
            && p.x <= self.bounds.maxs.x + tolerance
            && p.z >= self.bounds.mins.z - tolerance
            && p.z <= self.bounds.maxs.z + tolerance
            && p.y >= self.min_y - tolerance
            && p.y <= self.max_y + tolerance
    }

    /// Planar squared distance from `p` to the center line.
    pub fn axis_distance_sq(&self, p: &Vec3) -> f32 {
        let dx = p.x - self.center_x;
        let dz = p.z - self.center_z;
        dx * dx + dz * dz
    }

    /// Horizontal unit vector from the center line towards `p`, or +Z when on the line.
    pub fn outward_from(&self, p: &Vec3) -> Vec3 {
        let v = Vec3::new(p.x - self.center_x, 0.0, p.z - self.center_z);
        v.try_normalize(1.0e-6).unwrap_or_else(Vec3::z)
    }
}

/// Gate whose screen sub-surface is kept walkable-through.
#[derive(Clone, Debug, PartialEq)]
pub struct PortalRecord {
    pub name: String,
    pub mesh: MeshId,
    /// Base center of the screen surface.
    pub anchor: Vec3,
    pub radius: f32,
    pub half_height: f32,
    /// Destination anchor index, linked after platform selection.
    pub destination: Option<usize>,
    pub collider: Option<ColliderId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NpcRecord {
    pub name: String,
    pub mesh: MeshId,
    pub anchor: Vec3,
    pub radius: f32,
    pub half_height: f32,
    pub collider: Option<ColliderId>,
}

/// Result of a successful [`Registries::collect_pickup`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collected {
    pub handle: Handle<PickupRecord>,
    pub collider: Option<ColliderId>,
}

#[derive(Clone, Debug, Default)]
pub struct Registries {
    pub pickups: Registry<PickupRecord>,
    pub ladders: Registry<LadderVolume>,
    pub portals: Registry<PortalRecord>,
    pub npcs: Registry<NpcRecord>,
}

impl Registries {
    /// Mark a pickup collected. Unknown handles and already-collected pickups are no-ops.
    pub fn collect_pickup(&mut self, handle: Handle<PickupRecord>) -> Option<Collected> {
        let record = self.pickups.get_mut(handle)?;
        if record.collected {
            return None;
        }
        record.collected = true;
        record.display_matrix = record.base_matrix * Mat4::new_scaling(0.0);
        Some(Collected {
            handle,
            collider: record.collider,
        })
    }

    /// Restore every collected pickup. Returns the sensors that must be re-enabled.
    pub fn respawn_all(&mut self) -> Vec<ColliderId> {
        let mut restored = Vec::new();
        for record in self.pickups.iter_mut() {
            if record.collected {
                record.collected = false;
                restored.extend(record.collider);
            }
            record.display_matrix = record.base_matrix;
        }
        restored
    }

    pub fn available_pickups(&self) -> usize {
        self.pickups.iter().filter(|(_, p)| !p.collected).count()
    }

    /// Nearest ladder (by center line) within `tolerance` of `p`.
    pub fn nearest_ladder(&self, p: &Vec3, tolerance: f32) -> Option<&LadderVolume> {
        self.ladders
            .iter()
            .filter(|(_, l)| l.is_near(p, tolerance))
            .min_by(|(_, a), (_, b)| a.axis_distance_sq(p).total_cmp(&b.axis_distance_sq(p)))
            .map(|(_, l)| l)
    }

    pub(crate) fn set_pickup_collider(&mut self, handle: Handle<PickupRecord>, id: ColliderId) {
        if let Some(record) = self.pickups.get_mut(handle) {
            record.collider = Some(id);
        }
    }

    pub(crate) fn set_portal_collider(&mut self, handle: Handle<PortalRecord>, id: ColliderId) {
        if let Some(record) = self.portals.get_mut(handle) {
            record.collider = Some(id);
        }
    }

    pub(crate) fn set_npc_collider(&mut self, handle: Handle<NpcRecord>, id: ColliderId) {
        if let Some(record) = self.npcs.get_mut(handle) {
            record.collider = Some(id);
        }
    }

    /// Link portals, in registry order, to destinations `i % destination_count`.
    pub fn link_portals(&mut self, destination_count: usize) {
        for (i, portal) in self.portals.iter_mut().enumerate() {
            portal.destination = (destination_count > 0).then(|| i % destination_count);
        }
    }
}
