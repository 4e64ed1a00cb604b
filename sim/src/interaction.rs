//! Proximity scan against the pickup, portal and NPC registries.
//!
//! Pickups are collected when the character's capsule core comes within the pickup's radius.
//! Portals and NPCs compete for a single focus: nearest (planar) wins, ties go to the earlier
//! entry with portals before NPCs. Focus is reported only when it changes.

use log::debug;
use wayfarer_shared::{
    CapsuleShape, Registries, Vec3, math::planar_distance_sq, registry::Collected,
};

use crate::{config::InteractionConfig, events::FocusTarget};

/// Result of one [`InteractionDetector::scan`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanOutcome {
    pub collected: Vec<Collected>,
    /// `Some(new_focus)` when focus changed this scan.
    pub focus_changed: Option<Option<FocusTarget>>,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionDetector {
    config: InteractionConfig,
    focus: Option<FocusTarget>,
}

/// Squared distance from `p` to the vertical segment through `center` spanning `±half_height`.
fn segment_distance_sq(p: &Vec3, center: &Vec3, half_height: f32) -> f32 {
    let y = p.y.clamp(center.y - half_height, center.y + half_height);
    (p - Vec3::new(center.x, y, center.z)).norm_squared()
}

impl InteractionDetector {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            focus: None,
        }
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.focus
    }

    pub fn scan(
        &mut self,
        center: Vec3,
        capsule: CapsuleShape,
        registries: &mut Registries,
    ) -> ScanOutcome {
        let scale = self.config.pickup_radius_scale;
        let in_reach: Vec<_> = registries
            .pickups
            .iter()
            .filter(|(_, p)| !p.collected)
            .filter(|(_, p)| {
                let r = p.radius * scale;
                segment_distance_sq(&p.anchor, &center, capsule.half_height) <= r * r
            })
            .map(|(h, _)| h)
            .collect();

        let collected: Vec<Collected> = in_reach
            .into_iter()
            .filter_map(|h| registries.collect_pickup(h))
            .collect();
        for c in &collected {
            debug!("collected pickup {:?}", c.handle);
        }

        let focus = self.nearest_focus(&center, capsule, registries);
        let focus_changed = (focus != self.focus).then(|| {
            self.focus = focus;
            debug!("focus -> {focus:?}");
            focus
        });

        ScanOutcome {
            collected,
            focus_changed,
        }
    }

    fn nearest_focus(
        &self,
        center: &Vec3,
        capsule: CapsuleShape,
        registries: &Registries,
    ) -> Option<FocusTarget> {
        let scale = self.config.focus_radius_scale;
        let lo = center.y - capsule.half_total_height();
        let hi = center.y + capsule.half_total_height();
        // Cylinder standing on `base`, reaching `2 * half_height` up.
        let reach = |base: &Vec3, radius: f32, half_height: f32| {
            let d = planar_distance_sq(center, base);
            let r = radius * scale;
            (d <= r * r && hi >= base.y && lo <= base.y + 2.0 * half_height).then_some(d)
        };

        let portals = registries.portals.iter().filter_map(|(h, p)| {
            reach(&p.anchor, p.radius, p.half_height).map(|d| (FocusTarget::Portal(h), d))
        });
        let npcs = registries.npcs.iter().filter_map(|(h, n)| {
            reach(&n.anchor, n.radius, n.half_height).map(|d| (FocusTarget::Npc(h), d))
        });

        portals
            .chain(npcs)
            .fold(None, |best: Option<(FocusTarget, f32)>, (t, d)| match best {
                Some((_, bd)) if bd <= d => best,
                _ => Some((t, d)),
            })
            .map(|(t, _)| t)
    }
}
