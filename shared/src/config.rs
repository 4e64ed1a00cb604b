/*!
Load-time tuning for classification, collider synthesis and platform selection.

All numbers were tuned against one art set; they are data, not constants. Every struct is
`#[serde(default)]` so a TOML file only needs to name what it overrides.
*/

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Shape thresholds for the classifier rule table (meters, m^2, m^3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub water_min_area: f32,
    pub water_max_thickness: f32,

    pub ladder_min_height: f32,
    pub ladder_max_height: f32,
    pub ladder_max_horizontal: f32,

    /// Exclusive lower bound for the shape-only walkable fallback.
    pub walkable_min_thickness: f32,
    pub walkable_max_thickness: f32,
    /// Exclusive lower bound for the shape-only walkable fallback.
    pub walkable_min_area: f32,
    pub walkable_min_aspect: f32,
    /// Footprint above which the aspect test is waived.
    pub walkable_broad_area: f32,

    pub pickup_min_dim: f32,
    pub pickup_max_dim: f32,
    pub pickup_max_volume: f32,
    pub pickup_max_area: f32,
    pub coin_max_area: f32,

    pub fallback_pickup_max_dim: f32,
    pub fallback_pickup_max_volume: f32,
    pub fallback_pickup_max_area: f32,

    /// Thin-panel screen test: smallest dimension at most this...
    pub screen_max_thickness: f32,
    /// ...and both other dimensions at least this many times larger.
    pub screen_panel_ratio: f32,

    pub prop_min_volume: f32,
    pub backdrop_min_size: f32,
    pub backdrop_min_volume: f32,

    /// Cap on per-instance expansion of instanced meshes.
    pub max_instances: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            water_min_area: 8.0,
            water_max_thickness: 0.18,
            ladder_min_height: 0.8,
            ladder_max_height: 18.0,
            ladder_max_horizontal: 10.0,
            walkable_min_thickness: 0.12,
            walkable_max_thickness: 1.6,
            walkable_min_area: 6.0,
            walkable_min_aspect: 1.25,
            walkable_broad_area: 18.0,
            pickup_min_dim: 0.05,
            pickup_max_dim: 6.0,
            pickup_max_volume: 260.0,
            pickup_max_area: 22.0,
            coin_max_area: 80.0,
            fallback_pickup_max_dim: 2.4,
            fallback_pickup_max_volume: 18.0,
            fallback_pickup_max_area: 8.0,
            screen_max_thickness: 0.22,
            screen_panel_ratio: 4.0,
            prop_min_volume: 0.02,
            backdrop_min_size: 60.0,
            backdrop_min_volume: 20_000.0,
            max_instances: crate::constants::MAX_INSTANCE_EXPANSION,
        }
    }
}

/// Sensor sizing for pickups, portals and NPC proximity zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Base pickup radius; small pickups never go below it.
    pub pickup_radius: f32,
    /// Radius grows with `max_dim * pickup_size_factor` for larger pickups.
    pub pickup_size_factor: f32,
    pub pickup_max_radius: f32,
    pub portal_radius: f32,
    pub portal_half_height: f32,
    pub npc_radius: f32,
    pub npc_half_height: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pickup_radius: 1.0,
            pickup_size_factor: 0.75,
            pickup_max_radius: 2.5,
            portal_radius: 1.6,
            portal_half_height: 1.5,
            npc_radius: 2.5,
            npc_half_height: 1.5,
        }
    }
}

impl SensorConfig {
    /// Pickup radius derived from the object's largest dimension.
    pub fn pickup_radius_for(&self, max_dim: f32) -> f32 {
        (max_dim * self.pickup_size_factor)
            .max(self.pickup_radius)
            .min(self.pickup_max_radius.max(self.pickup_radius))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    pub walkable_friction: f32,
    pub slippery_friction: f32,
    pub prop_friction: f32,

    /// Safety core box under large flat walkables.
    pub core_min_area: f32,
    pub core_max_thickness: f32,
    pub core_min_max_dim: f32,
    pub core_xz_shrink: f32,
    pub core_top_inset: f32,
    pub core_min_height: f32,

    /// Props with `max_dim` below this use `small_prop_shrink`.
    pub small_prop_max_dim: f32,
    pub small_prop_shrink: f32,
    pub large_prop_shrink: f32,
    /// Minimum full thickness along X/Z.
    pub min_plane_thickness: f32,
    /// Minimum full thickness along Y.
    pub min_vertical_thickness: f32,

    /// Gate opening never narrower than this.
    pub gate_min_gap: f32,
    pub gate_post_ratio: f32,
    pub gate_post_min: f32,
    pub gate_post_max: f32,
    pub gate_min_depth: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            walkable_friction: 1.0,
            slippery_friction: 0.2,
            prop_friction: 0.7,
            core_min_area: 65.0,
            core_max_thickness: 10.0,
            core_min_max_dim: 10.0,
            core_xz_shrink: 0.96,
            core_top_inset: 0.05,
            core_min_height: 0.2,
            small_prop_max_dim: 2.0,
            small_prop_shrink: 0.8,
            large_prop_shrink: 0.94,
            min_plane_thickness: 0.28,
            min_vertical_thickness: 0.10,
            gate_min_gap: 1.25,
            gate_post_ratio: 0.18,
            gate_post_min: 0.2,
            gate_post_max: 0.8,
            gate_min_depth: 0.28,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub min_area: f32,
    pub max_thickness: f32,
    /// Score = area - weight * planar distance from origin.
    pub hub_distance_weight: f32,
    /// Only the N largest candidates compete for hub.
    pub hub_top_n: usize,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Spawn/teleport height above a platform's top surface.
    pub spawn_clearance: f32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            min_area: 6.0,
            max_thickness: 8.0,
            hub_distance_weight: 0.35,
            hub_top_n: 40,
            min_distance: 12.0,
            max_distance: 120.0,
            spawn_clearance: 1.4,
        }
    }
}

/// Fails with [`ConfigError::Invalid`] naming `field` when `ok` is false.
pub fn ensure(ok: bool, field: &str, detail: &str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{field}: {detail}")))
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.ladder_min_height < self.ladder_max_height,
            "classifier.ladder_min_height",
            "must be below ladder_max_height",
        )?;
        ensure(
            self.pickup_min_dim < self.pickup_max_dim,
            "classifier.pickup_min_dim",
            "must be below pickup_max_dim",
        )?;
        ensure(
            self.screen_panel_ratio > 1.0,
            "classifier.screen_panel_ratio",
            "must be greater than 1",
        )
    }
}

impl SensorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.pickup_radius > 0.0 && self.portal_radius > 0.0 && self.npc_radius > 0.0,
            "sensors",
            "radii must be positive",
        )
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.gate_min_gap > 0.0, "synthesis.gate_min_gap", "must be positive")?;
        ensure(
            self.gate_post_min <= self.gate_post_max,
            "synthesis.gate_post_min",
            "must not exceed gate_post_max",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.small_prop_shrink)
                && (0.0..=1.0).contains(&self.large_prop_shrink)
                && (0.0..=1.0).contains(&self.core_xz_shrink),
            "synthesis",
            "shrink factors must be within [0, 1]",
        )
    }
}

impl PlatformConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.min_distance < self.max_distance,
            "platforms.min_distance",
            "must be below max_distance",
        )?;
        ensure(self.hub_top_n > 0, "platforms.hub_top_n", "must be at least 1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pickup_radius_clamps_to_base_and_ceiling() {
        let cfg = SensorConfig::default();
        assert_relative_eq!(cfg.pickup_radius_for(0.4), 1.0);
        assert_relative_eq!(cfg.pickup_radius_for(2.0), 1.5);
        assert_relative_eq!(cfg.pickup_radius_for(40.0), 2.5);
    }

    #[test]
    fn defaults_validate() {
        assert!(ClassifierConfig::default().validate().is_ok());
        assert!(SensorConfig::default().validate().is_ok());
        assert!(SynthesisConfig::default().validate().is_ok());
        assert!(PlatformConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_gate_gap_is_invalid() {
        let cfg = SynthesisConfig {
            gate_min_gap: 0.0,
            ..SynthesisConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PlatformConfig = toml::from_str("spawn_clearance = 2.0").expect("valid toml");
        assert_relative_eq!(cfg.spawn_clearance, 2.0);
        assert_eq!(cfg.hub_top_n, 40);
    }
}
