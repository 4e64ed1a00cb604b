use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use serde::{Deserialize, Serialize};

use crate::{config::ensure, error::ConfigError};

/// Kinematic character controller (KCC) sweep-and-slide settings.
///
/// Notes
/// - Values are expressed in meters and degrees (converted to radians at runtime).
/// - Autostep is always enabled; snap-to-ground is requested per sweep by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KccSettings {
    /// Small gap preserved between the character and its surroundings (meters).
    /// Keep `offset` small but non-zero for numerical stability.
    pub offset: f32,

    /// Maximum climbable slope angle (degrees).
    pub max_slope_climb_deg: f32,

    /// Minimum slope angle (degrees) before automatic sliding starts.
    pub min_slope_slide_deg: f32,

    pub autostep_max_height: f32,
    pub autostep_min_width: f32,

    /// Whether the controller should slide against obstacles.
    pub slide: bool,

    /// Increase if the character gets stuck when sliding (small, meters).
    pub normal_nudge_factor: f32,

    /// Max downward snap distance while grounded (meters).
    pub snap_distance: f32,
}

impl Default for KccSettings {
    fn default() -> Self {
        Self {
            offset: 0.05,
            max_slope_climb_deg: 52.0,
            min_slope_slide_deg: 45.0,
            autostep_max_height: 0.325,
            autostep_min_width: 0.2,
            slide: true,
            normal_nudge_factor: 0.05,
            snap_distance: 0.3,
        }
    }
}

impl KccSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.offset > 0.0, "kcc.offset", "must be positive")?;
        ensure(
            self.min_slope_slide_deg <= self.max_slope_climb_deg,
            "kcc.min_slope_slide_deg",
            "must not exceed max_slope_climb_deg",
        )
    }

    /// Rapier controller for one sweep.
    pub fn controller(&self, snap_to_ground: bool) -> KinematicCharacterController {
        KinematicCharacterController {
            offset: CharacterLength::Absolute(self.offset),
            max_slope_climb_angle: self.max_slope_climb_deg.to_radians(),
            min_slope_slide_angle: self.min_slope_slide_deg.to_radians(),
            snap_to_ground: snap_to_ground.then_some(CharacterLength::Absolute(self.snap_distance)),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.autostep_max_height),
                min_width: CharacterLength::Absolute(self.autostep_min_width),
                include_dynamic_bodies: false,
            }),
            slide: self.slide,
            normal_nudge_factor: self.normal_nudge_factor,
            ..KinematicCharacterController::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_toggles_snap() {
        let settings = KccSettings::default();
        assert!(settings.controller(true).snap_to_ground.is_some());
        assert!(settings.controller(false).snap_to_ground.is_none());
    }

    #[test]
    fn rejects_inverted_slope_angles() {
        let settings = KccSettings {
            min_slope_slide_deg: 60.0,
            ..KccSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
