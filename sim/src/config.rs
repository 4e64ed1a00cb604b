//! Per-tick tuning plus the aggregate [`GameConfig`] loaded from TOML.
//!
//! Every table is optional in the file; missing tables and fields fall back to defaults.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use wayfarer_shared::{
    CapsuleShape, ClassifierConfig, ConfigError, KccSettings, PlatformConfig, SensorConfig,
    SynthesisConfig, Vocabulary,
    config::ensure,
    constants::{FIXED_TICK_HZ, MAX_FRAME_DT_S, MAX_STEPS_PER_FRAME},
};

/// Character movement tuning (meters, seconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    /// Applied to `jump_velocity` for every jump after the first in a chain. Must be < 1.
    pub double_jump_multiplier: f32,
    pub max_jumps: u8,
    pub coyote_time: f32,
    /// Post-jump window during which ground contact is ignored.
    pub ground_ignore_time: f32,
    /// Downward bias (m/s) applied while grounded to stay on slopes.
    pub ground_snap_bias: f32,
    pub terminal_fall_speed: f32,
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    /// Below this height the character is returned to the hub.
    pub world_floor_y: f32,

    pub ladder_tolerance: f32,
    /// Forward-axis magnitude below which ladder input counts as idle.
    pub ladder_grab_threshold: f32,
    pub climb_speed: f32,
    /// Symmetric clamp on vertical speed while climbing.
    pub ladder_max_speed: f32,
    pub ladder_slide_speed: f32,
    /// Fraction of the offset to the ladder center line removed per second.
    pub ladder_center_pull: f32,
    pub ladder_exit_cooldown: f32,
    /// Feet within this distance of the ladder top may top out.
    pub top_out_margin: f32,
    pub top_out_velocity: f32,
    pub top_out_push_speed: f32,
    /// Outward dismount speed as a fraction of `jump_velocity`.
    pub dismount_push: f32,
    /// Launch carry decay rate (1/s) while airborne.
    pub launch_decay: f32,
    /// A rise blocked by more than this fraction zeroes upward velocity.
    pub ceiling_block_ratio: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            walk_speed: 6.0,
            run_speed: 10.0,
            gravity: 24.0,
            jump_velocity: 9.0,
            double_jump_multiplier: 0.85,
            max_jumps: 2,
            coyote_time: 0.12,
            ground_ignore_time: 0.12,
            ground_snap_bias: 1.75,
            terminal_fall_speed: 40.0,
            capsule_radius: 0.35,
            capsule_half_height: 0.55,
            world_floor_y: -50.0,
            ladder_tolerance: 0.6,
            ladder_grab_threshold: 0.1,
            climb_speed: 4.0,
            ladder_max_speed: 6.5,
            ladder_slide_speed: 1.0,
            ladder_center_pull: 4.0,
            ladder_exit_cooldown: 0.3,
            top_out_margin: 0.4,
            top_out_velocity: 5.0,
            top_out_push_speed: 4.0,
            dismount_push: 0.4,
            launch_decay: 2.0,
            ceiling_block_ratio: 0.5,
        }
    }
}

impl ControllerConfig {
    pub fn capsule(&self) -> CapsuleShape {
        CapsuleShape {
            radius: self.capsule_radius,
            half_height: self.capsule_half_height,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.double_jump_multiplier > 0.0 && self.double_jump_multiplier < 1.0,
            "controller.double_jump_multiplier",
            "must be within (0, 1)",
        )?;
        ensure(self.max_jumps >= 1, "controller.max_jumps", "must be at least 1")?;
        ensure(
            (0.0..=0.5).contains(&self.coyote_time) && (0.0..=0.5).contains(&self.ground_ignore_time),
            "controller",
            "coyote_time and ground_ignore_time must be within [0, 0.5]",
        )?;
        ensure(
            self.walk_speed > 0.0 && self.run_speed >= self.walk_speed,
            "controller.run_speed",
            "speeds must be positive and run_speed >= walk_speed",
        )?;
        ensure(
            self.gravity > 0.0 && self.jump_velocity > 0.0,
            "controller",
            "gravity and jump_velocity must be positive",
        )?;
        ensure(
            self.ladder_max_speed > 0.0
                && self.climb_speed <= self.ladder_max_speed
                && self.top_out_velocity <= self.ladder_max_speed,
            "controller.ladder_max_speed",
            "must be positive and bound climb_speed and top_out_velocity",
        )?;
        ensure(
            self.capsule_radius > 0.0 && self.capsule_half_height >= 0.0,
            "controller.capsule_radius",
            "capsule must have a positive radius",
        )
    }
}

/// Proximity scan tuning. Scales apply on top of each record's own radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub pickup_radius_scale: f32,
    pub focus_radius_scale: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pickup_radius_scale: 1.0,
            focus_radius_scale: 1.0,
        }
    }
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(
            self.pickup_radius_scale > 0.0 && self.focus_radius_scale > 0.0,
            "interaction",
            "radius scales must be positive",
        )
    }
}

/// Fixed-step accumulator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub tick_hz: u32,
    pub max_frame_dt: f32,
    pub max_steps_per_frame: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_hz: FIXED_TICK_HZ,
            max_frame_dt: MAX_FRAME_DT_S,
            max_steps_per_frame: MAX_STEPS_PER_FRAME,
        }
    }
}

impl TickConfig {
    pub fn step(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure(self.tick_hz > 0, "tick.tick_hz", "must be positive")?;
        ensure(self.max_frame_dt > 0.0, "tick.max_frame_dt", "must be positive")?;
        ensure(
            self.max_steps_per_frame > 0,
            "tick.max_steps_per_frame",
            "must be at least 1",
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub classifier: ClassifierConfig,
    pub sensors: SensorConfig,
    pub vocabulary: Vocabulary,
    pub synthesis: SynthesisConfig,
    pub platforms: PlatformConfig,
    pub kcc: KccSettings,
    pub controller: ControllerConfig,
    pub interaction: InteractionConfig,
    pub tick: TickConfig,
}

impl GameConfig {
    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.validate()?;
        self.sensors.validate()?;
        self.synthesis.validate()?;
        self.platforms.validate()?;
        self.kcc.validate()?;
        self.controller.validate()?;
        self.interaction.validate()?;
        self.tick.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_validate() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let config = GameConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn partial_tables_override_only_named_fields() {
        let config = GameConfig::from_toml_str(
            r#"
            [controller]
            walk_speed = 5.0

            [tick]
            tick_hz = 120
            "#,
        )
        .expect("valid config");
        assert_relative_eq!(config.controller.walk_speed, 5.0);
        assert_relative_eq!(config.controller.run_speed, 10.0);
        assert_relative_eq!(config.tick.step(), 1.0 / 120.0);
    }

    #[test]
    fn full_strength_double_jump_is_rejected() {
        let err = GameConfig::from_toml_str("[controller]\ndouble_jump_multiplier = 1.0")
            .expect_err("multiplier must be < 1");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let err = GameConfig::from_toml_str("[tick]\ntick_hz = 0").expect_err("tick_hz > 0");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_syntax_is_a_parse_error() {
        let err = GameConfig::from_toml_str("[controller").expect_err("broken toml");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = GameConfig::load("/definitely/not/here.toml").expect_err("no file");
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
