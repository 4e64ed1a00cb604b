//! Ladder engagement and climbing motion.
//!
//! While climbing, horizontal input is ignored; vertical speed follows the forward axis (or a
//! slow slide with no input) and stays within `±ladder_max_speed`.

use log::debug;
use wayfarer_shared::{LadderVolume, Vec3};

use super::{MoveIntent, state::CharacterState};
use crate::config::ControllerConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LadderAction {
    Entered,
    /// Released by stepping off the bottom or leaving the ladder's reach.
    Exited,
    /// Climbed past the top and launched onto the platform above.
    ToppedOut,
    /// Jumped off, pushed away from the ladder.
    Dismounted,
}

fn feet_y(state: &CharacterState, config: &ControllerConfig) -> f32 {
    state.position.y - config.capsule().half_total_height()
}

fn release(state: &mut CharacterState, config: &ControllerConfig) {
    state.climbing = false;
    state.ladder_cooldown = config.ladder_exit_cooldown;
}

/// Leave the ladder airborne with `vertical` speed and horizontal `launch`.
///
/// At least the first jump of the chain counts as spent; jumps spent before an airborne grab
/// stay spent, since only landing resets the chain.
fn launch(state: &mut CharacterState, config: &ControllerConfig, vertical: f32, launch: Vec3) {
    release(state, config);
    state.vertical_velocity = vertical;
    state.launch = launch;
    state.jumps_used = state.jumps_used.max(1);
    state.grounded = false;
    state.coyote_remaining = 0.0;
    state.ground_ignore = config.ground_ignore_time;
}

/// Engage, release or drive climbing for one tick.
pub fn update_ladder(
    state: &mut CharacterState,
    ladder: Option<&LadderVolume>,
    intent: &MoveIntent,
    config: &ControllerConfig,
) -> Option<LadderAction> {
    let threshold = config.ladder_grab_threshold;
    let feet = feet_y(state, config);

    if !state.climbing {
        let ladder = ladder?;
        let below_top = feet < ladder.max_y - config.top_out_margin;
        if state.ladder_cooldown > 0.0 || intent.forward <= threshold || !below_top {
            return None;
        }
        state.climbing = true;
        state.vertical_velocity = 0.0;
        state.launch = Vec3::zeros();
        debug!("ladder: entered {}", ladder.name);
        return Some(LadderAction::Entered);
    }

    let Some(ladder) = ladder else {
        release(state, config);
        debug!("ladder: out of reach");
        return Some(LadderAction::Exited);
    };

    let outward = ladder.outward_from(&state.position);

    if intent.jump_pressed {
        if state.jumps_used >= config.max_jumps {
            release(state, config);
            debug!("ladder: let go of {} with no jumps left", ladder.name);
            return Some(LadderAction::Exited);
        }
        state.jumps_used += 1;
        let push = outward * config.jump_velocity * config.dismount_push;
        launch(state, config, config.jump_velocity, push);
        debug!("ladder: dismounted {}", ladder.name);
        return Some(LadderAction::Dismounted);
    }

    if intent.forward > threshold && feet >= ladder.max_y - config.top_out_margin {
        let push = -outward * config.top_out_push_speed;
        launch(state, config, config.top_out_velocity, push);
        debug!("ladder: topped out {}", ladder.name);
        return Some(LadderAction::ToppedOut);
    }

    if state.grounded && intent.forward < -threshold {
        release(state, config);
        debug!("ladder: stepped off {}", ladder.name);
        return Some(LadderAction::Exited);
    }

    let target = if intent.forward.abs() > threshold {
        intent.forward.clamp(-1.0, 1.0) * config.climb_speed
    } else {
        -config.ladder_slide_speed
    };
    state.vertical_velocity = target.clamp(-config.ladder_max_speed, config.ladder_max_speed);
    None
}

/// Planar displacement for this tick pulling `position` towards the ladder's center line.
pub fn centering_offset(
    position: &Vec3,
    ladder: &LadderVolume,
    config: &ControllerConfig,
    dt: f32,
) -> Vec3 {
    let to_center = Vec3::new(ladder.center_x - position.x, 0.0, ladder.center_z - position.z);
    to_center * (config.ladder_center_pull * dt).min(1.0)
}
