//! Jump chain: ground jump (with coyote grace) followed by weaker air jumps, up to
//! `max_jumps` per ground contact.

use super::state::CharacterState;
use crate::config::ControllerConfig;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JumpKind {
    /// First jump of a chain, from the ground or inside the coyote window.
    Ground,
    /// Any later jump of the chain, at the reduced multiplier.
    Air,
}

/// Refresh the coyote window while grounded, drain it while airborne.
///
/// When the window runs out without a jump (walked off a ledge) the first jump of the chain is
/// spent, so only air jumps remain.
pub fn update_coyote(state: &mut CharacterState, config: &ControllerConfig, dt: f32) {
    if state.grounded {
        state.coyote_remaining = config.coyote_time;
        return;
    }
    if state.coyote_remaining > 0.0 {
        state.coyote_remaining = (state.coyote_remaining - dt).max(0.0);
        if state.coyote_remaining == 0.0 && state.jumps_used == 0 {
            state.jumps_used = 1;
        }
    }
}

/// Apply a jump for a rising edge of the jump input, if the chain allows one.
pub fn try_jump(state: &mut CharacterState, config: &ControllerConfig) -> Option<JumpKind> {
    let kind = if state.jumps_used == 0 && (state.grounded || state.coyote_remaining > 0.0) {
        JumpKind::Ground
    } else if state.jumps_used >= 1 && state.jumps_used < config.max_jumps && !state.grounded {
        JumpKind::Air
    } else {
        return None;
    };

    state.vertical_velocity = match kind {
        JumpKind::Ground => config.jump_velocity,
        JumpKind::Air => config.jump_velocity * config.double_jump_multiplier,
    };
    state.jumps_used += 1;
    state.grounded = false;
    state.coyote_remaining = 0.0;
    state.ground_ignore = config.ground_ignore_time;
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use wayfarer_shared::Vec3;

    fn grounded() -> CharacterState {
        let mut s = CharacterState::new(Vec3::zeros());
        s.grounded = true;
        s
    }

    #[test]
    fn ground_then_air_then_rejected() {
        let cfg = ControllerConfig::default();
        let mut s = grounded();

        assert_eq!(try_jump(&mut s, &cfg), Some(JumpKind::Ground));
        assert_relative_eq!(s.vertical_velocity, 9.0);
        assert_relative_eq!(s.ground_ignore, cfg.ground_ignore_time);

        assert_eq!(try_jump(&mut s, &cfg), Some(JumpKind::Air));
        assert_relative_eq!(s.vertical_velocity, 9.0 * 0.85);

        assert_eq!(try_jump(&mut s, &cfg), None);
        assert_eq!(s.jumps_used, 2);
    }

    #[test]
    fn coyote_window_allows_a_full_jump() {
        let cfg = ControllerConfig::default();
        let mut s = grounded();
        update_coyote(&mut s, &cfg, 1.0 / 60.0);
        s.grounded = false;
        update_coyote(&mut s, &cfg, 0.05);

        assert_eq!(try_jump(&mut s, &cfg), Some(JumpKind::Ground));
        assert_relative_eq!(s.vertical_velocity, cfg.jump_velocity);
    }

    #[test]
    fn expired_coyote_spends_the_first_jump() {
        let cfg = ControllerConfig::default();
        let mut s = grounded();
        update_coyote(&mut s, &cfg, 1.0 / 60.0);
        s.grounded = false;
        update_coyote(&mut s, &cfg, 0.2);
        assert_eq!(s.jumps_used, 1);

        assert_eq!(try_jump(&mut s, &cfg), Some(JumpKind::Air));
        assert_eq!(try_jump(&mut s, &cfg), None);
    }

    #[test]
    fn airborne_without_a_chain_cannot_jump() {
        let cfg = ControllerConfig::default();
        let mut s = CharacterState::new(Vec3::zeros());
        assert_eq!(try_jump(&mut s, &cfg), None);
        assert_relative_eq!(s.vertical_velocity, 0.0);
    }

    #[test]
    fn single_jump_configuration_has_no_air_jump() {
        let cfg = ControllerConfig {
            max_jumps: 1,
            ..ControllerConfig::default()
        };
        let mut s = grounded();
        assert_eq!(try_jump(&mut s, &cfg), Some(JumpKind::Ground));
        assert_eq!(try_jump(&mut s, &cfg), None);
    }
}
