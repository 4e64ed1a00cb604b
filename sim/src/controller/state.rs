use wayfarer_shared::Vec3;

/// Mutually exclusive motion modes, derived from [`CharacterState`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MotionMode {
    Grounded,
    Airborne,
    Climbing,
}

/// Everything the controller carries between ticks. Only the controller mutates it.
#[derive(Clone, Debug, PartialEq)]
pub struct CharacterState {
    /// Capsule center.
    pub position: Vec3,
    /// Achieved displacement of the last tick divided by its dt.
    pub velocity: Vec3,
    pub vertical_velocity: f32,
    /// Horizontal carry from top-outs and dismounts; decays while airborne.
    pub launch: Vec3,
    pub grounded: bool,
    pub jumps_used: u8,
    pub climbing: bool,
    pub ladder_cooldown: f32,
    pub coyote_remaining: f32,
    pub ground_ignore: f32,
}

impl CharacterState {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            vertical_velocity: 0.0,
            launch: Vec3::zeros(),
            grounded: false,
            jumps_used: 0,
            climbing: false,
            ladder_cooldown: 0.0,
            coyote_remaining: 0.0,
            ground_ignore: 0.0,
        }
    }

    pub fn mode(&self) -> MotionMode {
        if self.climbing {
            MotionMode::Climbing
        } else if self.grounded {
            MotionMode::Grounded
        } else {
            MotionMode::Airborne
        }
    }

    /// Place the character at `position` with all motion and chain state cleared.
    pub fn reset_at(&mut self, position: Vec3) {
        *self = Self::new(position);
    }
}
