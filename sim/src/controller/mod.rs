//! Kinematic capsule controller.
//!
//! Per tick: ladder engagement, jump chain and gravity produce a desired displacement, which is
//! resolved against the static world by [`PhysicsPort::sweep_capsule`]. The position advances by
//! the achieved movement only.

pub mod jump;
pub mod ladder;
pub mod state;

use log::debug;
use wayfarer_shared::{
    CapsuleShape, LadderVolume, PhysicsPort, SweepRequest, Vec3, utils::planar_direction,
};

pub use jump::JumpKind;
pub use ladder::LadderAction;
pub use state::{CharacterState, MotionMode};

use crate::config::ControllerConfig;

/// One tick of player input. Axes are in [-1, 1]; `jump_pressed` is a rising edge.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MoveIntent {
    pub forward: f32,
    pub strafe: f32,
    pub run: bool,
    pub jump_pressed: bool,
    pub camera_yaw: f32,
}

/// What happened during one [`CharacterController::tick`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub jump: Option<JumpKind>,
    pub ladder: Option<LadderAction>,
    /// Grounded went from false to true this tick.
    pub landed: bool,
    pub ceiling_hit: bool,
}

#[derive(Clone, Debug)]
pub struct CharacterController {
    config: ControllerConfig,
    state: CharacterState,
}

impl CharacterController {
    pub fn new(config: ControllerConfig, spawn: Vec3) -> Self {
        Self {
            config,
            state: CharacterState::new(spawn),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.state.grounded
    }

    pub fn mode(&self) -> MotionMode {
        self.state.mode()
    }

    pub fn capsule(&self) -> CapsuleShape {
        self.config.capsule()
    }

    /// Lowest point of the capsule.
    pub fn feet_position(&self) -> Vec3 {
        self.state.position - Vec3::y() * self.capsule().half_total_height()
    }

    /// Move to `to` with velocity, jump chain and ladder state cleared.
    pub fn teleport(&mut self, to: Vec3) {
        self.state.reset_at(to);
    }

    /// Advance one fixed step. `ladder` is the nearest ladder in reach, if any.
    pub fn tick<P: PhysicsPort>(
        &mut self,
        physics: &mut P,
        intent: &MoveIntent,
        ladder: Option<&LadderVolume>,
        dt: f32,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !(dt > 0.0 && dt.is_finite()) {
            return report;
        }
        let cfg = &self.config;
        let s = &mut self.state;

        s.ladder_cooldown = (s.ladder_cooldown - dt).max(0.0);
        s.ground_ignore = (s.ground_ignore - dt).max(0.0);

        report.ladder = ladder::update_ladder(s, ladder, intent, cfg);
        let jump_consumed = report.ladder == Some(LadderAction::Dismounted);

        if !s.climbing {
            jump::update_coyote(s, cfg, dt);
            if intent.jump_pressed && !jump_consumed {
                report.jump = jump::try_jump(s, cfg);
                if let Some(kind) = report.jump {
                    debug!("jump {kind:?} ({} of {})", s.jumps_used, cfg.max_jumps);
                }
            }
            if !s.grounded {
                s.vertical_velocity =
                    (s.vertical_velocity - cfg.gravity * dt).max(-cfg.terminal_fall_speed);
            }
        }

        let desired = if s.climbing {
            let pull = ladder
                .map(|l| ladder::centering_offset(&s.position, l, cfg, dt))
                .unwrap_or_else(Vec3::zeros);
            pull + Vec3::y() * (s.vertical_velocity * dt)
        } else {
            let speed = if intent.run {
                cfg.run_speed
            } else {
                cfg.walk_speed
            };
            let planar = planar_direction(intent.forward, intent.strafe, intent.camera_yaw) * speed;
            let mut d = (planar + s.launch) * dt;
            d.y = s.vertical_velocity * dt;
            if s.grounded && s.vertical_velocity <= 0.0 {
                d.y -= cfg.ground_snap_bias * dt;
            }
            d
        };

        let snap = s.grounded && !s.climbing && s.ground_ignore <= 0.0 && s.vertical_velocity <= 0.0;
        let result = physics.sweep_capsule(&SweepRequest {
            position: s.position,
            desired,
            capsule: cfg.capsule(),
            dt,
            snap_to_ground: snap,
        });
        s.position += result.translation;
        s.velocity = result.translation / dt;

        if desired.y > 0.0
            && s.vertical_velocity > 0.0
            && result.translation.y < desired.y * (1.0 - cfg.ceiling_block_ratio)
        {
            s.vertical_velocity = 0.0;
            report.ceiling_hit = true;
        }

        let grounded = result.grounded && s.ground_ignore <= 0.0;
        if grounded && !s.grounded {
            report.landed = true;
            s.jumps_used = 0;
            s.launch = Vec3::zeros();
            if !s.climbing {
                s.vertical_velocity = 0.0;
            }
            debug!("landed at {:?}", s.position);
        }
        if grounded && !s.climbing && s.vertical_velocity < 0.0 {
            s.vertical_velocity = 0.0;
        }
        s.grounded = grounded;

        if !s.grounded && !s.climbing {
            s.launch *= (1.0 - cfg.launch_decay * dt).max(0.0);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use wayfarer_shared::{
        FlatWorld, Iso, MeshId, Point3,
        physics::{ColliderDesc, ColliderShape},
        rapier3d::parry::bounding_volume::Aabb,
    };

    const DT: f32 = 1.0 / 60.0;

    /// Standing height of the capsule center above a floor at y = 0.
    const STAND: f32 = 0.9;

    fn ground() -> FlatWorld {
        FlatWorld::default().with_ground_plane(0.0)
    }

    fn settled(world: &mut FlatWorld) -> CharacterController {
        let mut c = CharacterController::new(ControllerConfig::default(), Vec3::new(0.0, 1.2, 0.0));
        for _ in 0..30 {
            c.tick(world, &MoveIntent::default(), None, DT);
        }
        assert!(c.is_grounded());
        c
    }

    fn jump() -> MoveIntent {
        MoveIntent {
            jump_pressed: true,
            ..MoveIntent::default()
        }
    }

    fn add_box(world: &mut FlatWorld, center: Vec3, half: Vec3) {
        let body = world.create_static_body(Iso::translation(center.x, center.y, center.z));
        world
            .create_collider(
                body,
                &ColliderDesc::solid(ColliderShape::Cuboid { half_extents: half }, 0.7),
            )
            .expect("box");
    }

    #[test]
    fn falls_and_lands_once() {
        let mut world = ground();
        let mut c = CharacterController::new(ControllerConfig::default(), Vec3::new(0.0, 3.0, 0.0));
        let mut landings = 0;
        for _ in 0..90 {
            if c.tick(&mut world, &MoveIntent::default(), None, DT).landed {
                landings += 1;
            }
        }
        assert_eq!(landings, 1);
        assert_eq!(c.mode(), MotionMode::Grounded);
        assert_abs_diff_eq!(c.position().y, STAND, epsilon = 1e-4);
        assert_relative_eq!(c.state().vertical_velocity, 0.0);
    }

    #[test]
    fn walks_forward_at_walk_speed() {
        let mut world = ground();
        let mut c = settled(&mut world);
        let start = c.position();
        let intent = MoveIntent {
            forward: 1.0,
            ..MoveIntent::default()
        };
        for _ in 0..60 {
            c.tick(&mut world, &intent, None, DT);
        }
        // Yaw 0 faces -Z.
        assert_abs_diff_eq!(c.position().z - start.z, -6.0, epsilon = 1e-3);
        assert_abs_diff_eq!(c.velocity().z, -6.0, epsilon = 1e-3);
        assert!(c.is_grounded());
    }

    #[test]
    fn run_is_faster_than_walk() {
        let mut world = ground();
        let mut c = settled(&mut world);
        let start = c.position();
        let intent = MoveIntent {
            strafe: 1.0,
            run: true,
            ..MoveIntent::default()
        };
        for _ in 0..30 {
            c.tick(&mut world, &intent, None, DT);
        }
        assert_abs_diff_eq!(c.position().x - start.x, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn double_jump_fires_once_with_multiplier() {
        let mut world = ground();
        let mut c = settled(&mut world);
        let cfg = c.config().clone();

        let first = c.tick(&mut world, &jump(), None, DT);
        assert_eq!(first.jump, Some(JumpKind::Ground));
        assert!(!c.is_grounded());

        c.tick(&mut world, &MoveIntent::default(), None, DT);
        c.tick(&mut world, &MoveIntent::default(), None, DT);

        let second = c.tick(&mut world, &jump(), None, DT);
        assert_eq!(second.jump, Some(JumpKind::Air));
        assert_abs_diff_eq!(
            c.state().vertical_velocity,
            cfg.jump_velocity * cfg.double_jump_multiplier - cfg.gravity * DT,
            epsilon = 1e-4
        );

        let third = c.tick(&mut world, &jump(), None, DT);
        assert_eq!(third.jump, None);
    }

    #[test]
    fn chain_resets_only_after_landing() {
        let mut world = ground();
        let mut c = settled(&mut world);

        let mut jumps = 0;
        let mut landed = false;
        for i in 0..200 {
            let intent = if i % 5 == 0 { jump() } else { MoveIntent::default() };
            let report = c.tick(&mut world, &intent, None, DT);
            if report.landed {
                landed = true;
                break;
            }
            if report.jump.is_some() {
                jumps += 1;
            }
        }
        assert!(landed);
        assert_eq!(jumps, 2);
        assert_eq!(c.state().jumps_used, 0);
    }

    #[test]
    fn ground_ignore_keeps_jump_from_being_snapped() {
        let mut world = ground();
        let mut c = settled(&mut world);
        c.tick(&mut world, &jump(), None, DT);
        assert!(c.position().y > STAND);
        assert!(!c.is_grounded());
    }

    #[test]
    fn ceiling_zeroes_upward_velocity() {
        let mut world = ground();
        add_box(&mut world, Vec3::new(0.0, 2.5, 0.0), Vec3::new(2.0, 0.25, 2.0));
        let mut c = settled(&mut world);

        let mut bumped = false;
        c.tick(&mut world, &jump(), None, DT);
        for _ in 0..20 {
            bumped |= c.tick(&mut world, &MoveIntent::default(), None, DT).ceiling_hit;
        }
        assert!(bumped);
        assert!(c.position().y + 0.9 <= 2.25 + 1e-3);
    }

    #[test]
    fn walking_off_a_ledge_leaves_only_the_air_jump() {
        let mut world = FlatWorld::default();
        add_box(&mut world, Vec3::new(0.0, -0.5, 0.0), Vec3::new(1.0, 0.5, 1.0));
        let mut c = settled(&mut world);

        let intent = MoveIntent {
            strafe: 1.0,
            ..MoveIntent::default()
        };
        while c.is_grounded() {
            c.tick(&mut world, &intent, None, DT);
        }
        for _ in 0..12 {
            c.tick(&mut world, &MoveIntent::default(), None, DT);
        }
        assert_eq!(c.state().jumps_used, 1);
        assert_eq!(
            c.tick(&mut world, &jump(), None, DT).jump,
            Some(JumpKind::Air)
        );
        assert_eq!(c.tick(&mut world, &jump(), None, DT).jump, None);
    }

    #[test]
    fn ladder_climb_respects_speed_bound() {
        let mut world = ground();
        let bounds = Aabb::new(Point3::new(-0.4, 0.0, -0.15), Point3::new(0.4, 6.0, 0.15));
        let ladder = LadderVolume::from_bounds("Ladder", MeshId(0), bounds);
        let mut c = CharacterController::new(
            ControllerConfig::default(),
            Vec3::new(0.0, STAND, -0.6),
        );
        let up = MoveIntent {
            forward: 1.0,
            ..MoveIntent::default()
        };

        let mut topped = false;
        for _ in 0..200 {
            let report = c.tick(&mut world, &up, Some(&ladder), DT);
            if c.state().climbing {
                assert!(c.state().vertical_velocity.abs() <= c.config().ladder_max_speed);
            }
            if report.ladder == Some(LadderAction::ToppedOut) {
                topped = true;
                break;
            }
        }
        assert!(topped);
        assert!(c.feet_position().y >= 6.0 - c.config().top_out_margin);
        assert!(c.state().launch.z > 0.0);
    }

    #[test]
    fn mid_air_ladder_grab_does_not_refill_the_chain() {
        let mut world = ground();
        let bounds = Aabb::new(Point3::new(-0.4, 0.0, -0.15), Point3::new(0.4, 6.0, 0.15));
        let ladder = LadderVolume::from_bounds("Ladder", MeshId(0), bounds);
        let mut c = CharacterController::new(
            ControllerConfig::default(),
            Vec3::new(0.0, STAND, -0.6),
        );
        for _ in 0..30 {
            c.tick(&mut world, &MoveIntent::default(), Some(&ladder), DT);
        }
        assert!(c.is_grounded());

        let grab = MoveIntent {
            forward: 1.0,
            ..MoveIntent::default()
        };
        let mut jumps = 0;
        let mut count = |report: TickReport| {
            if report.jump.is_some() || report.ladder == Some(LadderAction::Dismounted) {
                jumps += 1;
            }
            report
        };

        assert_eq!(
            count(c.tick(&mut world, &jump(), Some(&ladder), DT)).jump,
            Some(JumpKind::Ground)
        );
        for _ in 0..3 {
            count(c.tick(&mut world, &MoveIntent::default(), Some(&ladder), DT));
        }
        assert_eq!(
            count(c.tick(&mut world, &jump(), Some(&ladder), DT)).jump,
            Some(JumpKind::Air)
        );
        assert_eq!(
            count(c.tick(&mut world, &grab, Some(&ladder), DT)).ladder,
            Some(LadderAction::Entered)
        );
        assert!(!c.is_grounded());

        let mut landed = false;
        for i in 0..240 {
            let intent = if i % 4 == 0 { jump() } else { MoveIntent::default() };
            if count(c.tick(&mut world, &intent, Some(&ladder), DT)).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(jumps, 2);
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut world = ground();
        let mut c = settled(&mut world);
        let before = c.state().clone();
        c.tick(&mut world, &jump(), None, 0.0);
        c.tick(&mut world, &jump(), None, f32::NAN);
        assert_eq!(c.state(), &before);
    }
}
