//! wayfarer-headless: load the demo level into Rapier, play a short scripted route and log what
//! happens.
//!
//! Usage:
//!   wayfarer-headless [config.toml]
//!
//! Logging follows `RUST_LOG` (default `info`).

use log::info;
use wayfarer_shared::RapierWorld;
use wayfarer_sim::{GameConfig, LoadError, MoveIntent, Session, demo::demo_scene};

/// Presentation frame length; deliberately not a multiple of the fixed tick.
const FRAME_DT: f32 = 1.0 / 50.0;

/// Session call made before a phase starts.
#[derive(Copy, Clone)]
enum Action {
    ActivateFocus,
    TeleportToHub,
}

struct Phase {
    name: &'static str,
    seconds: f32,
    intent: MoveIntent,
    /// Press jump on the first frame.
    jump: bool,
    action: Option<Action>,
}

impl Phase {
    fn new(name: &'static str, seconds: f32, intent: MoveIntent) -> Self {
        Self {
            name,
            seconds,
            intent,
            jump: false,
            action: None,
        }
    }

    fn jump(mut self) -> Self {
        self.jump = true;
        self
    }

    fn then(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }
}

fn route() -> Vec<Phase> {
    let idle = MoveIntent::default();
    let north = MoveIntent {
        forward: 1.0,
        ..MoveIntent::default()
    };
    vec![
        Phase::new("settle", 1.0, idle),
        Phase::new("walk to gate", 1.9, north),
        Phase::new("through portal", 0.5, idle).then(Action::ActivateFocus),
        Phase::new("jump", 0.1, idle).jump(),
        Phase::new("double jump", 1.5, idle).jump(),
        Phase::new("back to hub", 0.5, idle).then(Action::TeleportToHub),
    ]
}

fn main() -> Result<(), LoadError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path)?,
        None => GameConfig::default(),
    };
    let physics = RapierWorld::new(config.kcc.clone());
    let mut session =
        Session::load_with_progress(&demo_scene(), config, physics, |stage, fraction| {
            info!("load: {stage:?} ({:.0}%)", fraction * 100.0);
        })?;

    for phase in route() {
        info!("phase '{}'", phase.name);
        match phase.action {
            Some(Action::ActivateFocus) => {
                if !session.activate_focus() {
                    info!("nothing to activate");
                }
            }
            Some(Action::TeleportToHub) => session.teleport_to_hub(),
            None => {}
        }

        let frames = (phase.seconds / FRAME_DT).ceil() as usize;
        for frame in 0..frames {
            let intent = MoveIntent {
                jump_pressed: phase.jump && frame == 0,
                ..phase.intent
            };
            session.advance(FRAME_DT, &intent);
            for event in session.drain_events() {
                info!("event: {event:?}");
            }
        }
        info!(
            "  at {:?}, grounded {}, score {}",
            session.position(),
            session.is_grounded(),
            session.score()
        );
    }

    session.respawn_all();
    for event in session.drain_events() {
        info!("event: {event:?}");
    }
    info!(
        "done after {} ticks; {} of {} pickups available",
        session.ticks(),
        session.registries().available_pickups(),
        session.registries().pickups.len()
    );
    Ok(())
}
