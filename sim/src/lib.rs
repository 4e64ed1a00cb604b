//! Per-tick half of the pipeline: character controller, interaction detection and the session
//! that owns the loaded world and drives both at a fixed rate.

pub mod clock;
pub mod config;
pub mod controller;
pub mod demo;
pub mod events;
pub mod interaction;
pub mod session;

pub use clock::FixedStepClock;
pub use config::{ControllerConfig, GameConfig, InteractionConfig, TickConfig};
pub use controller::{
    CharacterController, CharacterState, JumpKind, LadderAction, MotionMode, MoveIntent,
    TickReport,
};
pub use events::{FocusTarget, GameEvent};
pub use interaction::{InteractionDetector, ScanOutcome};
pub use session::{LoadError, LoadStage, Session};
