//! Load-time half of the scene-to-physics pipeline: scene model, mesh classification,
//! collider synthesis, platform selection and the physics port the character runs against.

// Re-export Rapier so downstream crates can name its types without depending on it directly.
pub use rapier3d;

pub mod classify;
pub mod config;
pub mod constants;
pub mod error;
pub mod flags;
pub mod math;
pub mod metrics;
pub mod physics;
pub mod platforms;
pub mod registry;
pub mod scene;
pub mod sensor_tag;
pub mod synth;
pub mod utils;
pub mod vocabulary;

pub use classify::{
    Classification, ClassifiedMesh, ExclusionReason, MeshClassifier, MeshId, MeshRole, MeshSource,
};
pub use config::{ClassifierConfig, PlatformConfig, SensorConfig, SynthesisConfig};
pub use error::{ConfigError, PhysicsError, SynthError};
pub use flags::{NodeFlag, NodeFlags};
pub use math::{Iso, Mat4, Point3, Quat, Transform, Vec3};
pub use physics::{
    BodyId, CapsuleShape, ColliderId, FlatWorld, KccSettings, PhysicsPort, RapierWorld,
    SweepRequest, SweepResult,
};
pub use platforms::{Anchor, PlatformLayout, PlatformSelector, Quadrant};
pub use registry::{
    Handle, LadderVolume, NpcRecord, PickupRecord, PortalRecord, Registries, Registry,
};
pub use scene::{Material, MeshData, NodeContent, SceneGraph, SceneNode};
pub use sensor_tag::{SensorKind, SensorTag};
pub use synth::{ColliderRecord, ColliderSynthesizer, SynthesisReport};
pub use vocabulary::{Lexicon, Vocabulary};
