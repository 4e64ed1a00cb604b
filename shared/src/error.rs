use thiserror::Error;

use crate::physics::{BodyId, ColliderId};

#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("failed to create collider shape: {0}")]
    ShapeCreation(String),

    #[error("unknown body: {0:?}")]
    UnknownBody(BodyId),

    #[error("unknown collider: {0:?}")]
    UnknownCollider(ColliderId),
}

/// Per-mesh synthesis failure. Never aborts a build; collected into the synthesis report.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("non-finite geometry: {0}")]
    NonFinite(String),

    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type PhysicsResult<T> = std::result::Result<T, PhysicsError>;
pub type SynthResult<T> = std::result::Result<T, SynthError>;
