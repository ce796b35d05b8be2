//! Crate-wide error type

use thiserror::Error;

use crate::sim::{BodyHandle, EntityId};

/// Errors raised by level loading, tuning and contact resolution
#[derive(Debug, Error)]
pub enum SimError {
    #[error("physics body {0:?} has no owning entity")]
    UnknownBody(BodyHandle),

    #[error("entity {0:?} is no longer live")]
    StaleEntity(EntityId),

    #[error("contact pairs entity {0:?} with itself")]
    SelfContact(EntityId),

    #[error("level has no raft placement")]
    MissingPlayer,

    #[error("level has more than one raft placement")]
    DuplicatePlayer,

    #[error("invalid level: {0}")]
    InvalidLevel(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
