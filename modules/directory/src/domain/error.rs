//! Domain errors for the directory module.

use orggate_rebac::EngineError;
use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors for container and membership operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Hierarchy level not declared in configuration.
    #[error("unknown hierarchy level: {level}")]
    UnknownLevel { level: String },

    /// Parent/child levels do not line up with the configured chain.
    #[error("level mismatch: {message}")]
    LevelMismatch { message: String },

    /// Slug already taken within `(level, parent)`.
    #[error("slug '{slug}' already exists at level '{level}'")]
    SlugConflict { level: String, slug: String },

    /// Referenced parent container does not exist.
    #[error("parent container not found: {id}")]
    ParentNotFound { id: Uuid },

    /// Container does not exist.
    #[error("container not found: {id}")]
    ContainerNotFound { id: Uuid },

    /// Caller lacks the capability the mutation requires.
    #[error("not permitted on container {container_id}")]
    NotPermitted { container_id: Uuid },

    /// Role is not valid at the container's level.
    #[error("role '{role}' is not valid at level '{level}'")]
    InvalidRole { role: String, level: String },

    /// User already holds a membership on this container.
    #[error("user {user_id} is already a member of container {container_id}")]
    AlreadyMember { user_id: Uuid, container_id: Uuid },

    /// No membership row for (user, container).
    #[error("user {user_id} has no membership on container {container_id}")]
    MembershipNotFound { user_id: Uuid, container_id: Uuid },

    /// Relationship engine failure during graph synchronization.
    #[error("relation engine error: {0}")]
    Engine(#[from] EngineError),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Internal error (task join, invariant breach).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    /// Create a level-mismatch error.
    #[must_use]
    pub fn level_mismatch(message: impl Into<String>) -> Self {
        Self::LevelMismatch {
            message: message.into(),
        }
    }
}
