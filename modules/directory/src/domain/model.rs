//! Domain models for the container tree.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A node in the organizational tree, polymorphic over hierarchy level.
///
/// Invariants (enforced by the service and verified by tests):
/// - `depth == parent.depth + 1` for non-root nodes, 0 at the root;
/// - `root_id == parent.root_id` for non-root nodes, `root_id == id` at
///   the root;
/// - `path` is the parent's path plus `/` plus this node's id;
/// - `(level, slug, parent)` is unique.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Container {
    pub id: Uuid,
    pub level: String,
    pub slug: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
    pub root_id: Uuid,
    /// Materialized ancestor id chain, slash-delimited, self-inclusive.
    pub path: String,
    pub depth: i32,
    pub active: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Container {
    /// Whether this container is a hierarchy root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Path prefix matching all descendants (excluding self).
    #[must_use]
    pub fn descendant_prefix(&self) -> String {
        format!("{}/", self.path)
    }
}

/// Request to create a container.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct NewContainer {
    pub level: String,
    pub slug: String,
    pub display_name: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// A user's role on a container.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub container_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}
