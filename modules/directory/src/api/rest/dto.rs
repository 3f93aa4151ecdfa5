//! Wire types for the directory REST surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::model::{Container, Membership, NewContainer};

#[derive(Debug, Deserialize)]
pub struct CreateContainerRequest {
    pub level: String,
    pub slug: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

impl From<CreateContainerRequest> for NewContainer {
    fn from(req: CreateContainerRequest) -> Self {
        Self {
            level: req.level,
            slug: req.slug,
            display_name: req.display_name,
            parent_id: req.parent_id,
            metadata: req.metadata,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContainerDto {
    pub id: Uuid,
    pub level: String,
    pub slug: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
    pub root_id: Uuid,
    pub depth: i32,
    pub active: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Container> for ContainerDto {
    fn from(c: Container) -> Self {
        Self {
            id: c.id,
            level: c.level,
            slug: c.slug,
            display_name: c.display_name,
            parent_id: c.parent_id,
            root_id: c.root_id,
            depth: c.depth,
            active: c.active,
            metadata: c.metadata,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub container_id: Uuid,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<Membership> for MembershipDto {
    fn from(m: Membership) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            container_id: m.container_id,
            role: m.role,
            created_at: m.created_at,
        }
    }
}

/// Query for slug lookups and filtered listings.
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub level: String,
    pub slug: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LevelFilter {
    pub level: Option<String>,
}
