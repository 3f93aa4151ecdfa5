//! Entity ↔ domain mapping.

use crate::domain::model::{Container, Membership};

use super::entity::{container, membership};

impl From<container::Model> for Container {
    fn from(m: container::Model) -> Self {
        Self {
            id: m.id,
            level: m.level,
            slug: m.slug,
            display_name: m.display_name,
            parent_id: m.parent_id,
            root_id: m.root_id,
            path: m.path,
            depth: m.depth,
            active: m.active,
            metadata: m.metadata,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<membership::Model> for Membership {
    fn from(m: membership::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            container_id: m.container_id,
            role: m.role,
            created_at: m.created_at,
        }
    }
}
