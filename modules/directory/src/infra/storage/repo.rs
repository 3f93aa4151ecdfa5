//! Query functions for the container tree.
//!
//! Functions are generic over `ConnectionTrait` so the domain service can
//! run them inside one transaction. Uniqueness is enforced by the storage
//! indexes; unique-constraint violations are mapped to domain conflicts
//! here instead of check-then-insert races.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::domain::error::DomainError;

use super::entity::{container, membership};

/// Column values for a new container row; path/depth/root are computed by
/// the service before insert.
pub struct NewContainerRow {
    pub id: Uuid,
    pub level: String,
    pub slug: String,
    pub display_name: String,
    pub parent_id: Option<Uuid>,
    pub root_id: Uuid,
    pub path: String,
    pub depth: i32,
    pub metadata: serde_json::Value,
}

/// Insert a container row.
///
/// # Errors
/// `SlugConflict` when `(level, slug, parent)` is already taken; any other
/// database failure as `Database`.
pub async fn insert_container<C: ConnectionTrait>(
    conn: &C,
    row: NewContainerRow,
) -> Result<container::Model, DomainError> {
    let now = Utc::now();
    let active = container::ActiveModel {
        id: Set(row.id),
        level: Set(row.level.clone()),
        slug: Set(row.slug.clone()),
        display_name: Set(row.display_name),
        parent_id: Set(row.parent_id),
        scope_key: Set(row.parent_id.unwrap_or_else(Uuid::nil)),
        root_id: Set(row.root_id),
        path: Set(row.path),
        depth: Set(row.depth),
        active: Set(true),
        metadata: Set(row.metadata),
        created_at: Set(now),
        updated_at: Set(now),
    };

    container::Entity::insert(active)
        .exec_with_returning(conn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::SlugConflict {
                level: row.level,
                slug: row.slug,
            },
            _ => DomainError::Database(e),
        })
}

/// Find a container by id.
pub async fn find_container<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<Option<container::Model>, DomainError> {
    Ok(container::Entity::find_by_id(id).one(conn).await?)
}

/// Find a container by `(level, slug, parent)`.
pub async fn find_by_slug<C: ConnectionTrait>(
    conn: &C,
    level: &str,
    slug: &str,
    parent_id: Option<Uuid>,
) -> Result<Option<container::Model>, DomainError> {
    Ok(container::Entity::find()
        .filter(container::Column::Level.eq(level))
        .filter(container::Column::Slug.eq(slug))
        .filter(container::Column::ScopeKey.eq(parent_id.unwrap_or_else(Uuid::nil)))
        .one(conn)
        .await?)
}

/// Direct children of a container, optionally filtered by level.
pub async fn list_children<C: ConnectionTrait>(
    conn: &C,
    parent_id: Uuid,
    level: Option<&str>,
) -> Result<Vec<container::Model>, DomainError> {
    let mut query = container::Entity::find()
        .filter(container::Column::ParentId.eq(parent_id))
        .order_by_asc(container::Column::Slug);
    if let Some(level) = level {
        query = query.filter(container::Column::Level.eq(level));
    }
    Ok(query.all(conn).await?)
}

/// All containers under a root, optionally filtered by level.
pub async fn list_by_root<C: ConnectionTrait>(
    conn: &C,
    root_id: Uuid,
    level: Option<&str>,
) -> Result<Vec<container::Model>, DomainError> {
    let mut query = container::Entity::find()
        .filter(container::Column::RootId.eq(root_id))
        .order_by_asc(container::Column::Depth)
        .order_by_asc(container::Column::Slug);
    if let Some(level) = level {
        query = query.filter(container::Column::Level.eq(level));
    }
    Ok(query.all(conn).await?)
}

/// All descendants of a container via materialized-path prefix.
pub async fn list_descendants<C: ConnectionTrait>(
    conn: &C,
    descendant_prefix: &str,
) -> Result<Vec<container::Model>, DomainError> {
    Ok(container::Entity::find()
        .filter(container::Column::Path.starts_with(descendant_prefix))
        .order_by_asc(container::Column::Depth)
        .all(conn)
        .await?)
}

/// Flip the active flag.
pub async fn set_active<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    active: bool,
) -> Result<(), DomainError> {
    let result = container::Entity::update_many()
        .col_expr(container::Column::Active, Expr::value(active))
        .col_expr(container::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(container::Column::Id.eq(id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(DomainError::ContainerNotFound { id });
    }
    Ok(())
}

/// Delete a set of containers by id. Memberships must go first.
pub async fn delete_containers<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<u64, DomainError> {
    let result = container::Entity::delete_many()
        .filter(container::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Insert a membership row.
///
/// # Errors
/// `AlreadyMember` when the (user, container) pair already exists.
pub async fn insert_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    container_id: Uuid,
    role: &str,
) -> Result<membership::Model, DomainError> {
    let active = membership::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        container_id: Set(container_id),
        role: Set(role.to_owned()),
        created_at: Set(Utc::now()),
    };

    membership::Entity::insert(active)
        .exec_with_returning(conn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => DomainError::AlreadyMember {
                user_id,
                container_id,
            },
            _ => DomainError::Database(e),
        })
}

/// Find the membership row for (user, container).
pub async fn find_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    container_id: Uuid,
) -> Result<Option<membership::Model>, DomainError> {
    Ok(membership::Entity::find()
        .filter(membership::Column::UserId.eq(user_id))
        .filter(membership::Column::ContainerId.eq(container_id))
        .one(conn)
        .await?)
}

/// All members of one container.
pub async fn list_members<C: ConnectionTrait>(
    conn: &C,
    container_id: Uuid,
) -> Result<Vec<membership::Model>, DomainError> {
    Ok(membership::Entity::find()
        .filter(membership::Column::ContainerId.eq(container_id))
        .order_by_asc(membership::Column::CreatedAt)
        .all(conn)
        .await?)
}

/// All memberships across a set of containers (cascade bookkeeping).
pub async fn list_memberships_for_containers<C: ConnectionTrait>(
    conn: &C,
    container_ids: &[Uuid],
) -> Result<Vec<membership::Model>, DomainError> {
    Ok(membership::Entity::find()
        .filter(membership::Column::ContainerId.is_in(container_ids.iter().copied()))
        .all(conn)
        .await?)
}

/// Delete the membership row for (user, container). Returns whether a row
/// was removed.
pub async fn delete_membership<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    container_id: Uuid,
) -> Result<bool, DomainError> {
    let result = membership::Entity::delete_many()
        .filter(membership::Column::UserId.eq(user_id))
        .filter(membership::Column::ContainerId.eq(container_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Delete all memberships for a set of containers.
pub async fn delete_memberships_for_containers<C: ConnectionTrait>(
    conn: &C,
    container_ids: &[Uuid],
) -> Result<u64, DomainError> {
    let result = membership::Entity::delete_many()
        .filter(membership::Column::ContainerId.is_in(container_ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
