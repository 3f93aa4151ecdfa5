//! Query functions for programmatic keys.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::entity::api_key;

/// Column values for a new key row.
pub struct NewKeyRow {
    pub key_id: String,
    pub secret_hash: String,
    pub user_id: Uuid,
    pub container_id: Uuid,
    pub root_id: Uuid,
}

pub async fn insert_key<C: ConnectionTrait>(
    conn: &C,
    row: NewKeyRow,
) -> Result<api_key::Model, DbErr> {
    let active = api_key::ActiveModel {
        id: Set(Uuid::new_v4()),
        key_id: Set(row.key_id),
        secret_hash: Set(row.secret_hash),
        user_id: Set(row.user_id),
        container_id: Set(row.container_id),
        root_id: Set(row.root_id),
        revoked: Set(false),
        created_at: Set(Utc::now()),
    };
    api_key::Entity::insert(active).exec_with_returning(conn).await
}

pub async fn find_by_key_id<C: ConnectionTrait>(
    conn: &C,
    key_id: &str,
) -> Result<Option<api_key::Model>, DbErr> {
    api_key::Entity::find()
        .filter(api_key::Column::KeyId.eq(key_id))
        .one(conn)
        .await
}

/// Mark a key revoked. Returns whether a row was updated.
pub async fn revoke_key<C: ConnectionTrait>(conn: &C, key_id: &str) -> Result<bool, DbErr> {
    let result = api_key::Entity::update_many()
        .col_expr(api_key::Column::Revoked, Expr::value(true))
        .filter(api_key::Column::KeyId.eq(key_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}
