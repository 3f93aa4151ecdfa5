//! SeaORM entities for the gate module.

pub use api_key::Entity as ApiKeyEntity;

/// Programmatic-key entity module.
pub mod api_key {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    /// Key record for the `api_key` table.
    ///
    /// The presented secret is never stored; `secret_hash` is its SHA-256
    /// digest, hex-encoded. Keys are bound to exactly one container.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "api_key")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(unique)]
        pub key_id: String,
        pub secret_hash: String,
        /// Subject the key acts as.
        pub user_id: Uuid,
        pub container_id: Uuid,
        pub root_id: Uuid,
        pub revoked: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}
