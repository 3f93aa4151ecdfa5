//! SeaORM entities for the directory module.

pub use container::Entity as ContainerEntity;
pub use membership::Entity as MembershipEntity;

/// Container entity module.
pub mod container {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    /// Container entity for the `container` table.
    ///
    /// `scope_key` mirrors `parent_id` with a nil-uuid sentinel for roots,
    /// so the `(level, slug, scope_key)` unique index also covers root
    /// containers (SQL treats NULLs as distinct in unique indexes).
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "container")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub level: String,
        pub slug: String,
        pub display_name: String,
        pub parent_id: Option<Uuid>,
        pub scope_key: Uuid,
        pub root_id: Uuid,
        pub path: String,
        pub depth: i32,
        pub active: bool,
        pub metadata: Json,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::membership::Entity")]
        Memberships,
    }

    impl Related<super::membership::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Memberships.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Membership entity module.
pub mod membership {
    use chrono::{DateTime, Utc};
    use sea_orm::entity::prelude::*;
    use uuid::Uuid;

    /// Membership entity for the `membership` table.
    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "membership")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub user_id: Uuid,
        pub container_id: Uuid,
        pub role: String,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::container::Entity",
            from = "Column::ContainerId",
            to = "super::container::Column::Id"
        )]
        Container,
    }

    impl Related<super::container::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Container.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
