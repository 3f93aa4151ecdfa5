//! Initial migration for directory tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Container tree, one table polymorphic over hierarchy level.
        manager
            .create_table(
                Table::create()
                    .table(Container::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Container::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Container::Level).text().not_null())
                    .col(ColumnDef::new(Container::Slug).text().not_null())
                    .col(ColumnDef::new(Container::DisplayName).text().not_null())
                    .col(ColumnDef::new(Container::ParentId).uuid())
                    .col(ColumnDef::new(Container::ScopeKey).uuid().not_null())
                    .col(ColumnDef::new(Container::RootId).uuid().not_null())
                    .col(ColumnDef::new(Container::Path).text().not_null())
                    .col(ColumnDef::new(Container::Depth).integer().not_null())
                    .col(
                        ColumnDef::new(Container::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Container::Metadata).json().not_null())
                    .col(
                        ColumnDef::new(Container::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Container::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Container::Table, Container::ParentId)
                            .to(Container::Table, Container::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Slug uniqueness within (level, parent). scope_key carries a nil
        // sentinel for roots so the index also guards root slugs.
        manager
            .create_index(
                Index::create()
                    .name("uq_container_level_slug_scope")
                    .table(Container::Table)
                    .col(Container::Level)
                    .col(Container::Slug)
                    .col(Container::ScopeKey)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Materialized-path prefix queries.
        manager
            .create_index(
                Index::create()
                    .name("idx_container_path")
                    .table(Container::Table)
                    .col(Container::Path)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_container_root")
                    .table(Container::Table)
                    .col(Container::RootId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Membership::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Membership::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Membership::UserId).uuid().not_null())
                    .col(ColumnDef::new(Membership::ContainerId).uuid().not_null())
                    .col(ColumnDef::new(Membership::Role).text().not_null())
                    .col(
                        ColumnDef::new(Membership::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Membership::Table, Membership::ContainerId)
                            .to(Container::Table, Container::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one membership row per (user, container).
        manager
            .create_index(
                Index::create()
                    .name("uq_membership_user_container")
                    .table(Membership::Table)
                    .col(Membership::UserId)
                    .col(Membership::ContainerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_membership_container")
                    .table(Membership::Table)
                    .col(Membership::ContainerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Membership::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Container::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Container {
    Table,
    Id,
    Level,
    Slug,
    DisplayName,
    ParentId,
    ScopeKey,
    RootId,
    Path,
    Depth,
    Active,
    Metadata,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Membership {
    Table,
    Id,
    UserId,
    ContainerId,
    Role,
    CreatedAt,
}
