//! Initial migration for the api_key table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiKey::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiKey::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApiKey::KeyId).text().not_null())
                    .col(ColumnDef::new(ApiKey::SecretHash).text().not_null())
                    .col(ColumnDef::new(ApiKey::UserId).uuid().not_null())
                    .col(ColumnDef::new(ApiKey::ContainerId).uuid().not_null())
                    .col(ColumnDef::new(ApiKey::RootId).uuid().not_null())
                    .col(
                        ColumnDef::new(ApiKey::Revoked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ApiKey::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_api_key_key_id")
                    .table(ApiKey::Table)
                    .col(ApiKey::KeyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiKey::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum ApiKey {
    Table,
    Id,
    KeyId,
    SecretHash,
    UserId,
    ContainerId,
    RootId,
    Revoked,
    CreatedAt,
}
