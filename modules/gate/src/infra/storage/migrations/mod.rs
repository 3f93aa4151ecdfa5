//! Gate schema migrations.

use sea_orm::sea_query::{Alias, DynIden, IntoIden};
use sea_orm_migration::prelude::*;

mod m20250301_000002_create_api_keys;

/// Migrator for the gate module tables.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250301_000002_create_api_keys::Migration)]
    }

    // Each module migrator keeps its own bookkeeping table; the default
    // `seaql_migrations` is owned by the directory migrator, and sharing
    // it would make either migrator reject the other's applied versions.
    fn migration_table_name() -> DynIden {
        Alias::new("seaql_migrations_gate").into_iden()
    }
}
