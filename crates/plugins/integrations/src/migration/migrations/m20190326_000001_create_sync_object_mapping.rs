//! Migration: Create the object mapping table.

use async_trait::async_trait;
use sea_orm_migration::prelude::*;

use crate::migration::{Migration as PluginMigration, MigrationContext};

pub const TABLE: &str = "sync_object_mapping";

pub struct Migration<'c> {
    ctx: MigrationContext<'c>,
}

impl<'c> Migration<'c> {
    pub fn new(ctx: MigrationContext<'c>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl PluginMigration for Migration<'_> {
    async fn should_execute(&self) -> Result<bool, DbErr> {
        let exists = self
            .ctx
            .schema_manager()
            .has_table(self.ctx.table(TABLE))
            .await?;
        Ok(!exists)
    }

    async fn execute(&self) -> Result<(), DbErr> {
        let table = self.ctx.table(TABLE);
        let manager = self.ctx.schema_manager();

        manager
            .create_table(
                Table::create()
                    .table(Alias::new(&table))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alias::new("date_created")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("integration")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("integration_object_name")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("integration_object_id")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("internal_object_name")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("internal_object_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("last_sync_date")).timestamp().not_null())
                    .col(
                        ColumnDef::new(Alias::new("is_deleted"))
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups go by integration object first
        manager
            .create_index(
                Index::create()
                    .name(format!("{}integration_object", self.ctx.table_prefix()))
                    .table(Alias::new(&table))
                    .col(Alias::new("integration"))
                    .col(Alias::new("integration_object_name"))
                    .col(Alias::new("integration_object_id"))
                    .to_owned(),
            )
            .await
    }
}
