//! Migration: Create the field change report table.

use async_trait::async_trait;
use sea_orm_migration::prelude::*;

use crate::migration::{Migration as PluginMigration, MigrationContext};

pub const TABLE: &str = "sync_object_field_change_report";

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
                    .col(ColumnDef::new(Alias::new("integration")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("object_type")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("object_id")).integer().not_null())
                    .col(ColumnDef::new(Alias::new("modified_at")).timestamp().not_null())
                    .col(ColumnDef::new(Alias::new("column_name")).string_len(191).not_null())
                    .col(ColumnDef::new(Alias::new("column_type")).string_len(50).not_null())
                    .col(ColumnDef::new(Alias::new("column_value")).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(format!("{}object_composite_key", self.ctx.table_prefix()))
                    .table(Alias::new(&table))
                    .col(Alias::new("object_type"))
                    .col(Alias::new("object_id"))
                    .col(Alias::new("column_name"))
                    .to_owned(),
            )
            .await
    }
}
