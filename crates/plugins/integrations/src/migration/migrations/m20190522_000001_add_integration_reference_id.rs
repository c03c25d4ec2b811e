//! Migration: Add the integration reference column to the object mapping table.
//!
//! Some integrations identify one object by two ids; the second one is kept
//! in `integration_reference_id`.

use async_trait::async_trait;
use sea_orm_migration::prelude::*;

use super::m20190326_000001_create_sync_object_mapping::TABLE;
use crate::migration::{Migration as PluginMigration, MigrationContext};

pub const COLUMN: &str = "integration_reference_id";

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
        let manager = self.ctx.schema_manager();
        let table = self.ctx.table(TABLE);

        // Nothing to alter until the table exists
        if !manager.has_table(&table).await? {
            return Ok(false);
        }

        Ok(!manager.has_column(&table, COLUMN).await?)
    }

    async fn execute(&self) -> Result<(), DbErr> {
        self.ctx
            .schema_manager()
            .alter_table(
                Table::alter()
                    .table(Alias::new(self.ctx.table(TABLE)))
                    .add_column(ColumnDef::new(Alias::new(COLUMN)).string_len(191).null())
                    .to_owned(),
            )
            .await
    }
}
