//! Integrations plugin migrations.
//!
//! Each migration is a separate module named after its definition file in the
//! plugin's `migrations/` directory: m{YYYYMMDD}_{NNNNNN}_{description}

use common::AppResult;

use crate::migration::MigrationRegistry;

mod m20190326_000001_create_sync_object_mapping;
mod m20190410_000001_create_sync_object_field_change_report;
mod m20190522_000001_add_integration_reference_id;

/// Namespace the plugin's migration identifiers live in.
pub const NAMESPACE: &str = "integrations::migrations";

/// Registry holding every migration the plugin ships.
pub fn registry() -> AppResult<MigrationRegistry> {
    MigrationRegistry::new(NAMESPACE)
        .try_register("m20190326_000001_create_sync_object_mapping", |ctx| {
            Box::new(m20190326_000001_create_sync_object_mapping::Migration::new(ctx))
        })?
        .try_register("m20190410_000001_create_sync_object_field_change_report", |ctx| {
            Box::new(m20190410_000001_create_sync_object_field_change_report::Migration::new(ctx))
        })?
        .try_register("m20190522_000001_add_integration_reference_id", |ctx| {
            Box::new(m20190522_000001_add_integration_reference_id::Migration::new(ctx))
        })
}
