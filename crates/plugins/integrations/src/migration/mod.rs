//! Migration engine and the plugin's migration set.

mod definition;
mod discovery;
mod engine;
pub mod migrations;
mod registry;

pub use definition::{Migration, MigrationContext};
#[cfg(any(test, feature = "test-utils"))]
pub use definition::MockMigration;
pub use discovery::{list_migration_files, migration_stem, read_manifest, MigrationManifest};
pub use engine::{Engine, MigrationRunReport};
pub use registry::{MigrationFactory, MigrationRegistry};
