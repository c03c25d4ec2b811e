//! Integrations plugin library.
//!
//! Hosts the plugin's migration engine: definition files in `migrations/`
//! name the migrations to run, the registry in [`migration::migrations`]
//! supplies their logic, and [`migration::Engine`] runs them in one
//! transaction.

pub mod config;
pub mod infra;
pub mod migration;
pub mod templates;

use tracing::{info, warn};

use common::AppResult;

use crate::config::PluginConfig;
use crate::infra::Database;
use crate::migration::{migrations, read_manifest, Engine, MigrationRunReport};

/// Build the engine for `db` from the plugin configuration.
pub fn engine(db: &Database, config: &PluginConfig) -> AppResult<Engine> {
    Ok(Engine::new(
        db.get_connection(),
        config.database.table_prefix.clone(),
        config.migrations_path(),
        migrations::registry()?,
    ))
}

/// Plugin startup: connect and bring the schema up to date.
pub async fn bootstrap(config: &PluginConfig) -> AppResult<(Database, MigrationRunReport)> {
    config.validate()?;

    let db = Database::connect(&config.database.url).await?;
    db.ping().await?;
    let report = engine(&db, config)?.up().await?;
    info!(
        executed = report.executed.len(),
        skipped = report.skipped.len(),
        "Integrations plugin ready"
    );

    Ok((db, report))
}

/// One row of `migrate status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub identifier: String,
    pub registered: bool,
    pub description: Option<String>,
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Status,
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction, config: &PluginConfig) -> AppResult<()> {
    config.validate()?;

    match action {
        MigrateAction::Up => {
            let db = Database::connect(&config.database.url).await?;
            let report = engine(&db, config)?.up().await?;
            for identifier in &report.executed {
                println!("[x] {}", identifier);
            }
            for identifier in &report.skipped {
                println!("[-] {}", identifier);
            }
            info!(
                "Migrations finished: {} executed, {} skipped",
                report.executed.len(),
                report.skipped.len()
            );
        }
        MigrateAction::Status => {
            for status in migration_status(config)? {
                let marker = if status.registered { "[ ]" } else { "[?]" };
                match status.description {
                    Some(description) => {
                        println!("{} {} - {}", marker, status.identifier, description)
                    }
                    None => println!("{} {}", marker, status.identifier),
                }
            }
        }
    }

    Ok(())
}

/// List discovered migration files with their resolution status.
///
/// Does not touch the database.
pub fn migration_status(config: &PluginConfig) -> AppResult<Vec<MigrationStatus>> {
    let dir = config.migrations_path();
    let registry = migrations::registry()?;

    migration::list_migration_files(&dir)?
        .into_iter()
        .map(|file_name| {
            let identifier = registry.qualify(migration::migration_stem(&file_name));
            let description = match read_manifest(&dir.join(&file_name)) {
                Ok(manifest) => manifest.description,
                Err(e) => {
                    warn!("Unreadable migration definition {}: {}", file_name, e);
                    None
                }
            };

            Ok(MigrationStatus {
                registered: registry.contains(&identifier),
                identifier,
                description,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn bootstrap_brings_a_fresh_database_up_to_date() {
        let mut config = PluginConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.table_prefix = "mautic_".to_string();

        let (db, report) = bootstrap(&config).await.unwrap();

        assert_eq!(report.executed.len(), 3);
        assert!(report.skipped.is_empty());
        // Same pool, so the in-memory schema is still there
        let again = engine(&db, &config).unwrap().up().await.unwrap();
        assert_eq!(again.skipped.len(), 3);
    }

    #[tokio::test]
    async fn bootstrap_rejects_an_invalid_prefix_before_connecting() {
        let mut config = PluginConfig::default();
        config.database.url = "sqlite::memory:".to_string();
        config.database.table_prefix = "bad prefix;".to_string();

        let err = bootstrap(&config).await.unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn status_lists_shipped_migrations_as_registered() {
        let statuses = migration_status(&PluginConfig::default()).unwrap();

        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| s.registered));
        assert_eq!(
            statuses[0].identifier,
            "integrations::migrations::m20190326_000001_create_sync_object_mapping"
        );
        assert_eq!(
            statuses[0].description.as_deref(),
            Some("Create the sync_object_mapping table")
        );
    }

    #[test]
    fn status_flags_unregistered_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m20990101_000001_unknown.json"), "{ broken").unwrap();
        let mut config = PluginConfig::default();
        config.migrations.path = dir.path().display().to_string();

        let statuses = migration_status(&config).unwrap();

        assert_eq!(
            statuses,
            vec![MigrationStatus {
                identifier: "integrations::migrations::m20990101_000001_unknown".to_string(),
                registered: false,
                description: None,
            }]
        );
    }
}
