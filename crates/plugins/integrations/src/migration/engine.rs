//! Migration engine.
//!
//! Discovers migration files, resolves them through the registry and runs
//! the whole batch inside a single transaction.

use std::collections::HashSet;
use std::path::PathBuf;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, error, info};

use super::discovery::{list_migration_files, migration_stem};
use super::definition::MigrationContext;
use super::registry::{MigrationFactory, MigrationRegistry};
use common::{AppError, AppResult};

/// Outcome of one engine run, identifiers in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationRunReport {
    pub executed: Vec<String>,
    pub skipped: Vec<String>,
}

impl MigrationRunReport {
    /// Number of migrations constructed during the run
    pub fn total(&self) -> usize {
        self.executed.len() + self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// A discovered migration ready to be constructed.
struct PendingMigration<'r> {
    identifier: String,
    factory: &'r MigrationFactory,
}

/// Runs the plugin's migrations.
pub struct Engine {
    db: DatabaseConnection,
    table_prefix: String,
    migrations_path: PathBuf,
    registry: MigrationRegistry,
}

impl Engine {
    pub fn new(
        db: DatabaseConnection,
        table_prefix: impl Into<String>,
        migrations_path: impl Into<PathBuf>,
        registry: MigrationRegistry,
    ) -> Self {
        Self {
            db,
            table_prefix: table_prefix.into(),
            migrations_path: migrations_path.into(),
            registry,
        }
    }

    /// Identifiers derived from the migrations directory, in run order.
    pub fn migration_identifiers(&self) -> AppResult<Vec<String>> {
        Ok(list_migration_files(&self.migrations_path)?
            .iter()
            .map(|file_name| self.registry.qualify(migration_stem(file_name)))
            .collect())
    }

    /// Run available migrations.
    ///
    /// Nothing is opened when the directory holds no migrations. Otherwise
    /// every migration runs in one transaction, committed only if all of them
    /// succeed and rolled back on the first failure.
    pub async fn up(&self) -> AppResult<MigrationRunReport> {
        let pending = self.pending_migrations()?;

        if pending.is_empty() {
            debug!("No migrations found in {:?}", self.migrations_path);
            return Ok(MigrationRunReport::default());
        }

        info!("Running {} migrations", pending.len());

        let txn = self.db.begin().await?;

        match self.run_batch(&txn, &pending).await {
            Ok(report) => {
                txn.commit().await?;
                info!(
                    executed = report.executed.len(),
                    skipped = report.skipped.len(),
                    "Migrations committed"
                );
                Ok(report)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    error!("Migration rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Resolve every discovered identifier. Two files with the same stem
    /// (`A.php`, `A.sql`) would run one migration twice, so they are rejected.
    fn pending_migrations(&self) -> AppResult<Vec<PendingMigration<'_>>> {
        let mut seen = HashSet::new();

        self.migration_identifiers()?
            .into_iter()
            .map(|identifier| {
                if !seen.insert(identifier.clone()) {
                    return Err(AppError::DuplicateMigration(identifier));
                }
                match self.registry.resolve(&identifier) {
                    Some(factory) => Ok(PendingMigration {
                        identifier,
                        factory,
                    }),
                    None => Err(AppError::UnresolvedMigration(identifier)),
                }
            })
            .collect()
    }

    async fn run_batch(
        &self,
        txn: &DatabaseTransaction,
        pending: &[PendingMigration<'_>],
    ) -> AppResult<MigrationRunReport> {
        let mut report = MigrationRunReport::default();

        for entry in pending {
            let migration =
                (entry.factory.as_ref())(MigrationContext::new(txn, &self.table_prefix));

            let applies = migration
                .should_execute()
                .await
                .map_err(|e| AppError::migration(&entry.identifier, e))?;

            if !applies {
                debug!("Skipping migration: {}", entry.identifier);
                report.skipped.push(entry.identifier.clone());
                continue;
            }

            info!("Applying migration: {}", entry.identifier);
            migration
                .execute()
                .await
                .map_err(|e| AppError::migration(&entry.identifier, e))?;
            report.executed.push(entry.identifier.clone());
        }

        Ok(report)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("table_prefix", &self.table_prefix)
            .field("migrations_path", &self.migrations_path)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::definition::{Migration, MockMigration};
    use sea_orm::{Database, DbErr};
    use std::fs;
    use tempfile::TempDir;

    async fn sqlite() -> DatabaseConnection {
        Database::connect("sqlite::memory:").await.unwrap()
    }

    fn applies(value: bool) -> impl for<'c> Fn(MigrationContext<'c>) -> Box<dyn Migration + 'c> {
        move |_ctx| {
            let mut m = MockMigration::new();
            m.expect_should_execute().times(1).returning(move || Ok(value));
            if value {
                m.expect_execute().times(1).returning(|| Ok(()));
            } else {
                m.expect_execute().never();
            }
            Box::new(m)
        }
    }

    fn migrations_dir(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            fs::write(dir.path().join(file), "").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn skipped_migration_is_never_executed() {
        let dir = migrations_dir(&["A.php", "B.php"]);
        let registry = MigrationRegistry::new("plugin")
            .register("A", applies(true))
            .register("B", applies(false));
        let engine = Engine::new(sqlite().await, "", dir.path(), registry);

        let report = engine.up().await.unwrap();

        assert_eq!(report.executed, vec!["plugin::A"]);
        assert_eq!(report.skipped, vec!["plugin::B"]);
        assert_eq!(report.total(), 2);
    }

    #[tokio::test]
    async fn empty_directory_never_touches_the_database() {
        let dir = migrations_dir(&[]);
        let registry = MigrationRegistry::new("plugin").register("A", applies(true));
        // A disconnected handle fails on begin, so Ok proves no transaction was opened.
        let engine = Engine::new(DatabaseConnection::Disconnected, "", dir.path(), registry);

        let report = engine.up().await.unwrap();

        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_fails_before_begin() {
        let registry = MigrationRegistry::new("plugin").register("A", applies(true));
        let engine = Engine::new(
            DatabaseConnection::Disconnected,
            "",
            "/nonexistent/Migrations/",
            registry,
        );

        let err = engine.up().await.unwrap_err();

        assert!(matches!(err, AppError::PathNotFound(_)));
    }

    #[tokio::test]
    async fn unregistered_file_fails_before_begin() {
        let dir = migrations_dir(&["A.php", "Unknown.php"]);
        let registry = MigrationRegistry::new("plugin").register("A", |_ctx| {
            let mut m = MockMigration::new();
            m.expect_should_execute().never();
            m.expect_execute().never();
            Box::new(m)
        });
        let engine = Engine::new(DatabaseConnection::Disconnected, "", dir.path(), registry);

        let err = engine.up().await.unwrap_err();

        assert!(matches!(err, AppError::UnresolvedMigration(ref id) if id == "plugin::Unknown"));
    }

    #[tokio::test]
    async fn same_stem_twice_fails_before_begin() {
        let dir = migrations_dir(&["A.php", "A.sql"]);
        let registry = MigrationRegistry::new("plugin").register("A", |_ctx| {
            let mut m = MockMigration::new();
            m.expect_should_execute().never();
            m.expect_execute().never();
            Box::new(m)
        });
        let engine = Engine::new(DatabaseConnection::Disconnected, "", dir.path(), registry);

        let err = engine.up().await.unwrap_err();

        assert!(matches!(err, AppError::DuplicateMigration(ref id) if id == "plugin::A"));
    }

    #[tokio::test]
    async fn failing_check_aborts_the_run() {
        let dir = migrations_dir(&["A.php", "B.php"]);
        let registry = MigrationRegistry::new("plugin")
            .register("A", |_ctx| {
                let mut m = MockMigration::new();
                m.expect_should_execute()
                    .returning(|| Err(DbErr::Custom("no such table".to_string())));
                m.expect_execute().never();
                Box::new(m)
            })
            .register("B", |_ctx| {
                let mut m = MockMigration::new();
                m.expect_should_execute().never();
                m.expect_execute().never();
                Box::new(m)
            });
        let engine = Engine::new(sqlite().await, "", dir.path(), registry);

        let err = engine.up().await.unwrap_err();

        assert!(matches!(err, AppError::Migration { ref identifier, .. } if identifier == "plugin::A"));
    }

    #[tokio::test]
    async fn begin_failure_surfaces_as_database_error() {
        let dir = migrations_dir(&["A.php"]);
        let registry = MigrationRegistry::new("plugin").register("A", |_ctx| {
            let mut m = MockMigration::new();
            m.expect_should_execute().never();
            Box::new(m)
        });
        let engine = Engine::new(DatabaseConnection::Disconnected, "", dir.path(), registry);

        let err = engine.up().await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn identifiers_follow_sorted_file_names() {
        let dir = migrations_dir(&["20190201_Second.php", "20190101_AddColumn.php"]);
        let engine = Engine::new(
            DatabaseConnection::Disconnected,
            "mautic_",
            dir.path(),
            MigrationRegistry::new("integrations::migrations"),
        );

        assert_eq!(
            engine.migration_identifiers().unwrap(),
            vec![
                "integrations::migrations::20190101_AddColumn",
                "integrations::migrations::20190201_Second",
            ]
        );
    }
}
