//! Migration definition contract.
//!
//! A migration is constructed per run from a [`MigrationContext`] and asked
//! once whether it applies before it is executed.

use async_trait::async_trait;
use sea_orm::{DatabaseTransaction, DbErr};
use sea_orm_migration::SchemaManager;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Capability pair every migration implements.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Migration: Send + Sync {
    /// Decide whether the migration still needs to run (e.g. column missing).
    async fn should_execute(&self) -> Result<bool, DbErr>;

    /// Apply the change.
    async fn execute(&self) -> Result<(), DbErr>;
}

/// Shared context handed to every migration of a run.
///
/// Borrows the transaction opened by the engine, so all work done through
/// [`MigrationContext::connection`] commits or rolls back together.
#[derive(Clone, Copy)]
pub struct MigrationContext<'c> {
    txn: &'c DatabaseTransaction,
    table_prefix: &'c str,
}

impl<'c> MigrationContext<'c> {
    pub fn new(txn: &'c DatabaseTransaction, table_prefix: &'c str) -> Self {
        Self { txn, table_prefix }
    }

    /// Persistence handle bound to the run's transaction
    pub fn connection(&self) -> &'c DatabaseTransaction {
        self.txn
    }

    pub fn table_prefix(&self) -> &'c str {
        self.table_prefix
    }

    /// Prefixed table name
    pub fn table(&self, name: &str) -> String {
        format!("{}{}", self.table_prefix, name)
    }

    /// Schema manager running on the run's transaction
    pub fn schema_manager(&self) -> SchemaManager<'c> {
        SchemaManager::new(self.txn)
    }
}

impl std::fmt::Debug for MigrationContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationContext")
            .field("table_prefix", &self.table_prefix)
            .finish_non_exhaustive()
    }
}
