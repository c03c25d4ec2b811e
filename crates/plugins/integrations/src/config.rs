//! Integrations plugin configuration.

use std::env;
use std::path::PathBuf;

use common::{is_valid_table_prefix, AppError, AppResult, DatabaseConfig, MigrationConfig};

/// Directory shipped with the plugin that holds its migration definitions.
pub const DEFAULT_MIGRATIONS_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/migrations");

/// Integrations plugin configuration.
#[derive(Clone)]
pub struct PluginConfig {
    pub database: DatabaseConfig,
    pub migrations: MigrationConfig,
}

impl std::fmt::Debug for PluginConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginConfig")
            .field("database_url", &"[REDACTED]")
            .field("table_prefix", &self.database.table_prefix)
            .field("migrations_path", &self.migrations.path)
            .finish()
    }
}

impl PluginConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("INTEGRATIONS_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                table_prefix: env::var("DB_TABLE_PREFIX")
                    .unwrap_or(defaults.database.table_prefix),
            },
            migrations: MigrationConfig {
                path: env::var("INTEGRATIONS_MIGRATIONS_PATH")
                    .unwrap_or(defaults.migrations.path),
            },
        }
    }

    /// Reject settings that would produce invalid table names.
    pub fn validate(&self) -> AppResult<()> {
        if !is_valid_table_prefix(&self.database.table_prefix) {
            return Err(AppError::validation(format!(
                "Table prefix '{}' may only contain letters, digits and underscores",
                self.database.table_prefix
            )));
        }
        Ok(())
    }

    pub fn migrations_path(&self) -> PathBuf {
        PathBuf::from(&self.migrations.path)
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            migrations: MigrationConfig {
                path: DEFAULT_MIGRATIONS_PATH.to_string(),
            },
        }
    }
}
