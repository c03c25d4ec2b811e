//! Code generation templates.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::migration::MigrationManifest;
use common::{AppError, AppResult};

/// Files written for a new migration.
#[derive(Debug, Clone)]
pub struct GeneratedMigration {
    /// Module and definition file stem
    pub name: String,
    pub manifest_path: PathBuf,
    pub module_path: PathBuf,
}

/// Generate a migration definition file and its module skeleton.
///
/// The definition goes to `migrations_dir`, the module to `modules_dir`. The
/// module still has to be added to the registry by hand.
pub fn generate_migration(
    name: &str,
    migrations_dir: &Path,
    modules_dir: &Path,
) -> AppResult<GeneratedMigration> {
    generate_migration_at(name, migrations_dir, modules_dir, Utc::now())
}

fn generate_migration_at(
    name: &str,
    migrations_dir: &Path,
    modules_dir: &Path,
    now: DateTime<Utc>,
) -> AppResult<GeneratedMigration> {
    let snake_name = to_snake_case(name);
    if snake_name.is_empty()
        || !snake_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::validation(format!(
            "Invalid migration name '{}'",
            name
        )));
    }

    let module_name = format!("m{}_{}", now.format("%Y%m%d_%H%M%S"), snake_name);
    let manifest_path = migrations_dir.join(format!("{}.json", module_name));
    let module_path = modules_dir.join(format!("{}.rs", module_name));

    let manifest = MigrationManifest {
        description: Some(to_sentence(&snake_name)),
    };
    let mut manifest_content = serde_json::to_string_pretty(&manifest)?;
    manifest_content.push('\n');

    let module_content = format!(
        r#"//! Migration: {description}

use async_trait::async_trait;
use sea_orm_migration::prelude::*;

use crate::migration::{{Migration as PluginMigration, MigrationContext}};

pub struct Migration<'c> {{
    ctx: MigrationContext<'c>,
}}

impl<'c> Migration<'c> {{
    pub fn new(ctx: MigrationContext<'c>) -> Self {{
        Self {{ ctx }}
    }}
}}

#[async_trait]
impl PluginMigration for Migration<'_> {{
    async fn should_execute(&self) -> Result<bool, DbErr> {{
        let exists = self
            .ctx
            .schema_manager()
            .has_table(self.ctx.table("{snake_name}"))
            .await?;
        Ok(!exists)
    }}

    async fn execute(&self) -> Result<(), DbErr> {{
        self.ctx
            .schema_manager()
            .create_table(
                Table::create()
                    .table(Alias::new(self.ctx.table("{snake_name}")))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await
    }}
}}
"#,
        description = manifest.description.as_deref().unwrap_or_default(),
    );

    write_new_file(&manifest_path, &manifest_content)?;
    write_new_file(&module_path, &module_content)?;

    Ok(GeneratedMigration {
        name: module_name,
        manifest_path,
        module_path,
    })
}

/// Write a file, refusing to overwrite an existing one
fn write_new_file(path: &Path, content: &str) -> AppResult<()> {
    if path.exists() {
        return Err(AppError::validation(format!(
            "{} already exists",
            path.display()
        )));
    }

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, content)?;

    Ok(())
}

/// Convert to snake_case
fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.trim().chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }
    result
}

/// `add_reference_column` -> `Add reference column`
fn to_sentence(snake: &str) -> String {
    let words = snake.split('_').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::{migration_stem, read_manifest};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 5, 22, 10, 30, 0).unwrap()
    }

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("AddReferenceColumn"), "add_reference_column");
        assert_eq!(to_snake_case("add-reference column"), "add_reference_column");
        assert_eq!(to_snake_case("Add_Column"), "add_column");
    }

    #[test]
    fn generates_manifest_and_module() {
        let dir = TempDir::new().unwrap();
        let migrations_dir = dir.path().join("migrations");
        let modules_dir = dir.path().join("src");

        let generated =
            generate_migration_at("AddReferenceColumn", &migrations_dir, &modules_dir, fixed_now())
                .unwrap();

        assert_eq!(generated.name, "m20190522_103000_add_reference_column");
        assert_eq!(
            migration_stem(generated.manifest_path.file_name().unwrap().to_str().unwrap()),
            generated.name
        );

        let manifest = read_manifest(&generated.manifest_path).unwrap();
        assert_eq!(manifest.description.as_deref(), Some("Add reference column"));

        let module = fs::read_to_string(&generated.module_path).unwrap();
        assert!(module.contains("impl PluginMigration for Migration<'_>"));
        assert!(module.contains("self.ctx.table(\"add_reference_column\")"));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();

        generate_migration_at("create_links", dir.path(), dir.path(), fixed_now()).unwrap();
        let err = generate_migration_at("create_links", dir.path(), dir.path(), fixed_now())
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_invalid_names() {
        let dir = TempDir::new().unwrap();
        let err = generate_migration_at("drop;table", dir.path(), dir.path(), fixed_now())
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
