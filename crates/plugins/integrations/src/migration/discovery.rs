//! Migration discovery.
//!
//! The migrations directory holds one definition file per migration. Only the
//! file name matters to the engine: its stem becomes the migration name.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use common::{AppError, AppResult};

/// Directory self/parent entries never count as migrations.
const EXCLUDED_ENTRIES: [&str; 2] = [".", ".."];

/// Trailing extension of 3 or 4 characters, without dots or whitespace.
static EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.[^.\s]{3,4}$").expect("extension pattern is valid"));

/// Optional body of a migration definition file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MigrationManifest {
    pub description: Option<String>,
}

/// Strip the extension from a migration file name.
///
/// `20190101_AddColumn.php` becomes `20190101_AddColumn`. Extensions shorter
/// than 3 or longer than 4 characters are kept.
pub fn migration_stem(file_name: &str) -> &str {
    match EXTENSION.find(file_name) {
        Some(m) => &file_name[..m.start()],
        None => file_name,
    }
}

/// List migration file names in `dir`, sorted by name.
///
/// Fails with [`AppError::PathNotFound`] when the directory cannot be read.
/// Besides `.` and `..`, hidden files such as `.gitkeep`, sub-directories and
/// non UTF-8 names are skipped, so only regular definition files are listed.
pub fn list_migration_files(dir: &Path) -> AppResult<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        debug!("Cannot read migrations directory {:?}: {}", dir, e);
        AppError::path_not_found(dir.display().to_string())
    })?;

    let mut file_names = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|_| AppError::path_not_found(dir.display().to_string()))?;

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!("Skipping migration entry with non UTF-8 name: {:?}", entry.path());
            continue;
        };

        if EXCLUDED_ENTRIES.contains(&name.as_str()) {
            continue;
        }

        if name.starts_with('.') {
            debug!("Skipping hidden entry: {}", name);
            continue;
        }

        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            warn!("Skipping directory in migrations path: {}", name);
            continue;
        }

        file_names.push(name);
    }

    file_names.sort();

    debug!("Discovered {} migration files in {:?}", file_names.len(), dir);
    Ok(file_names)
}

/// Read the JSON body of a definition file.
///
/// Empty files yield an empty manifest.
pub fn read_manifest(path: &Path) -> AppResult<MigrationManifest> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(MigrationManifest::default());
    }
    Ok(serde_json::from_str(&content)?)
}
