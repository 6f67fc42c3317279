//! Migration Manager - creating, loading and parsing migration files
//!
//! A migration file is named `<YYYYMMDD_HHMMSS>_<name>.sql` and holds two
//! sections introduced by `-- Up migration` and `-- Down migration`.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::Path;

use super::definitions::{Migration, MigrationConfig};
use crate::error::{ModelError, ModelResult};

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Section of a migration file being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Up,
    Down,
}

/// Reads and writes migration files in one directory
#[derive(Debug, Clone, Default)]
pub struct MigrationManager {
    config: MigrationConfig,
}

impl MigrationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MigrationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Write an empty migration file and return its file name
    pub fn create_migration(&self, name: &str) -> ModelResult<String> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(ModelError::Migration(format!(
                "Invalid migration name '{}'",
                name
            )));
        }

        fs::create_dir_all(&self.config.migrations_dir).map_err(|e| {
            ModelError::Migration(format!("Failed to create migrations directory: {}", e))
        })?;

        let now = Utc::now();
        let id = format!("{}_{}", now.format(TIMESTAMP_FORMAT), slug);
        let filename = format!("{}.sql", id);
        let path = self.config.migrations_dir.join(&filename);
        if path.exists() {
            return Err(ModelError::Migration(format!(
                "Migration file {} already exists",
                filename
            )));
        }

        fs::write(&path, migration_template(name, &id, now))
            .map_err(|e| ModelError::Migration(format!("Failed to write migration file: {}", e)))?;

        tracing::info!(migration = %id, "Created migration");
        Ok(filename)
    }

    /// Every `.sql` file in the migrations directory, oldest first
    ///
    /// A missing directory holds no migrations.
    pub fn load_migrations(&self) -> ModelResult<Vec<Migration>> {
        let dir = &self.config.migrations_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            ModelError::Migration(format!("Failed to read migrations directory: {}", e))
        })?;

        let mut migrations = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ModelError::Migration(format!("Failed to read directory entry: {}", e)))?
                .path();
            if path.extension().map_or(false, |ext| ext == "sql") {
                migrations.push(self.parse_migration_file(&path)?);
            }
        }

        migrations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(migrations)
    }

    fn parse_migration_file(&self, path: &Path) -> ModelResult<Migration> {
        let id = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| {
                ModelError::Migration(format!("Invalid migration filename: {}", path.display()))
            })?;

        let content = fs::read_to_string(path)
            .map_err(|e| ModelError::Migration(format!("Failed to read migration {}: {}", id, e)))?;

        parse_migration(id, &content)
    }
}

/// Build a migration from its id and file content
pub fn parse_migration(id: &str, content: &str) -> ModelResult<Migration> {
    let (created_at, name) = parse_migration_id(id)?;
    let (up_sql, down_sql) = parse_migration_content(content);

    Ok(Migration {
        id: id.to_string(),
        name,
        up_sql,
        down_sql,
        created_at,
    })
}

/// Split `<YYYYMMDD_HHMMSS>_<name>` into its timestamp and readable name
fn parse_migration_id(id: &str) -> ModelResult<(DateTime<Utc>, String)> {
    let invalid = || {
        ModelError::Migration(format!(
            "Migration '{}' must be named <YYYYMMDD_HHMMSS>_<name>",
            id
        ))
    };

    let stamp = id.get(..15).ok_or_else(invalid)?;
    let name = id.get(16..).filter(|name| !name.is_empty()).ok_or_else(invalid)?;
    if id.as_bytes().get(15) != Some(&b'_') {
        return Err(invalid());
    }

    let created_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map_err(|_| invalid())?
        .and_utc();

    Ok((created_at, name.replace('_', " ")))
}

/// Up and down scripts of a migration file
///
/// Lines before the first marker and comment-only lines are dropped.
fn parse_migration_content(content: &str) -> (String, String) {
    let mut up = Vec::new();
    let mut down = Vec::new();
    let mut section = Section::Preamble;

    for line in content.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();

        if lowered.starts_with("--") {
            let marker = lowered.trim_start_matches('-').trim();
            if marker.starts_with("up migration") {
                section = Section::Up;
            } else if marker.starts_with("down migration") {
                section = Section::Down;
            }
            continue;
        }
        if trimmed.is_empty() {
            continue;
        }

        match section {
            Section::Up => up.push(line),
            Section::Down => down.push(line),
            Section::Preamble => {}
        }
    }

    (
        up.join("\n").trim().to_string(),
        down.join("\n").trim().to_string(),
    )
}

fn slugify(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn migration_template(name: &str, id: &str, created: DateTime<Utc>) -> String {
    format!(
        "-- Migration: {}\n\
         -- ID: {}\n\
         -- Created: {}\n\n\
         -- Up migration\n\n\n\
         -- Down migration\n\n",
        name,
        id,
        created.format("%Y-%m-%d %H:%M:%S UTC")
    )
}
