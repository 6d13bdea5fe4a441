//! Backup-service: JSON-ögonblicksbild av postlagret

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::{Map, Value};

use crate::models::Collection;
use crate::store::{codec, RecordStore};
use crate::utils::file_ops::write_file;
use crate::utils::AppResult;

const BACKUP_PREFIX: &str = "locadan_backup_";
const BACKUP_EXTENSION: &str = ".json";

/// Resultat av en backup-operation
#[derive(Debug, Clone)]
pub struct BackupResult {
    /// Sökväg till backup-filen
    pub path: PathBuf,
    /// Storlek i bytes
    pub size: u64,
    /// Antal poster i ögonblicksbilden
    pub record_count: usize,
    /// Datum för backup
    pub created_at: String,
}

impl BackupResult {
    pub fn size_display(&self) -> String {
        format_size(self.size)
    }
}

/// Information om en befintlig backup
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub filename: String,
    pub size: u64,
    /// Datum (extraherat från filnamn)
    pub date: Option<String>,
}

impl BackupInfo {
    pub fn size_display(&self) -> String {
        format_size(self.size)
    }
}

fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match size {
        b if b >= GB => format!("{:.1} Go", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} Mo", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} Ko", b as f64 / KB as f64),
        b => format!("{} o", b),
    }
}

/// Backup-service
pub struct BackupService<'a> {
    store: &'a RecordStore,
}

impl<'a> BackupService<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Alla samlingar (utan dokument) som ett JSON-objekt, nyckel = samlingens namn
    pub fn snapshot(&self) -> AppResult<Value> {
        let mut map = Map::new();
        for &collection in Collection::ALL {
            map.insert(
                collection.key().to_string(),
                codec::encode_collection(self.store.list(collection))?,
            );
        }
        Ok(Value::Object(map))
    }

    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot()?)?)
    }

    /// Skriv ögonblicksbilden till en given fil
    pub fn write_to(&self, path: &Path) -> Result<BackupResult> {
        let json = self.to_json().context("Impossible de sérialiser les données")?;
        write_file(path, json.as_bytes())?;

        let metadata = fs::metadata(path)?;
        tracing::info!("Säkerhetskopia skriven: {}", path.display());

        Ok(BackupResult {
            path: path.to_path_buf(),
            size: metadata.len(),
            record_count: self.store.total_len(),
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        })
    }

    /// Skapa en backup med tidsstämplat namn i `backup_dir`
    pub fn create_backup(&self, backup_dir: &Path) -> Result<BackupResult> {
        fs::create_dir_all(backup_dir).context("Impossible de créer le dossier de sauvegarde")?;
        self.write_to(&backup_dir.join(Self::generate_filename()))
    }

    pub fn generate_filename() -> String {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        format!("{}{}{}", BACKUP_PREFIX, timestamp, BACKUP_EXTENSION)
    }

    /// Lista befintliga backuper, nyaste först
    pub fn list_backups(backup_dir: &Path) -> Result<Vec<BackupInfo>> {
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();

        for entry in fs::read_dir(backup_dir)? {
            let entry = entry?;
            let path = entry.path();
            let filename = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();

            if filename.starts_with(BACKUP_PREFIX) && filename.ends_with(BACKUP_EXTENSION) {
                let metadata = fs::metadata(&path)?;
                let date = Self::extract_date_from_filename(&filename);

                backups.push(BackupInfo {
                    path,
                    filename,
                    size: metadata.len(),
                    date,
                });
            }
        }

        // Tidsstämpeln i namnet sorterar lexikografiskt
        backups.sort_by(|a, b| b.filename.cmp(&a.filename));

        Ok(backups)
    }

    /// Ta bort en backup
    pub fn delete_backup(path: &Path) -> Result<()> {
        fs::remove_file(path).context("Impossible de supprimer la sauvegarde")?;
        Ok(())
    }

    fn extract_date_from_filename(filename: &str) -> Option<String> {
        // Format: locadan_backup_YYYYMMDD_HHMMSS.json
        let date_part = filename
            .strip_prefix(BACKUP_PREFIX)?
            .strip_suffix(BACKUP_EXTENSION)?;

        if date_part.len() < 15 || !date_part.is_ascii() {
            return None;
        }

        let year = &date_part[0..4];
        let month = &date_part[4..6];
        let day = &date_part[6..8];
        let hour = &date_part[9..11];
        let minute = &date_part[11..13];
        let second = &date_part[13..15];
        Some(format!(
            "{}-{}-{} {}:{}:{}",
            year, month, day, hour, minute, second
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{Record, Tenant};

    fn setup_store() -> RecordStore {
        let mut store = RecordStore::load(Database::open_in_memory().unwrap()).unwrap();
        store
            .upsert(
                Collection::Tenants,
                None,
                Record::Tenant(Tenant {
                    name: "Dupont".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        store
    }

    #[test]
    fn test_extract_date_from_filename() {
        let date = BackupService::extract_date_from_filename("locadan_backup_20260130_143022.json");
        assert_eq!(date, Some("2026-01-30 14:30:22".to_string()));

        assert_eq!(BackupService::extract_date_from_filename("other_file.json"), None);
        assert_eq!(BackupService::extract_date_from_filename("locadan_backup_2026.json"), None);
    }

    #[test]
    fn test_snapshot_contains_all_collections() {
        let store = setup_store();
        let snapshot = BackupService::new(&store).snapshot().unwrap();

        let map = snapshot.as_object().unwrap();
        assert_eq!(map.len(), Collection::ALL.len());
        assert_eq!(map["tenants"][0]["name"], "Dupont");
        assert!(map["tenants"][0]["id"].is_u64());
        assert_eq!(map["owners"], Value::Array(Vec::new()));
    }

    #[test]
    fn test_create_and_list_backups() {
        let store = setup_store();
        let dir = tempfile::tempdir().unwrap();

        let result = BackupService::new(&store).create_backup(dir.path()).unwrap();
        assert!(result.path.exists());
        assert_eq!(result.record_count, 1);

        fs::write(dir.path().join("locadan_backup_20200101_000000.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("export_banque.json"), "[]").unwrap();
        fs::write(dir.path().join("locadan_backup_20200101_000000.json.bak"), "{}").unwrap();

        let backups = BackupService::list_backups(dir.path()).unwrap();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0].path, result.path);
        assert_eq!(backups[1].date.as_deref(), Some("2020-01-01 00:00:00"));

        BackupService::delete_backup(&backups[1].path).unwrap();
        assert_eq!(BackupService::list_backups(dir.path()).unwrap().len(), 1);
    }

    #[test]
    fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent");
        assert!(BackupService::list_backups(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_size_display() {
        assert_eq!(format_size(512), "512 o");
        assert_eq!(format_size(1536), "1.5 Ko");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 Mo");
    }
}
