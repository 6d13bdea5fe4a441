//! Import och export av dokument mellan filsystemet och bloblagret

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::models::{DocumentInfo, NewDocument};
use crate::utils::file_ops;
use crate::utils::path::sanitize_filename;

/// Resultat av en import
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Nya id:n i samma ordning som filerna
    pub ids: Vec<i64>,
    /// Total storlek i bytes
    pub total_size: i64,
}

impl ImportResult {
    pub fn summary(&self) -> String {
        format!("{} document(s) importé(s), {} octets", self.ids.len(), self.total_size)
    }
}

/// Tjänst för dokumentfiler
pub struct DocumentService<'a> {
    db: &'a Database,
}

impl<'a> DocumentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Läs filer från disk och lägg till dem i en transaktion
    pub fn import_files(&self, paths: &[PathBuf]) -> Result<ImportResult> {
        let mut files = Vec::with_capacity(paths.len());

        for path in paths {
            let payload = file_ops::read_binary_file(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| anyhow!("Nom de fichier invalide : {:?}", path))?;
            files.push(NewDocument::from_filename(name, payload));
        }

        let total_size = files.iter().map(|f| f.size).sum();
        let ids = self
            .db
            .documents()
            .add(files)
            .context("Impossible d'enregistrer le document")?;

        Ok(ImportResult { ids, total_size })
    }

    /// Skriv ett dokuments innehåll till `target`. Är `target` en katalog
    /// används dokumentets namn, utan att skriva över befintliga filer.
    pub fn export(&self, id: i64, target: &Path) -> Result<PathBuf> {
        let doc = self
            .db
            .documents()
            .fetch(id)?
            .ok_or_else(|| anyhow!("Fichier introuvable (#{})", id))?;

        let path = if target.is_dir() {
            let name = sanitize_filename(&doc.info.name);
            let name = if name.is_empty() {
                format!("document_{}", id)
            } else {
                name
            };
            target.join(file_ops::unique_filename(target, &name))
        } else {
            target.to_path_buf()
        };

        file_ops::write_file(&path, &doc.payload)?;
        tracing::info!("Exporterade dokument {} till {}", id, path.display());

        Ok(path)
    }

    pub fn list(&self) -> Result<Vec<DocumentInfo>> {
        Ok(self.db.documents().list_all()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_import_and_export() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let source = dir.path().join("bail.pdf");
        fs::write(&source, b"%PDF-1.4 bail").unwrap();

        let service = DocumentService::new(&db);
        let result = service.import_files(&[source.clone()]).unwrap();
        assert_eq!(result.ids.len(), 1);
        assert_eq!(result.total_size, 13);

        let info = &service.list().unwrap()[0];
        assert_eq!(info.name, "bail.pdf");
        assert_eq!(info.mime_type, "application/pdf");

        // Katalogen innehåller redan bail.pdf, så ett nytt namn väljs
        let exported = service.export(result.ids[0], dir.path()).unwrap();
        assert_ne!(exported, source);
        assert_eq!(fs::read(&exported).unwrap(), b"%PDF-1.4 bail");
    }

    #[test]
    fn test_export_missing_document() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let err = DocumentService::new(&db).export(99, dir.path()).unwrap_err();
        assert!(err.to_string().contains("introuvable"));
    }

    #[test]
    fn test_import_missing_file_adds_nothing() {
        let db = Database::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();

        let paths = vec![dir.path().join("absent.txt")];
        assert!(DocumentService::new(&db).import_files(&paths).is_err());
        assert_eq!(db.documents().count().unwrap(), 0);
    }
}
