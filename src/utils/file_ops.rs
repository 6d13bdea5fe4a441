//! Filoperationer för import och export av dokument och säkerhetskopior

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Läs textfil till sträng
pub fn read_text_file(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire le fichier : {:?}", path))
}

/// Läs binärfil
pub fn read_binary_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .with_context(|| format!("Impossible de lire le fichier : {:?}", path))
}

/// Skriv data till fil, skapar katalogen vid behov
pub fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Impossible de créer le dossier : {:?}", parent))?;
        }
    }

    fs::write(path, content)
        .with_context(|| format!("Impossible d'écrire le fichier : {:?}", path))
}

/// Generera unikt filnamn om filen redan finns
pub fn unique_filename(dir: &Path, filename: &str) -> String {
    let path = dir.join(filename);

    if !path.exists() {
        return filename.to_string();
    }

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);

    let extension = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    for i in 2..1000 {
        let new_name = format!("{}_{}{}", stem, i, extension);
        if !dir.join(&new_name).exists() {
            return new_name;
        }
    }

    // Fallback med timestamp
    let timestamp = chrono::Utc::now().timestamp();
    format!("{}_{}{}", stem, timestamp, extension)
}
