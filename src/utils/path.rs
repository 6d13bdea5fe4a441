use std::path::{Path, PathBuf};

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("fr", "locadan", "Locadan")
}

/// Hämta databassökväg
pub fn get_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("locadan.db"))
        .unwrap_or_else(|| PathBuf::from("locadan.db"))
}

/// Hämta konfigurationssökväg
pub fn get_config_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("settings.toml"))
        .unwrap_or_else(|| PathBuf::from("settings.toml"))
}

/// Standardkatalog för säkerhetskopior
pub fn get_default_backup_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("sauvegardes"))
        .unwrap_or_else(|| PathBuf::from("sauvegardes"))
}

/// Standardkatalog för PDF-rapporter
pub fn get_default_report_dir() -> PathBuf {
    dirs::document_dir()
        .map(|dir| dir.join("Locadan"))
        .unwrap_or_else(|| PathBuf::from("rapports"))
}

/// Normalisera sökväg för visning
pub fn display_path(path: &Path) -> String {
    // Förkorta hemkatalogen till ~
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

/// Skapa en säker filnamn från en sträng
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Hämta filändelse
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
}

/// Gissa MIME-typ från filändelsen
pub fn guess_mime_type(path: &Path) -> &'static str {
    match get_extension(path).as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("xls") => "application/vnd.ms-excel",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        _ => "application/octet-stream",
    }
}
