use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::utils::path::guess_mime_type;

/// Fil som ska läggas till i dokumentlagret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    pub payload: Vec<u8>,
}

impl NewDocument {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: payload.len() as i64,
            mime_type: mime_type.into(),
            payload,
        }
    }

    /// Bygg från filnamn, MIME-typ gissas från filändelsen
    pub fn from_filename(name: impl Into<String>, payload: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = guess_mime_type(Path::new(&name));
        Self::new(name, mime_type, payload)
    }
}

/// Dokumentets metadata (utan innehåll)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: i64,
    pub name: String,
    pub size: i64,
    pub mime_type: String,
    /// RFC 3339, UTC
    pub created_at: String,
}

impl DocumentInfo {
    pub fn file_size_display(&self) -> String {
        const KB: i64 = 1024;
        const MB: i64 = KB * 1024;
        const GB: i64 = MB * 1024;

        match self.size {
            s if s >= GB => format!("{:.1} Go", s as f64 / GB as f64),
            s if s >= MB => format!("{:.1} Mo", s as f64 / MB as f64),
            s if s >= KB => format!("{:.1} Ko", s as f64 / KB as f64),
            s => format!("{} o", s),
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    /// Kort typetikett för listor
    pub fn kind_label(&self) -> &'static str {
        if self.is_pdf() {
            "pdf"
        } else if self.is_image() {
            "image"
        } else {
            "fichier"
        }
    }
}

/// Dokument med innehåll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub info: DocumentInfo,
    pub payload: Vec<u8>,
}
