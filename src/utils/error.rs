use thiserror::Error;

use crate::models::Collection;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Erreur de base de données : {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Erreur d'entrée/sortie : {0}")]
    Io(#[from] std::io::Error),

    #[error("Erreur JSON : {0}")]
    Json(#[from] serde_json::Error),

    #[error("Données invalides : {0}")]
    Validation(String),

    #[error("Fichier invalide : {0}")]
    MalformedInput(String),

    #[error("Introuvable : {0}")]
    NotFound(String),

    #[error("Collection inconnue : {0}")]
    UnknownCollection(String),

    #[error("L'enregistrement appartient à {actual}, pas à {expected}")]
    CollectionMismatch {
        expected: Collection,
        actual: Collection,
    },
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Fel från själva lagringsmediet (SQLite, disk)
    pub fn is_medium_failure(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
