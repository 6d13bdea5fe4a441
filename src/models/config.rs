use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::path::{
    get_config_path, get_database_path, get_default_backup_dir, get_default_report_dir,
};

/// Applikationsinställningar som sparas i settings.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Databasfil (None = plattformens datakatalog)
    pub database_path: Option<PathBuf>,
    /// Katalog för JSON-säkerhetskopior
    pub backup_directory: PathBuf,
    /// Katalog där PDF-rapporter sparas
    pub report_directory: PathBuf,
    /// tracing-nivå: error, warn, info, debug, trace
    pub log_level: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: None,
            backup_directory: get_default_backup_dir(),
            report_directory: get_default_report_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Ladda från standardsökvägen, default om filen saknas eller är trasig
    pub fn load() -> Self {
        Self::load_from(&get_config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(content) = std::fs::read_to_string(path) {
            match toml::from_str(&content) {
                Ok(settings) => return settings,
                Err(e) => tracing::warn!("Ogiltig inställningsfil {:?}: {}", path, e),
            }
        }

        Self::default()
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Faktisk databassökväg
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(get_database_path)
    }
}
