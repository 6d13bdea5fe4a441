pub mod schema;
pub mod migrations;
pub mod kv_repo;
pub mod document_repo;

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub use document_repo::DocumentRepository;
pub use kv_repo::KeyValueRepository;

use crate::utils::AppResult;

/// Huvuddatabas-wrapper med thread-safe access
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Öppna eller skapa databas
    pub fn open(path: &Path) -> AppResult<Self> {
        // Skapa katalog om den inte finns
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        // Konfigurera SQLite
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Öppna in-memory databas (för tester)
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Kör databasmigrationer
    pub fn migrate(&self) -> AppResult<()> {
        let conn = lock(&self.conn);
        migrations::run_migrations(&conn)
    }

    /// Hämta nyckel-värde-repository
    pub fn kv(&self) -> KeyValueRepository {
        KeyValueRepository::new(Arc::clone(&self.conn))
    }

    /// Hämta dokument-repository
    pub fn documents(&self) -> DocumentRepository {
        DocumentRepository::new(Arc::clone(&self.conn))
    }

    /// Direkt tillgång till connection (för avancerade operationer)
    pub fn with_connection<F, T>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = lock(&self.conn);
        f(&conn)
    }

    /// Schemaversionen som databasfilen är migrerad till
    pub fn schema_version(&self) -> AppResult<i32> {
        self.with_connection(migrations::get_current_version)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}

/// Lås anslutningen; ett förgiftat lås återanvänds eftersom SQLite
/// själv håller transaktionerna konsistenta
pub(crate) fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
