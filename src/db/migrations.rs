use rusqlite::Connection;
use tracing::info;

use super::schema::{CREATE_TABLES, SCHEMA_VERSION};
use crate::utils::AppResult;

/// Kör alla nödvändiga migrationer
pub fn run_migrations(conn: &Connection) -> AppResult<()> {
    let current_version = get_current_version(conn)?;

    if current_version == 0 {
        // Ny databas - skapa allt
        info!("Skapar ny databas med schema version {}", SCHEMA_VERSION);
        initial_setup(conn)?;
    } else if current_version < SCHEMA_VERSION {
        // Uppdatera befintlig databas
        info!(
            "Migrerar databas från version {} till {}",
            current_version, SCHEMA_VERSION
        );
        migrate_from(conn, current_version)?;
    } else {
        info!("Databas är uppdaterad (version {})", current_version);
    }

    Ok(())
}

pub(crate) fn get_current_version(conn: &Connection) -> AppResult<i32> {
    // Kontrollera om schema_migrations-tabellen finns
    let table_exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_migrations')",
        [],
        |row| row.get(0),
    )?;

    if !table_exists {
        return Ok(0);
    }

    // Hämta senaste version
    let version: Option<i32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .ok()
        .flatten();

    Ok(version.unwrap_or(0))
}

fn initial_setup(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(CREATE_TABLES)?;

    // Markera migration som klar
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [SCHEMA_VERSION],
    )?;

    info!("Initial setup klar");
    Ok(())
}

fn migrate_from(conn: &Connection, from_version: i32) -> AppResult<()> {
    // Kör migrationer stegvis; nya versioner får sitt steg här
    for version in (from_version + 1)..=SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO schema_migrations (version) VALUES (?)",
            [version],
        )?;

        info!("Migrerade till version {}", version);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn table_names(conn: &Connection) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_initial_migration() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let tables = table_names(&conn);
        assert!(tables.contains(&"kv_entries".to_string()));
        assert!(tables.contains(&"documents".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_idempotent_migration() {
        let conn = Connection::open_in_memory().unwrap();

        // Kör migrationer två gånger
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_initial_setup_creates_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_current_version(&conn).unwrap(), 1);
        let has_index: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='index' AND name='idx_documents_name')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(has_index);
    }

    #[test]
    fn test_current_database_is_not_migrated_again() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
