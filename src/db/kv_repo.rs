use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::utils::AppResult;

/// Beständigt nyckel-värde-lager: en rad per samling plus inställningar
pub struct KeyValueRepository {
    conn: Arc<Mutex<Connection>>,
}

impl KeyValueRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Hämta värde för nyckel
    pub fn get(&self, key: &str) -> AppResult<Option<String>> {
        let conn = lock(&self.conn);
        let value = conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// Spara värde för nyckel
    pub fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let conn = lock(&self.conn);
        conn.execute(
            "INSERT OR REPLACE INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;

        Ok(())
    }

    /// Spara flera nycklar i en transaktion
    pub fn set_many(&self, entries: &[(&str, String)]) -> AppResult<()> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, datetime('now'))",
            )?;
            for (key, value) in entries {
                stmt.execute(params![key, value])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Ta bort nyckel
    pub fn remove(&self, key: &str) -> AppResult<bool> {
        let conn = lock(&self.conn);
        let rows = conn.execute("DELETE FROM kv_entries WHERE key = ?", [key])?;
        Ok(rows > 0)
    }

    /// Alla nycklar i bokstavsordning
    pub fn keys(&self) -> AppResult<Vec<String>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare("SELECT key FROM kv_entries ORDER BY key")?;

        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(keys)
    }
}
