/// SQL-schema för Locadan
///
/// Två lagringsmedier i samma databasfil: ett nyckel-värde-lager för
/// postsamlingarna och ett bloblager för uppladdade dokument.

pub const SCHEMA_VERSION: i32 = 1;

pub const CREATE_TABLES: &str = r#"
-- Nyckel-värde-lager (en rad per samling + visningsvaluta)
CREATE TABLE IF NOT EXISTS kv_entries (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Dokument (bloblager)
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0,
    mime_type TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    payload BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_name ON documents(name);

-- Migrationshistorik
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Nyckel för vald visningsvaluta
pub const DISPLAY_CURRENCY_KEY: &str = "display_currency";
