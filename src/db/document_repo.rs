use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::models::{Document, DocumentInfo, NewDocument};
use crate::utils::AppResult;

/// Bloblager för uppladdade dokument, adresserat via autoinkrementerat id
pub struct DocumentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Lägg till filer i en transaktion, returnerar nya id:n i samma ordning
    pub fn add(&self, files: Vec<NewDocument>) -> AppResult<Vec<i64>> {
        let mut conn = lock(&self.conn);
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(files.len());

        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (name, size, mime_type, created_at, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for file in files {
                let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
                stmt.execute(params![
                    file.name,
                    file.size,
                    file.mime_type,
                    created_at,
                    file.payload,
                ])?;
                ids.push(tx.last_insert_rowid());
            }
        }

        tx.commit()?;
        tracing::info!("Lade till {} dokument", ids.len());

        Ok(ids)
    }

    /// Hämta metadata för alla dokument, äldst först
    pub fn list_all(&self) -> AppResult<Vec<DocumentInfo>> {
        let conn = lock(&self.conn);
        let mut stmt = conn.prepare(
            "SELECT id, name, size, mime_type, created_at
             FROM documents ORDER BY id",
        )?;

        let docs = stmt
            .query_map([], Self::row_to_info)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(docs)
    }

    /// Hämta dokument med innehåll
    pub fn fetch(&self, id: i64) -> AppResult<Option<Document>> {
        let conn = lock(&self.conn);
        let doc = conn
            .query_row(
                "SELECT id, name, size, mime_type, created_at, payload
                 FROM documents WHERE id = ?",
                [id],
                |row| {
                    Ok(Document {
                        info: Self::row_to_info(row)?,
                        payload: row.get(5)?,
                    })
                },
            )
            .optional()?;

        Ok(doc)
    }

    /// Hämta metadata för ett dokument
    pub fn find_by_id(&self, id: i64) -> AppResult<Option<DocumentInfo>> {
        let conn = lock(&self.conn);
        let info = conn
            .query_row(
                "SELECT id, name, size, mime_type, created_at
                 FROM documents WHERE id = ?",
                [id],
                Self::row_to_info,
            )
            .optional()?;

        Ok(info)
    }

    /// Ta bort dokument; saknat id är en no-op
    pub fn delete(&self, id: i64) -> AppResult<bool> {
        let conn = lock(&self.conn);
        let rows = conn.execute("DELETE FROM documents WHERE id = ?", [id])?;
        if rows > 0 {
            tracing::info!("Tog bort dokument {}", id);
        }
        Ok(rows > 0)
    }

    /// Räkna totalt antal dokument
    pub fn count(&self) -> AppResult<i64> {
        let conn = lock(&self.conn);
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Beräkna total filstorlek
    pub fn total_size(&self) -> AppResult<i64> {
        let conn = lock(&self.conn);
        let size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size), 0) FROM documents",
            [],
            |row| row.get(0),
        )?;
        Ok(size)
    }

    fn row_to_info(row: &Row) -> rusqlite::Result<DocumentInfo> {
        Ok(DocumentInfo {
            id: row.get(0)?,
            name: row.get(1)?,
            size: row.get(2)?,
            mime_type: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::NewDocument;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_add_assigns_increasing_ids() {
        let db = setup_db();
        let repo = db.documents();

        let ids = repo
            .add(vec![
                NewDocument::from_filename("bail.pdf", b"%PDF-1.4".to_vec()),
                NewDocument::from_filename("photo.jpg", vec![0xff, 0xd8]),
            ])
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, ids[0]);
        assert_eq!(all[0].name, "bail.pdf");
        assert_eq!(all[1].mime_type, "image/jpeg");
        assert!(!all[0].created_at.is_empty());
    }

    #[test]
    fn test_delete_leaves_other_documents() {
        let db = setup_db();
        let repo = db.documents();

        let ids = repo
            .add(vec![
                NewDocument::from_filename("f1.txt", b"un".to_vec()),
                NewDocument::from_filename("f2.txt", b"deux".to_vec()),
            ])
            .unwrap();

        assert!(repo.delete(ids[0]).unwrap());

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, ids[1]);
        assert_eq!(all[0].name, "f2.txt");
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let db = setup_db();
        assert!(!db.documents().delete(42).unwrap());
    }

    #[test]
    fn test_fetch_after_delete_is_none() {
        let db = setup_db();
        let repo = db.documents();

        let ids = repo
            .add(vec![NewDocument::from_filename("f.txt", b"contenu".to_vec())])
            .unwrap();

        let doc = repo.fetch(ids[0]).unwrap().unwrap();
        assert_eq!(doc.payload, b"contenu");
        assert_eq!(doc.info.size, 7);

        repo.delete(ids[0]).unwrap();
        assert!(repo.fetch(ids[0]).unwrap().is_none());
        assert!(repo.find_by_id(ids[0]).unwrap().is_none());
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let db = setup_db();
        let repo = db.documents();

        let first = repo.add(vec![NewDocument::from_filename("a.txt", vec![1])]).unwrap();
        repo.delete(first[0]).unwrap();
        let second = repo.add(vec![NewDocument::from_filename("b.txt", vec![2])]).unwrap();

        assert!(second[0] > first[0]);
    }

    #[test]
    fn test_count_and_total_size() {
        let db = setup_db();
        let repo = db.documents();

        repo.add(vec![
            NewDocument::from_filename("a.txt", vec![0; 10]),
            NewDocument::from_filename("b.txt", vec![0; 32]),
        ])
        .unwrap();

        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.total_size().unwrap(), 42);
    }
}
