//! SQLite-backed announcement store.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Announcement, ContentError, ContentStore, CreateAnnouncementRequest,
    UpdateAnnouncementRequest,
};

/// SQLite-backed announcement store.
pub struct SqliteContentStore {
    conn: Mutex<Connection>,
}

impl SqliteContentStore {
    /// Create a new SQLite content store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ContentError> {
        let conn = Connection::open(path).map_err(|e| ContentError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite content store (useful for testing).
    pub fn in_memory() -> Result<Self, ContentError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ContentError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ContentError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS announcements (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_announcements_published ON announcements(published);
            "#,
        )
        .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_announcement(row: &rusqlite::Row) -> rusqlite::Result<Announcement> {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let body: String = row.get(2)?;
        let published: i64 = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        Ok(Announcement {
            id,
            title,
            body,
            published: published != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<Announcement>, ContentError> {
        conn.query_row(
            "SELECT id, title, body, published, created_at, updated_at FROM announcements WHERE id = ?",
            params![id],
            Self::row_to_announcement,
        )
        .optional()
        .map_err(|e| ContentError::Database(e.to_string()))
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl ContentStore for SqliteContentStore {
    fn create(&self, request: CreateAnnouncementRequest) -> Result<Announcement, ContentError> {
        request.validate()?;

        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO announcements (id, title, body, published, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                id,
                request.title.trim(),
                request.body.trim(),
                request.published as i64,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(Announcement {
            id,
            title: request.title.trim().to_string(),
            body: request.body.trim().to_string(),
            published: request.published,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Announcement>, ContentError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch(&conn, id)
    }

    fn list(&self, published_only: bool) -> Result<Vec<Announcement>, ContentError> {
        let conn = self.conn.lock().unwrap();

        let sql = if published_only {
            "SELECT id, title, body, published, created_at, updated_at FROM announcements WHERE published = 1 ORDER BY created_at DESC"
        } else {
            "SELECT id, title, body, published, created_at, updated_at FROM announcements ORDER BY created_at DESC"
        };

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ContentError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_announcement)
            .map_err(|e| ContentError::Database(e.to_string()))?;

        let mut announcements = Vec::new();
        for row_result in rows {
            announcements.push(row_result.map_err(|e| ContentError::Database(e.to_string()))?);
        }

        Ok(announcements)
    }

    fn update(
        &self,
        id: &str,
        request: UpdateAnnouncementRequest,
    ) -> Result<Announcement, ContentError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch(&conn, id)?
            .ok_or_else(|| ContentError::NotFound(format!("Announcement not found: {}", id)))?;

        let title = request.title.unwrap_or_else(|| current.title.clone());
        let body = request.body.unwrap_or_else(|| current.body.clone());
        let published = request.published.unwrap_or(current.published);

        if title.trim().is_empty() {
            return Err(ContentError::Validation("title cannot be empty".to_string()));
        }
        if body.trim().is_empty() {
            return Err(ContentError::Validation("body cannot be empty".to_string()));
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE announcements SET title = ?, body = ?, published = ?, updated_at = ? WHERE id = ?",
            params![
                title.trim(),
                body.trim(),
                published as i64,
                now.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(Announcement {
            title: title.trim().to_string(),
            body: body.trim().to_string(),
            published,
            updated_at: now,
            ..current
        })
    }

    fn delete(&self, id: &str) -> Result<Announcement, ContentError> {
        let conn = self.conn.lock().unwrap();

        let announcement = Self::fetch(&conn, id)?
            .ok_or_else(|| ContentError::NotFound(format!("Announcement not found: {}", id)))?;

        conn.execute("DELETE FROM announcements WHERE id = ?", params![id])
            .map_err(|e| ContentError::Database(e.to_string()))?;

        Ok(announcement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteContentStore {
        SqliteContentStore::in_memory().unwrap()
    }

    fn create_request(title: &str, published: bool) -> CreateAnnouncementRequest {
        CreateAnnouncementRequest {
            title: title.to_string(),
            body: "Details inside.".to_string(),
            published,
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = create_test_store();
        let created = store.create(create_request("Welcome", true)).unwrap();

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Welcome");
        assert!(fetched.published);
    }

    #[test]
    fn test_create_empty_title_rejected() {
        let store = create_test_store();
        let result = store.create(create_request(" ", true));
        assert!(matches!(result, Err(ContentError::Validation(_))));
    }

    #[test]
    fn test_list_published_only_hides_drafts() {
        let store = create_test_store();
        store.create(create_request("Published", true)).unwrap();
        store.create(create_request("Draft", false)).unwrap();

        let published = store.list(true).unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "Published");

        let all = store.list(false).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_update_publish_flag() {
        let store = create_test_store();
        let draft = store.create(create_request("Draft", false)).unwrap();

        let updated = store
            .update(
                &draft.id,
                UpdateAnnouncementRequest {
                    published: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(updated.published);
        assert_eq!(updated.title, "Draft");
    }

    #[test]
    fn test_update_missing_announcement() {
        let store = create_test_store();
        let result = store.update("missing", UpdateAnnouncementRequest::default());
        assert!(matches!(result, Err(ContentError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let store = create_test_store();
        let announcement = store.create(create_request("Gone soon", true)).unwrap();

        store.delete(&announcement.id).unwrap();
        assert!(store.get(&announcement.id).unwrap().is_none());
    }
}
