//! SQLite-backed queue store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::metrics::QUEUE_TRANSITIONS_TOTAL;

use super::{
    CreateQueueTicketRequest, QueueError, QueueFilter, QueueStatus, QueueStore, QueueTicket,
};

/// SQLite-backed queue store.
pub struct SqliteQueueStore {
    conn: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Create a new SQLite queue store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, QueueError> {
        let conn = Connection::open(path).map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite queue store (useful for testing).
    pub fn in_memory() -> Result<Self, QueueError> {
        let conn = Connection::open_in_memory().map_err(|e| QueueError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), QueueError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS queue_tickets (
                id TEXT PRIMARY KEY,
                applicant_id TEXT NOT NULL,
                queue_number INTEGER NOT NULL,
                category_id TEXT NOT NULL,
                status TEXT NOT NULL,
                counter_id TEXT,
                operator_id TEXT,
                served_at TEXT,
                completed_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_queue_tickets_status ON queue_tickets(status);
            CREATE INDEX IF NOT EXISTS idx_queue_tickets_counter ON queue_tickets(counter_id);
            CREATE INDEX IF NOT EXISTS idx_queue_tickets_created_at ON queue_tickets(created_at);
            "#,
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &QueueFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(ref counter_id) = filter.counter_id {
            conditions.push("counter_id = ?");
            params.push(Box::new(counter_id.clone()));
        }

        if let Some(ref applicant_id) = filter.applicant_id {
            conditions.push("applicant_id = ?");
            params.push(Box::new(applicant_id.clone()));
        }

        if filter.today_only {
            conditions.push("date(created_at) = date(?)");
            params.push(Box::new(Utc::now().to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<QueueTicket> {
        let id: String = row.get(0)?;
        let applicant_id: String = row.get(1)?;
        let queue_number: u32 = row.get(2)?;
        let category_id: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let counter_id: Option<String> = row.get(5)?;
        let operator_id: Option<String> = row.get(6)?;
        let served_at_str: Option<String> = row.get(7)?;
        let completed_at_str: Option<String> = row.get(8)?;
        let created_at_str: String = row.get(9)?;
        let updated_at_str: String = row.get(10)?;

        Ok(QueueTicket {
            id,
            applicant_id,
            queue_number,
            category_id,
            status: QueueStatus::parse(&status_str).unwrap_or(QueueStatus::Waiting),
            counter_id,
            operator_id,
            served_at: served_at_str.as_deref().map(parse_timestamp),
            completed_at: completed_at_str.as_deref().map(parse_timestamp),
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn fetch_ticket(conn: &Connection, id: &str) -> Result<Option<QueueTicket>, QueueError> {
        conn.query_row(
            "SELECT id, applicant_id, queue_number, category_id, status, counter_id, operator_id, served_at, completed_at, created_at, updated_at FROM queue_tickets WHERE id = ?",
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| QueueError::Database(e.to_string()))
    }

    /// Shared guard for the simple single-edge transitions.
    fn transition(
        &self,
        id: &str,
        expected: &[QueueStatus],
        target: QueueStatus,
        stamp_completed: bool,
    ) -> Result<QueueTicket, QueueError> {
        let conn = self.conn.lock().unwrap();

        let ticket = Self::fetch_ticket(&conn, id)?
            .ok_or_else(|| QueueError::NotFound(format!("Queue ticket not found: {}", id)))?;

        if !expected.contains(&ticket.status) {
            return Err(QueueError::InvalidTransition(format!(
                "cannot move ticket {} from {} to {}",
                id, ticket.status, target
            )));
        }

        let now = Utc::now();
        let completed_at = if stamp_completed {
            Some(now)
        } else {
            ticket.completed_at
        };

        conn.execute(
            "UPDATE queue_tickets SET status = ?, completed_at = ?, updated_at = ? WHERE id = ?",
            params![
                target.as_str(),
                completed_at.map(|dt| dt.to_rfc3339()),
                now.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        QUEUE_TRANSITIONS_TOTAL
            .with_label_values(&[target.as_str()])
            .inc();

        Ok(QueueTicket {
            status: target,
            completed_at,
            updated_at: now,
            ..ticket
        })
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl QueueStore for SqliteQueueStore {
    fn create(&self, request: CreateQueueTicketRequest) -> Result<QueueTicket, QueueError> {
        request.validate()?;

        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let now = Utc::now();

        // Next position for today; the counter resets each calendar day.
        let queue_number: u32 = tx
            .query_row(
                "SELECT COALESCE(MAX(queue_number), 0) + 1 FROM queue_tickets WHERE date(created_at) = date(?)",
                params![now.to_rfc3339()],
                |row| row.get(0),
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();

        tx.execute(
            "INSERT INTO queue_tickets (id, applicant_id, queue_number, category_id, status, counter_id, operator_id, served_at, completed_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, NULL, NULL, NULL, NULL, ?, ?)",
            params![
                id,
                request.applicant_id.trim(),
                queue_number,
                request.category_id.trim(),
                QueueStatus::Waiting.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        tx.commit().map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(QueueTicket {
            id,
            applicant_id: request.applicant_id.trim().to_string(),
            queue_number,
            category_id: request.category_id.trim().to_string(),
            status: QueueStatus::Waiting,
            counter_id: None,
            operator_id: None,
            served_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<QueueTicket>, QueueError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_ticket(&conn, id)
    }

    fn list(&self, filter: &QueueFilter) -> Result<Vec<QueueTicket>, QueueError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, applicant_id, queue_number, category_id, status, counter_id, operator_id, served_at, completed_at, created_at, updated_at FROM queue_tickets {} ORDER BY created_at ASC, queue_number ASC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            tickets.push(row_result.map_err(|e| QueueError::Database(e.to_string()))?);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &QueueFilter) -> Result<i64, QueueError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM queue_tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| QueueError::Database(e.to_string()))
    }

    fn call_next(&self, counter_id: &str, operator_id: &str) -> Result<QueueTicket, QueueError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        // One ticket per counter: the busy check happens in the same
        // transaction that claims the next ticket.
        let busy: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM queue_tickets WHERE counter_id = ? AND status IN ('called', 'serving')",
                params![counter_id],
                |row| row.get(0),
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if busy > 0 {
            return Err(QueueError::InvalidTransition(format!(
                "counter {} already has a ticket being served",
                counter_id
            )));
        }

        // Oldest waiting ticket, FIFO by creation time.
        let next = tx
            .query_row(
                "SELECT id, applicant_id, queue_number, category_id, status, counter_id, operator_id, served_at, completed_at, created_at, updated_at FROM queue_tickets WHERE status = 'waiting' ORDER BY created_at ASC, queue_number ASC LIMIT 1",
                [],
                Self::row_to_ticket,
            )
            .optional()
            .map_err(|e| QueueError::Database(e.to_string()))?;

        let ticket =
            next.ok_or_else(|| QueueError::NotFound("no waiting tickets in the queue".to_string()))?;

        let now = Utc::now();
        let changed = tx
            .execute(
                "UPDATE queue_tickets SET status = 'called', counter_id = ?, operator_id = ?, served_at = ?, updated_at = ? WHERE id = ? AND status = 'waiting'",
                params![
                    counter_id,
                    operator_id,
                    now.to_rfc3339(),
                    now.to_rfc3339(),
                    ticket.id,
                ],
            )
            .map_err(|e| QueueError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(QueueError::InvalidTransition(format!(
                "ticket {} is no longer waiting",
                ticket.id
            )));
        }

        tx.commit().map_err(|e| QueueError::Database(e.to_string()))?;

        QUEUE_TRANSITIONS_TOTAL
            .with_label_values(&[QueueStatus::Called.as_str()])
            .inc();

        Ok(QueueTicket {
            status: QueueStatus::Called,
            counter_id: Some(counter_id.to_string()),
            operator_id: Some(operator_id.to_string()),
            served_at: Some(now),
            updated_at: now,
            ..ticket
        })
    }

    fn recall(&self, id: &str) -> Result<QueueTicket, QueueError> {
        let conn = self.conn.lock().unwrap();

        let ticket = Self::fetch_ticket(&conn, id)?
            .ok_or_else(|| QueueError::NotFound(format!("Queue ticket not found: {}", id)))?;

        if !ticket.status.is_at_counter() {
            return Err(QueueError::InvalidTransition(format!(
                "cannot recall ticket {} with status {}",
                id, ticket.status
            )));
        }

        // Only the timestamp moves; the status stays put.
        let now = Utc::now();
        conn.execute(
            "UPDATE queue_tickets SET updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), id],
        )
        .map_err(|e| QueueError::Database(e.to_string()))?;

        Ok(QueueTicket {
            updated_at: now,
            ..ticket
        })
    }

    fn start_serving(&self, id: &str) -> Result<QueueTicket, QueueError> {
        self.transition(id, &[QueueStatus::Called], QueueStatus::Serving, false)
    }

    fn complete(&self, id: &str) -> Result<QueueTicket, QueueError> {
        self.transition(id, &[QueueStatus::Serving], QueueStatus::Completed, true)
    }

    fn skip(&self, id: &str) -> Result<QueueTicket, QueueError> {
        self.transition(
            id,
            &[QueueStatus::Called, QueueStatus::Serving],
            QueueStatus::Skipped,
            true,
        )
    }
}
