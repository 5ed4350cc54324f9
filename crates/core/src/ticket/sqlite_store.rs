//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::auth::Role;
use crate::metrics::TICKET_TRANSITIONS_TOTAL;

use super::{
    AppendedMessage, CreateTicketRequest, Ticket, TicketError, TicketFilter, TicketMessage,
    TicketPriority, TicketStatus, TicketStore, TicketTransition,
};

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                applicant_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                assigned_to TEXT,
                category TEXT,
                is_offline INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_applicant ON tickets(applicant_id);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            CREATE INDEX IF NOT EXISTS idx_tickets_assigned ON tickets(assigned_to);

            CREATE TABLE IF NOT EXISTS ticket_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticket_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                sender_role TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ticket_messages_ticket ON ticket_messages(ticket_id);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        if let Some(ref applicant_id) = filter.applicant_id {
            conditions.push("applicant_id = ?");
            params.push(Box::new(applicant_id.clone()));
        }

        if let Some(ref assigned_to) = filter.assigned_to {
            conditions.push("assigned_to = ?");
            params.push(Box::new(assigned_to.clone()));
        }

        if let Some(is_offline) = filter.is_offline {
            conditions.push("is_offline = ?");
            params.push(Box::new(is_offline as i64));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let applicant_id: String = row.get(1)?;
        let subject: String = row.get(2)?;
        let status_str: String = row.get(3)?;
        let priority_str: String = row.get(4)?;
        let assigned_to: Option<String> = row.get(5)?;
        let category: Option<String> = row.get(6)?;
        let is_offline: i64 = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        Ok(Ticket {
            id,
            applicant_id,
            subject,
            status: TicketStatus::parse(&status_str).unwrap_or(TicketStatus::Open),
            priority: TicketPriority::parse(&priority_str).unwrap_or_default(),
            assigned_to,
            category,
            is_offline: is_offline != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<TicketMessage> {
        let id: i64 = row.get(0)?;
        let ticket_id: String = row.get(1)?;
        let sender_id: String = row.get(2)?;
        let sender_role_str: String = row.get(3)?;
        let body: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;

        Ok(TicketMessage {
            id,
            ticket_id,
            sender_id,
            sender_role: Role::from_str(&sender_role_str).unwrap_or(Role::Applicant),
            body,
            created_at: parse_timestamp(&created_at_str),
        })
    }

    fn fetch_ticket(conn: &Connection, id: &str) -> Result<Option<Ticket>, TicketError> {
        conn.query_row(
            "SELECT id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at FROM tickets WHERE id = ?",
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        if request.subject.trim().is_empty() {
            return Err(TicketError::Validation("subject cannot be empty".to_string()));
        }
        if request.message.trim().is_empty() {
            return Err(TicketError::Validation("message cannot be empty".to_string()));
        }

        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let status = TicketStatus::Open;
        let priority = TicketPriority::Low;

        tx.execute(
            "INSERT INTO tickets (id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at) VALUES (?, ?, ?, ?, ?, NULL, ?, ?, ?, ?)",
            params![
                id,
                request.applicant_id,
                request.subject.trim(),
                status.as_str(),
                priority.as_str(),
                request.category,
                request.is_offline as i64,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO ticket_messages (ticket_id, sender_id, sender_role, body, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                request.applicant_id,
                Role::Applicant.as_str(),
                request.message.trim(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id,
            applicant_id: request.applicant_id,
            subject: request.subject.trim().to_string(),
            status,
            priority,
            assigned_to: None,
            category: request.category,
            is_offline: request.is_offline,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_ticket(&conn, id)
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at FROM tickets {} ORDER BY created_at ASC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            tickets.push(row_result.map_err(|e| TicketError::Database(e.to_string()))?);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    fn messages(&self, ticket_id: &str) -> Result<Vec<TicketMessage>, TicketError> {
        let conn = self.conn.lock().unwrap();

        // Ticket must exist before we return an empty thread.
        if Self::fetch_ticket(&conn, ticket_id)?.is_none() {
            return Err(TicketError::NotFound(ticket_id.to_string()));
        }

        let mut stmt = conn
            .prepare(
                "SELECT id, ticket_id, sender_id, sender_role, body, created_at FROM ticket_messages WHERE ticket_id = ? ORDER BY id ASC",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![ticket_id], Self::row_to_message)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut messages = Vec::new();
        for row_result in rows {
            messages.push(row_result.map_err(|e| TicketError::Database(e.to_string()))?);
        }

        Ok(messages)
    }

    fn add_message(
        &self,
        ticket_id: &str,
        sender_id: &str,
        sender_role: Role,
        body: &str,
    ) -> Result<AppendedMessage, TicketError> {
        if body.trim().is_empty() {
            return Err(TicketError::Validation("message cannot be empty".to_string()));
        }

        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let ticket = tx
            .query_row(
                "SELECT id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at FROM tickets WHERE id = ?",
                params![ticket_id],
                Self::row_to_ticket,
            )
            .optional()
            .map_err(|e| TicketError::Database(e.to_string()))?
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))?;

        let now = Utc::now();

        tx.execute(
            "INSERT INTO ticket_messages (ticket_id, sender_id, sender_role, body, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                ticket_id,
                sender_id,
                sender_role.as_str(),
                body.trim(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        let message_id = tx.last_insert_rowid();

        // A staff reply on a closed ticket fires the reopen transition.
        // No other append changes status.
        let mut new_status = ticket.status;
        let mut reopened = false;
        if ticket.status.is_closed() && sender_role.is_staff() {
            if let Some(status) = TicketTransition::ReopenOnStaffReply.apply(ticket.status) {
                new_status = status;
                reopened = true;
            }
        }

        tx.execute(
            "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?",
            params![new_status.as_str(), now.to_rfc3339(), ticket_id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if reopened {
            TICKET_TRANSITIONS_TOTAL
                .with_label_values(&[ticket.status.as_str(), new_status.as_str()])
                .inc();
        }

        Ok(AppendedMessage {
            ticket: Ticket {
                status: new_status,
                updated_at: now,
                ..ticket
            },
            message: TicketMessage {
                id: message_id,
                ticket_id: ticket_id.to_string(),
                sender_id: sender_id.to_string(),
                sender_role,
                body: body.trim().to_string(),
                created_at: now,
            },
            reopened,
        })
    }

    fn update_status(&self, id: &str, new_status: TicketStatus) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let ticket = Self::fetch_ticket(&conn, id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        if ticket.status.transition_to(new_status).is_none() {
            return Err(TicketError::InvalidTransition {
                ticket_id: id.to_string(),
                from: ticket.status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?",
            params![new_status.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        TICKET_TRANSITIONS_TOTAL
            .with_label_values(&[ticket.status.as_str(), new_status.as_str()])
            .inc();

        Ok(Ticket {
            status: new_status,
            updated_at: now,
            ..ticket
        })
    }

    fn set_priority(&self, id: &str, priority: TicketPriority) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let ticket = Self::fetch_ticket(&conn, id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        let now = Utc::now();
        conn.execute(
            "UPDATE tickets SET priority = ?, updated_at = ? WHERE id = ?",
            params![priority.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            priority,
            updated_at: now,
            ..ticket
        })
    }

    fn assign(&self, id: &str, operator_id: Option<&str>) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let ticket = Self::fetch_ticket(&conn, id)?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        // Assigning an operator starts an open ticket. Clearing the
        // operator intentionally leaves the status alone so triage
        // history is preserved.
        let new_status = match (operator_id, ticket.status) {
            (Some(_), TicketStatus::Open) => TicketStatus::InProgress,
            _ => ticket.status,
        };

        let now = Utc::now();
        conn.execute(
            "UPDATE tickets SET assigned_to = ?, status = ?, updated_at = ? WHERE id = ?",
            params![operator_id, new_status.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        if new_status != ticket.status {
            TICKET_TRANSITIONS_TOTAL
                .with_label_values(&[ticket.status.as_str(), new_status.as_str()])
                .inc();
        }

        Ok(Ticket {
            assigned_to: operator_id.map(String::from),
            status: new_status,
            updated_at: now,
            ..ticket
        })
    }

    fn list_balanceable(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at FROM tickets WHERE status != 'closed' ORDER BY created_at ASC, id ASC",
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            tickets.push(row_result.map_err(|e| TicketError::Database(e.to_string()))?);
        }

        Ok(tickets)
    }

    fn delete(&self, id: &str) -> Result<Ticket, TicketError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let ticket = tx
            .query_row(
                "SELECT id, applicant_id, subject, status, priority, assigned_to, category, is_offline, created_at, updated_at FROM tickets WHERE id = ?",
                params![id],
                Self::row_to_ticket,
            )
            .optional()
            .map_err(|e| TicketError::Database(e.to_string()))?
            .ok_or_else(|| TicketError::NotFound(id.to_string()))?;

        tx.execute("DELETE FROM ticket_messages WHERE ticket_id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;
        tx.execute("DELETE FROM tickets WHERE id = ?", params![id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(ticket)
    }

    fn delete_by_applicant(&self, applicant_id: &str) -> Result<u32, TicketError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.execute(
            "DELETE FROM ticket_messages WHERE ticket_id IN (SELECT id FROM tickets WHERE applicant_id = ?)",
            params![applicant_id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        let removed = tx
            .execute("DELETE FROM tickets WHERE applicant_id = ?", params![applicant_id])
            .map_err(|e| TicketError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(removed as u32)
    }
}
