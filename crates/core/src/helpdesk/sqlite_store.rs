//! SQLite-backed helpdesk store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Counter, CreateOperatorRequest, HelpdeskError, HelpdeskStore, Operator, OperatorFilter,
    UpdateCounterRequest, UpdateOperatorRequest,
};

/// SQLite-backed helpdesk store.
pub struct SqliteHelpdeskStore {
    conn: Mutex<Connection>,
}

impl SqliteHelpdeskStore {
    /// Create a new SQLite helpdesk store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, HelpdeskError> {
        let conn = Connection::open(path).map_err(|e| HelpdeskError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite helpdesk store (useful for testing).
    pub fn in_memory() -> Result<Self, HelpdeskError> {
        let conn =
            Connection::open_in_memory().map_err(|e| HelpdeskError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HelpdeskError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS operators (
                user_id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                is_offline INTEGER NOT NULL DEFAULT 0,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS counters (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                operator_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_counters_operator ON counters(operator_id);
            "#,
        )
        .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_operator(row: &rusqlite::Row) -> rusqlite::Result<Operator> {
        let user_id: String = row.get(0)?;
        let display_name: String = row.get(1)?;
        let is_offline: i64 = row.get(2)?;
        let is_active: i64 = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        Ok(Operator {
            user_id,
            display_name,
            is_offline: is_offline != 0,
            is_active: is_active != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn row_to_counter(row: &rusqlite::Row) -> rusqlite::Result<Counter> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let is_active: i64 = row.get(2)?;
        let operator_id: Option<String> = row.get(3)?;
        let created_at_str: String = row.get(4)?;
        let updated_at_str: String = row.get(5)?;

        Ok(Counter {
            id,
            name,
            is_active: is_active != 0,
            operator_id,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn fetch_operator(
        conn: &Connection,
        user_id: &str,
    ) -> Result<Option<Operator>, HelpdeskError> {
        conn.query_row(
            "SELECT user_id, display_name, is_offline, is_active, created_at, updated_at FROM operators WHERE user_id = ?",
            params![user_id],
            Self::row_to_operator,
        )
        .optional()
        .map_err(|e| HelpdeskError::Database(e.to_string()))
    }

    fn fetch_counter(conn: &Connection, id: &str) -> Result<Option<Counter>, HelpdeskError> {
        conn.query_row(
            "SELECT id, name, is_active, operator_id, created_at, updated_at FROM counters WHERE id = ?",
            params![id],
            Self::row_to_counter,
        )
        .optional()
        .map_err(|e| HelpdeskError::Database(e.to_string()))
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl HelpdeskStore for SqliteHelpdeskStore {
    fn create_operator(&self, request: CreateOperatorRequest) -> Result<Operator, HelpdeskError> {
        request.validate()?;

        let conn = self.conn.lock().unwrap();
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO operators (user_id, display_name, is_offline, is_active, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
            params![
                request.user_id.trim(),
                request.display_name.trim(),
                request.is_offline as i64,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(Operator {
                user_id: request.user_id.trim().to_string(),
                display_name: request.display_name.trim().to_string(),
                is_offline: request.is_offline,
                is_active: true,
                created_at: now,
                updated_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(HelpdeskError::Validation(format!(
                    "operator already registered: {}",
                    request.user_id.trim()
                )))
            }
            Err(e) => Err(HelpdeskError::Database(e.to_string())),
        }
    }

    fn get_operator(&self, user_id: &str) -> Result<Option<Operator>, HelpdeskError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_operator(&conn, user_id)
    }

    fn list_operators(&self, filter: &OperatorFilter) -> Result<Vec<Operator>, HelpdeskError> {
        let conn = self.conn.lock().unwrap();

        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if filter.active_only {
            conditions.push("is_active = 1");
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

        let sql = format!(
            "SELECT user_id, display_name, is_offline, is_active, created_at, updated_at FROM operators {} ORDER BY created_at ASC, user_id ASC",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_operator)
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let mut operators = Vec::new();
        for row_result in rows {
            operators.push(row_result.map_err(|e| HelpdeskError::Database(e.to_string()))?);
        }

        Ok(operators)
    }

    fn update_operator(
        &self,
        user_id: &str,
        request: UpdateOperatorRequest,
    ) -> Result<Operator, HelpdeskError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let current = tx
            .query_row(
                "SELECT user_id, display_name, is_offline, is_active, created_at, updated_at FROM operators WHERE user_id = ?",
                params![user_id],
                Self::row_to_operator,
            )
            .optional()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?
            .ok_or_else(|| HelpdeskError::NotFound(format!("Operator not found: {}", user_id)))?;

        let display_name = request
            .display_name
            .unwrap_or_else(|| current.display_name.clone());
        let is_offline = request.is_offline.unwrap_or(current.is_offline);
        let is_active = request.is_active.unwrap_or(current.is_active);

        if display_name.trim().is_empty() {
            return Err(HelpdeskError::Validation(
                "display_name cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        tx.execute(
            "UPDATE operators SET display_name = ?, is_offline = ?, is_active = ?, updated_at = ? WHERE user_id = ?",
            params![
                display_name.trim(),
                is_offline as i64,
                is_active as i64,
                now.to_rfc3339(),
                user_id,
            ],
        )
        .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        // Deactivated or reassigned-to-online operators cannot keep a counter.
        if !is_active || !is_offline {
            tx.execute(
                "UPDATE counters SET operator_id = NULL, updated_at = ? WHERE operator_id = ?",
                params![now.to_rfc3339(), user_id],
            )
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(Operator {
            display_name: display_name.trim().to_string(),
            is_offline,
            is_active,
            updated_at: now,
            ..current
        })
    }

    fn create_counter(&self, name: &str) -> Result<Counter, HelpdeskError> {
        if name.trim().is_empty() {
            return Err(HelpdeskError::Validation(
                "counter name cannot be empty".to_string(),
            ));
        }

        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO counters (id, name, is_active, operator_id, created_at, updated_at) VALUES (?, ?, 1, NULL, ?, ?)",
            params![id, name.trim(), now.to_rfc3339(), now.to_rfc3339()],
        )
        .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(Counter {
            id,
            name: name.trim().to_string(),
            is_active: true,
            operator_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_counter(&self, id: &str) -> Result<Option<Counter>, HelpdeskError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_counter(&conn, id)
    }

    fn list_counters(&self) -> Result<Vec<Counter>, HelpdeskError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, is_active, operator_id, created_at, updated_at FROM counters ORDER BY created_at ASC, name ASC",
            )
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_counter)
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let mut counters = Vec::new();
        for row_result in rows {
            counters.push(row_result.map_err(|e| HelpdeskError::Database(e.to_string()))?);
        }

        Ok(counters)
    }

    fn update_counter(
        &self,
        id: &str,
        request: UpdateCounterRequest,
    ) -> Result<Counter, HelpdeskError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch_counter(&conn, id)?
            .ok_or_else(|| HelpdeskError::NotFound(format!("Counter not found: {}", id)))?;

        let name = request.name.unwrap_or_else(|| current.name.clone());
        let is_active = request.is_active.unwrap_or(current.is_active);

        if name.trim().is_empty() {
            return Err(HelpdeskError::Validation(
                "counter name cannot be empty".to_string(),
            ));
        }

        // Deactivating a counter releases its operator.
        let operator_id = if is_active {
            current.operator_id.clone()
        } else {
            None
        };

        let now = Utc::now();
        conn.execute(
            "UPDATE counters SET name = ?, is_active = ?, operator_id = ?, updated_at = ? WHERE id = ?",
            params![
                name.trim(),
                is_active as i64,
                operator_id,
                now.to_rfc3339(),
                id,
            ],
        )
        .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(Counter {
            name: name.trim().to_string(),
            is_active,
            operator_id,
            updated_at: now,
            ..current
        })
    }

    fn delete_counter(&self, id: &str) -> Result<Counter, HelpdeskError> {
        let conn = self.conn.lock().unwrap();

        let counter = Self::fetch_counter(&conn, id)?
            .ok_or_else(|| HelpdeskError::NotFound(format!("Counter not found: {}", id)))?;

        conn.execute("DELETE FROM counters WHERE id = ?", params![id])
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(counter)
    }

    fn attach_operator(
        &self,
        counter_id: &str,
        operator_id: Option<&str>,
    ) -> Result<Counter, HelpdeskError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        let counter = tx
            .query_row(
                "SELECT id, name, is_active, operator_id, created_at, updated_at FROM counters WHERE id = ?",
                params![counter_id],
                Self::row_to_counter,
            )
            .optional()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?
            .ok_or_else(|| HelpdeskError::NotFound(format!("Counter not found: {}", counter_id)))?;

        let now = Utc::now();

        if let Some(operator_id) = operator_id {
            let operator = tx
                .query_row(
                    "SELECT user_id, display_name, is_offline, is_active, created_at, updated_at FROM operators WHERE user_id = ?",
                    params![operator_id],
                    Self::row_to_operator,
                )
                .optional()
                .map_err(|e| HelpdeskError::Database(e.to_string()))?
                .ok_or_else(|| {
                    HelpdeskError::NotFound(format!("Operator not found: {}", operator_id))
                })?;

            if !operator.is_active {
                return Err(HelpdeskError::Validation(format!(
                    "operator {} is not active",
                    operator_id
                )));
            }
            if !operator.is_offline {
                return Err(HelpdeskError::Validation(format!(
                    "operator {} is not on walk-in duty",
                    operator_id
                )));
            }
            if !counter.is_active {
                return Err(HelpdeskError::Validation(format!(
                    "counter {} is not active",
                    counter_id
                )));
            }

            // One counter per operator: release any previous binding.
            tx.execute(
                "UPDATE counters SET operator_id = NULL, updated_at = ? WHERE operator_id = ? AND id != ?",
                params![now.to_rfc3339(), operator_id, counter_id],
            )
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;
        }

        tx.execute(
            "UPDATE counters SET operator_id = ?, updated_at = ? WHERE id = ?",
            params![operator_id, now.to_rfc3339(), counter_id],
        )
        .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| HelpdeskError::Database(e.to_string()))?;

        Ok(Counter {
            operator_id: operator_id.map(String::from),
            updated_at: now,
            ..counter
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteHelpdeskStore {
        SqliteHelpdeskStore::in_memory().unwrap()
    }

    fn operator_request(user_id: &str, is_offline: bool) -> CreateOperatorRequest {
        CreateOperatorRequest {
            user_id: user_id.to_string(),
            display_name: format!("Operator {}", user_id),
            is_offline,
        }
    }

    #[test]
    fn test_create_operator() {
        let store = create_test_store();
        let operator = store.create_operator(operator_request("op-1", false)).unwrap();

        assert_eq!(operator.user_id, "op-1");
        assert!(operator.is_active);
        assert!(!operator.is_offline);
    }

    #[test]
    fn test_create_duplicate_operator_rejected() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", false)).unwrap();

        let result = store.create_operator(operator_request("op-1", true));
        assert!(matches!(result, Err(HelpdeskError::Validation(_))));
    }

    #[test]
    fn test_list_operators_filters() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", false)).unwrap();
        store.create_operator(operator_request("op-2", true)).unwrap();
        store.create_operator(operator_request("op-3", false)).unwrap();

        store
            .update_operator(
                "op-3",
                UpdateOperatorRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let online = store
            .list_operators(&OperatorFilter::active_online())
            .unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].user_id, "op-1");

        let all = store.list_operators(&OperatorFilter::new()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_attach_operator_to_counter() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        let counter = store.create_counter("Counter 1").unwrap();

        let updated = store.attach_operator(&counter.id, Some("op-1")).unwrap();
        assert_eq!(updated.operator_id, Some("op-1".to_string()));
    }

    #[test]
    fn test_attach_operator_exclusivity() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        let c1 = store.create_counter("Counter 1").unwrap();
        let c2 = store.create_counter("Counter 2").unwrap();

        store.attach_operator(&c1.id, Some("op-1")).unwrap();
        store.attach_operator(&c2.id, Some("op-1")).unwrap();

        // The operator moved; the first counter was released.
        let c1 = store.get_counter(&c1.id).unwrap().unwrap();
        let c2 = store.get_counter(&c2.id).unwrap().unwrap();
        assert!(c1.operator_id.is_none());
        assert_eq!(c2.operator_id, Some("op-1".to_string()));
    }

    #[test]
    fn test_attach_online_operator_rejected() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", false)).unwrap();
        let counter = store.create_counter("Counter 1").unwrap();

        let result = store.attach_operator(&counter.id, Some("op-1"));
        assert!(matches!(result, Err(HelpdeskError::Validation(_))));
    }

    #[test]
    fn test_attach_inactive_operator_rejected() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        store
            .update_operator(
                "op-1",
                UpdateOperatorRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();
        let counter = store.create_counter("Counter 1").unwrap();

        let result = store.attach_operator(&counter.id, Some("op-1"));
        assert!(matches!(result, Err(HelpdeskError::Validation(_))));
    }

    #[test]
    fn test_detach_operator() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        let counter = store.create_counter("Counter 1").unwrap();

        store.attach_operator(&counter.id, Some("op-1")).unwrap();
        let detached = store.attach_operator(&counter.id, None).unwrap();
        assert!(detached.operator_id.is_none());
    }

    #[test]
    fn test_deactivating_operator_releases_counter() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        let counter = store.create_counter("Counter 1").unwrap();
        store.attach_operator(&counter.id, Some("op-1")).unwrap();

        store
            .update_operator(
                "op-1",
                UpdateOperatorRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let counter = store.get_counter(&counter.id).unwrap().unwrap();
        assert!(counter.operator_id.is_none());
    }

    #[test]
    fn test_deactivating_counter_releases_operator() {
        let store = create_test_store();
        store.create_operator(operator_request("op-1", true)).unwrap();
        let counter = store.create_counter("Counter 1").unwrap();
        store.attach_operator(&counter.id, Some("op-1")).unwrap();

        let updated = store
            .update_counter(
                &counter.id,
                UpdateCounterRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(!updated.is_active);
        assert!(updated.operator_id.is_none());
    }

    #[test]
    fn test_delete_counter() {
        let store = create_test_store();
        let counter = store.create_counter("Counter 1").unwrap();

        store.delete_counter(&counter.id).unwrap();
        assert!(store.get_counter(&counter.id).unwrap().is_none());
    }

    #[test]
    fn test_counter_empty_name_rejected() {
        let store = create_test_store();
        let result = store.create_counter("  ");
        assert!(matches!(result, Err(HelpdeskError::Validation(_))));
    }
}
