//! SQLite-backed enrollment store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    Applicant, ApplicantFilter, CreateGroupRequest, EnrollmentError, EnrollmentStore, Group,
    RegisterApplicantRequest, UpdateGroupRequest,
};

/// SQLite-backed enrollment store.
///
/// Applicants and groups share one connection so the assignment path can
/// mutate both tables in a single transaction.
pub struct SqliteEnrollmentStore {
    conn: Mutex<Connection>,
}

impl SqliteEnrollmentStore {
    /// Create a new SQLite enrollment store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, EnrollmentError> {
        let conn = Connection::open(path).map_err(|e| EnrollmentError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite enrollment store (useful for testing).
    pub fn in_memory() -> Result<Self, EnrollmentError> {
        let conn =
            Connection::open_in_memory().map_err(|e| EnrollmentError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), EnrollmentError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applicants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT NOT NULL,
                assigned_group_id TEXT,
                join_confirmed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_applicants_email ON applicants(email);
            CREATE INDEX IF NOT EXISTS idx_applicants_group ON applicants(assigned_group_id);

            CREATE TABLE IF NOT EXISTS groups (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                capacity INTEGER NOT NULL,
                member_count INTEGER NOT NULL DEFAULT 0,
                invite_link TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_groups_created_at ON groups(created_at);
            "#,
        )
        .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_applicant_where(filter: &ApplicantFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(assigned) = filter.assigned {
            if assigned {
                conditions.push("assigned_group_id IS NOT NULL");
            } else {
                conditions.push("assigned_group_id IS NULL");
            }
        }

        if let Some(confirmed) = filter.join_confirmed {
            conditions.push("join_confirmed = ?");
            params.push(Box::new(confirmed as i64));
        }

        if let Some(ref group_id) = filter.group_id {
            conditions.push("assigned_group_id = ?");
            params.push(Box::new(group_id.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_applicant(row: &rusqlite::Row) -> rusqlite::Result<Applicant> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let email: String = row.get(2)?;
        let phone: String = row.get(3)?;
        let assigned_group_id: Option<String> = row.get(4)?;
        let join_confirmed: i64 = row.get(5)?;
        let created_at_str: String = row.get(6)?;
        let updated_at_str: String = row.get(7)?;

        Ok(Applicant {
            id,
            name,
            email,
            phone,
            assigned_group_id,
            join_confirmed: join_confirmed != 0,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn row_to_group(row: &rusqlite::Row) -> rusqlite::Result<Group> {
        let id: String = row.get(0)?;
        let name: String = row.get(1)?;
        let capacity: u32 = row.get(2)?;
        let member_count: u32 = row.get(3)?;
        let invite_link: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        Ok(Group {
            id,
            name,
            capacity,
            member_count,
            invite_link,
            created_at: parse_timestamp(&created_at_str),
            updated_at: parse_timestamp(&updated_at_str),
        })
    }

    fn fetch_applicant(
        conn: &Connection,
        id: &str,
    ) -> Result<Option<Applicant>, EnrollmentError> {
        conn.query_row(
            "SELECT id, name, email, phone, assigned_group_id, join_confirmed, created_at, updated_at FROM applicants WHERE id = ?",
            params![id],
            Self::row_to_applicant,
        )
        .optional()
        .map_err(|e| EnrollmentError::Database(e.to_string()))
    }

    fn fetch_group(conn: &Connection, id: &str) -> Result<Option<Group>, EnrollmentError> {
        conn.query_row(
            "SELECT id, name, capacity, member_count, invite_link, created_at, updated_at FROM groups WHERE id = ?",
            params![id],
            Self::row_to_group,
        )
        .optional()
        .map_err(|e| EnrollmentError::Database(e.to_string()))
    }
}

/// Parse an RFC 3339 timestamp, falling back to now on corrupt data.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl EnrollmentStore for SqliteEnrollmentStore {
    fn register(&self, request: RegisterApplicantRequest) -> Result<Applicant, EnrollmentError> {
        request.validate()?;

        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO applicants (id, name, email, phone, assigned_group_id, join_confirmed, created_at, updated_at) VALUES (?, ?, ?, ?, NULL, 0, ?, ?)",
            params![
                id,
                request.name.trim(),
                request.email.trim(),
                request.phone.trim(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(Applicant {
                id,
                name: request.name.trim().to_string(),
                email: request.email.trim().to_string(),
                phone: request.phone.trim().to_string(),
                assigned_group_id: None,
                join_confirmed: false,
                created_at: now,
                updated_at: now,
            }),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(EnrollmentError::Validation(format!(
                    "email already registered: {}",
                    request.email.trim()
                )))
            }
            Err(e) => Err(EnrollmentError::Database(e.to_string())),
        }
    }

    fn get_applicant(&self, id: &str) -> Result<Option<Applicant>, EnrollmentError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_applicant(&conn, id)
    }

    fn list_applicants(&self, filter: &ApplicantFilter) -> Result<Vec<Applicant>, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_applicant_where(filter);

        let sql = format!(
            "SELECT id, name, email, phone, assigned_group_id, join_confirmed, created_at, updated_at FROM applicants {} ORDER BY created_at ASC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_applicant)
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let mut applicants = Vec::new();
        for row_result in rows {
            applicants.push(row_result.map_err(|e| EnrollmentError::Database(e.to_string()))?);
        }

        Ok(applicants)
    }

    fn count_applicants(&self, filter: &ApplicantFilter) -> Result<i64, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_applicant_where(filter);
        let sql = format!("SELECT COUNT(*) FROM applicants {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| EnrollmentError::Database(e.to_string()))
    }

    fn confirm_join(&self, id: &str) -> Result<Applicant, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let applicant = Self::fetch_applicant(&conn, id)?
            .ok_or_else(|| EnrollmentError::NotFound(format!("Applicant not found: {}", id)))?;

        // Confirming twice is a no-op, not an error.
        if applicant.join_confirmed {
            return Ok(applicant);
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE applicants SET join_confirmed = 1, updated_at = ? WHERE id = ?",
            params![now.to_rfc3339(), id],
        )
        .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(Applicant {
            join_confirmed: true,
            updated_at: now,
            ..applicant
        })
    }

    fn delete_applicant(&self, id: &str) -> Result<Applicant, EnrollmentError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let applicant = tx
            .query_row(
                "SELECT id, name, email, phone, assigned_group_id, join_confirmed, created_at, updated_at FROM applicants WHERE id = ?",
                params![id],
                Self::row_to_applicant,
            )
            .optional()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?
            .ok_or_else(|| EnrollmentError::NotFound(format!("Applicant not found: {}", id)))?;

        // Free the seat the applicant occupied.
        if let Some(ref group_id) = applicant.assigned_group_id {
            tx.execute(
                "UPDATE groups SET member_count = member_count - 1, updated_at = ? WHERE id = ? AND member_count > 0",
                params![Utc::now().to_rfc3339(), group_id],
            )
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;
        }

        tx.execute("DELETE FROM applicants WHERE id = ?", params![id])
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(applicant)
    }

    fn create_group(&self, request: CreateGroupRequest) -> Result<Group, EnrollmentError> {
        request.validate()?;

        let conn = self.conn.lock().unwrap();

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO groups (id, name, capacity, member_count, invite_link, created_at, updated_at) VALUES (?, ?, ?, 0, ?, ?, ?)",
            params![
                id,
                request.name.trim(),
                request.capacity,
                request.invite_link,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(Group {
            id,
            name: request.name.trim().to_string(),
            capacity: request.capacity,
            member_count: 0,
            invite_link: request.invite_link,
            created_at: now,
            updated_at: now,
        })
    }

    fn get_group(&self, id: &str) -> Result<Option<Group>, EnrollmentError> {
        let conn = self.conn.lock().unwrap();
        Self::fetch_group(&conn, id)
    }

    fn list_groups(&self) -> Result<Vec<Group>, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT id, name, capacity, member_count, invite_link, created_at, updated_at FROM groups ORDER BY created_at ASC, name ASC",
            )
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_group)
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let mut groups = Vec::new();
        for row_result in rows {
            groups.push(row_result.map_err(|e| EnrollmentError::Database(e.to_string()))?);
        }

        Ok(groups)
    }

    fn update_group(
        &self,
        id: &str,
        request: UpdateGroupRequest,
    ) -> Result<Group, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch_group(&conn, id)?
            .ok_or_else(|| EnrollmentError::NotFound(format!("Group not found: {}", id)))?;

        let name = request.name.unwrap_or_else(|| current.name.clone());
        let capacity = request.capacity.unwrap_or(current.capacity);
        let invite_link = request
            .invite_link
            .unwrap_or_else(|| current.invite_link.clone());

        if name.trim().is_empty() {
            return Err(EnrollmentError::Validation(
                "group name cannot be empty".to_string(),
            ));
        }
        if capacity < current.member_count {
            return Err(EnrollmentError::Validation(format!(
                "capacity {} is below current member count {}",
                capacity, current.member_count
            )));
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE groups SET name = ?, capacity = ?, invite_link = ?, updated_at = ? WHERE id = ?",
            params![name.trim(), capacity, invite_link, now.to_rfc3339(), id],
        )
        .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(Group {
            name: name.trim().to_string(),
            capacity,
            invite_link,
            updated_at: now,
            ..current
        })
    }

    fn delete_group(&self, id: &str) -> Result<Group, EnrollmentError> {
        let conn = self.conn.lock().unwrap();

        let group = Self::fetch_group(&conn, id)?
            .ok_or_else(|| EnrollmentError::NotFound(format!("Group not found: {}", id)))?;

        if group.member_count > 0 {
            return Err(EnrollmentError::Validation(format!(
                "group {} still has {} members",
                group.name, group.member_count
            )));
        }

        conn.execute("DELETE FROM groups WHERE id = ?", params![id])
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok(group)
    }

    fn assign_first_available(
        &self,
        applicant_id: &str,
    ) -> Result<(Applicant, Group), EnrollmentError> {
        let mut conn = self.conn.lock().unwrap();

        let tx = conn
            .transaction()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let applicant = tx
            .query_row(
                "SELECT id, name, email, phone, assigned_group_id, join_confirmed, created_at, updated_at FROM applicants WHERE id = ?",
                params![applicant_id],
                Self::row_to_applicant,
            )
            .optional()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?
            .ok_or_else(|| {
                EnrollmentError::NotFound(format!("Applicant not found: {}", applicant_id))
            })?;

        if applicant.assigned_group_id.is_some() {
            return Err(EnrollmentError::Validation(format!(
                "applicant {} is already assigned to a group",
                applicant_id
            )));
        }

        // First group with spare capacity in stable scan order.
        let group_id: Option<String> = tx
            .query_row(
                "SELECT id FROM groups WHERE member_count < capacity ORDER BY created_at ASC, name ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let group_id = group_id.ok_or(EnrollmentError::CapacityExceeded)?;

        let now = Utc::now();

        // Conditional increment keeps the at-most-capacity invariant even
        // if the selection above ever raced another writer.
        let changed = tx
            .execute(
                "UPDATE groups SET member_count = member_count + 1, updated_at = ? WHERE id = ? AND member_count < capacity",
                params![now.to_rfc3339(), group_id],
            )
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(EnrollmentError::CapacityExceeded);
        }

        tx.execute(
            "UPDATE applicants SET assigned_group_id = ?, updated_at = ? WHERE id = ?",
            params![group_id, now.to_rfc3339(), applicant_id],
        )
        .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        let group = tx
            .query_row(
                "SELECT id, name, capacity, member_count, invite_link, created_at, updated_at FROM groups WHERE id = ?",
                params![group_id],
                Self::row_to_group,
            )
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| EnrollmentError::Database(e.to_string()))?;

        Ok((
            Applicant {
                assigned_group_id: Some(group_id),
                updated_at: now,
                ..applicant
            },
            group,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteEnrollmentStore {
        SqliteEnrollmentStore::in_memory().unwrap()
    }

    fn register_request(n: u32) -> RegisterApplicantRequest {
        RegisterApplicantRequest {
            name: format!("Applicant {}", n),
            email: format!("applicant{}@example.com", n),
            phone: "+55 11 91234-5678".to_string(),
        }
    }

    fn group_request(name: &str, capacity: u32) -> CreateGroupRequest {
        CreateGroupRequest {
            name: name.to_string(),
            capacity,
            invite_link: format!("https://chat.example.com/{}", name),
        }
    }

    #[test]
    fn test_register_applicant() {
        let store = create_test_store();
        let applicant = store.register(register_request(1)).unwrap();

        assert!(!applicant.id.is_empty());
        assert_eq!(applicant.name, "Applicant 1");
        assert!(applicant.assigned_group_id.is_none());
        assert!(!applicant.join_confirmed);
    }

    #[test]
    fn test_register_duplicate_email_rejected() {
        let store = create_test_store();
        store.register(register_request(1)).unwrap();

        let result = store.register(register_request(1));
        assert!(matches!(result, Err(EnrollmentError::Validation(_))));
    }

    #[test]
    fn test_register_invalid_email_rejected() {
        let store = create_test_store();
        let mut request = register_request(1);
        request.email = "nope".to_string();
        assert!(matches!(
            store.register(request),
            Err(EnrollmentError::Validation(_))
        ));
    }

    #[test]
    fn test_get_nonexistent_applicant() {
        let store = create_test_store();
        assert!(store.get_applicant("missing").unwrap().is_none());
    }

    #[test]
    fn test_assign_first_available_deterministic() {
        let store = create_test_store();

        // First group full, second has room: assignment must pick the second.
        let g1 = store.create_group(group_request("alpha", 1)).unwrap();
        let g2 = store.create_group(group_request("beta", 3)).unwrap();

        let a1 = store.register(register_request(1)).unwrap();
        let (a1, assigned) = store.assign_first_available(&a1.id).unwrap();
        assert_eq!(assigned.id, g1.id);
        assert_eq!(assigned.member_count, 1);
        assert_eq!(a1.assigned_group_id, Some(g1.id.clone()));

        let a2 = store.register(register_request(2)).unwrap();
        let (_, assigned) = store.assign_first_available(&a2.id).unwrap();
        assert_eq!(assigned.id, g2.id, "full group must be skipped");
        assert_eq!(assigned.member_count, 1);
    }

    #[test]
    fn test_assign_capacity_exceeded() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 1)).unwrap();

        let a1 = store.register(register_request(1)).unwrap();
        store.assign_first_available(&a1.id).unwrap();

        let a2 = store.register(register_request(2)).unwrap();
        let result = store.assign_first_available(&a2.id);
        assert!(matches!(result, Err(EnrollmentError::CapacityExceeded)));

        // The failed applicant stays unassigned.
        let a2 = store.get_applicant(&a2.id).unwrap().unwrap();
        assert!(a2.assigned_group_id.is_none());
    }

    #[test]
    fn test_assign_already_assigned_rejected() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 5)).unwrap();

        let applicant = store.register(register_request(1)).unwrap();
        store.assign_first_available(&applicant.id).unwrap();

        let result = store.assign_first_available(&applicant.id);
        assert!(matches!(result, Err(EnrollmentError::Validation(_))));

        // Member count did not move on the failed attempt.
        let groups = store.list_groups().unwrap();
        assert_eq!(groups[0].member_count, 1);
    }

    #[test]
    fn test_capacity_invariant_never_exceeded() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 2)).unwrap();
        store.create_group(group_request("beta", 3)).unwrap();

        // Fill every seat, then one more.
        let mut assigned = 0;
        for i in 0..6 {
            let applicant = store.register(register_request(i)).unwrap();
            match store.assign_first_available(&applicant.id) {
                Ok(_) => assigned += 1,
                Err(EnrollmentError::CapacityExceeded) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(assigned, 5);
        for group in store.list_groups().unwrap() {
            assert!(group.member_count <= group.capacity);
            assert!(group.is_full());
        }
    }

    #[test]
    fn test_confirm_join_idempotent() {
        let store = create_test_store();
        let applicant = store.register(register_request(1)).unwrap();

        let first = store.confirm_join(&applicant.id).unwrap();
        assert!(first.join_confirmed);

        let second = store.confirm_join(&applicant.id).unwrap();
        assert!(second.join_confirmed, "second confirm must not toggle back");
    }

    #[test]
    fn test_confirm_join_missing_applicant() {
        let store = create_test_store();
        let result = store.confirm_join("missing");
        assert!(matches!(result, Err(EnrollmentError::NotFound(_))));
    }

    #[test]
    fn test_delete_applicant_frees_seat() {
        let store = create_test_store();
        let group = store.create_group(group_request("alpha", 1)).unwrap();

        let applicant = store.register(register_request(1)).unwrap();
        store.assign_first_available(&applicant.id).unwrap();
        assert!(store.get_group(&group.id).unwrap().unwrap().is_full());

        store.delete_applicant(&applicant.id).unwrap();

        let group = store.get_group(&group.id).unwrap().unwrap();
        assert_eq!(group.member_count, 0);
        assert!(store.get_applicant(&applicant.id).unwrap().is_none());
    }

    #[test]
    fn test_list_applicants_filters() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 1)).unwrap();

        let a1 = store.register(register_request(1)).unwrap();
        store.register(register_request(2)).unwrap();
        store.assign_first_available(&a1.id).unwrap();
        store.confirm_join(&a1.id).unwrap();

        let assigned = store
            .list_applicants(&ApplicantFilter::new().with_assigned(true))
            .unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, a1.id);

        let unconfirmed = store
            .list_applicants(&ApplicantFilter::new().with_join_confirmed(false))
            .unwrap();
        assert_eq!(unconfirmed.len(), 1);

        assert_eq!(store.count_applicants(&ApplicantFilter::new()).unwrap(), 2);
    }

    #[test]
    fn test_update_group_capacity_below_members_rejected() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 2)).unwrap();

        let a1 = store.register(register_request(1)).unwrap();
        let (_, group) = store.assign_first_available(&a1.id).unwrap();

        let result = store.update_group(
            &group.id,
            UpdateGroupRequest {
                capacity: Some(0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EnrollmentError::Validation(_))));
    }

    #[test]
    fn test_delete_group_with_members_rejected() {
        let store = create_test_store();
        store.create_group(group_request("alpha", 2)).unwrap();

        let a1 = store.register(register_request(1)).unwrap();
        let (_, group) = store.assign_first_available(&a1.id).unwrap();

        let result = store.delete_group(&group.id);
        assert!(matches!(result, Err(EnrollmentError::Validation(_))));
    }

    #[test]
    fn test_delete_empty_group() {
        let store = create_test_store();
        let group = store.create_group(group_request("alpha", 2)).unwrap();

        store.delete_group(&group.id).unwrap();
        assert!(store.get_group(&group.id).unwrap().is_none());
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("enrollment.db");

        let store = SqliteEnrollmentStore::new(&db_path).unwrap();
        let applicant = store.register(register_request(1)).unwrap();

        assert!(db_path.exists());
        assert!(store.get_applicant(&applicant.id).unwrap().is_some());
    }
}
