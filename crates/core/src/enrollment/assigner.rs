//! Group assignment component.

use std::sync::Arc;

use tracing::info;

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::ASSIGNMENTS_TOTAL;

use super::{Applicant, EnrollmentError, EnrollmentStore, Group};

/// Assigns applicants to the first group with spare capacity.
///
/// The store performs the selection and the conditional member-count
/// increment in one transaction; this component adds audit and metrics
/// around it. There is no retry: when every group is full the caller gets
/// `CapacityExceeded` and the applicant stays unassigned.
pub struct GroupAssigner {
    store: Arc<dyn EnrollmentStore>,
    audit: Option<AuditHandle>,
}

impl GroupAssigner {
    pub fn new(store: Arc<dyn EnrollmentStore>) -> Self {
        Self { store, audit: None }
    }

    /// Attach an audit handle for emitting assignment events.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Assign the applicant to the first group with spare capacity.
    pub fn assign(&self, applicant_id: &str) -> Result<(Applicant, Group), EnrollmentError> {
        match self.store.assign_first_available(applicant_id) {
            Ok((applicant, group)) => {
                ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).inc();
                info!(
                    applicant_id = %applicant.id,
                    group_id = %group.id,
                    member_count = group.member_count,
                    "Applicant assigned to group"
                );
                if let Some(ref audit) = self.audit {
                    audit.try_emit(AuditEvent::GroupAssigned {
                        applicant_id: applicant.id.clone(),
                        group_id: group.id.clone(),
                        group_name: group.name.clone(),
                    });
                }
                Ok((applicant, group))
            }
            Err(EnrollmentError::CapacityExceeded) => {
                ASSIGNMENTS_TOTAL.with_label_values(&["no_capacity"]).inc();
                Err(EnrollmentError::CapacityExceeded)
            }
            Err(e) => Err(e),
        }
    }

    /// Idempotently confirm the applicant joined their group.
    pub fn confirm_join(&self, applicant_id: &str) -> Result<Applicant, EnrollmentError> {
        let applicant = self.store.confirm_join(applicant_id)?;
        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::JoinConfirmed {
                applicant_id: applicant.id.clone(),
            });
        }
        Ok(applicant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::{
        CreateGroupRequest, RegisterApplicantRequest, SqliteEnrollmentStore,
    };

    fn setup() -> (GroupAssigner, Arc<dyn EnrollmentStore>) {
        let store: Arc<dyn EnrollmentStore> = Arc::new(SqliteEnrollmentStore::in_memory().unwrap());
        (GroupAssigner::new(Arc::clone(&store)), store)
    }

    fn register(store: &Arc<dyn EnrollmentStore>, n: u32) -> Applicant {
        store
            .register(RegisterApplicantRequest {
                name: format!("Applicant {}", n),
                email: format!("a{}@example.com", n),
                phone: "+49 30 1234567".to_string(),
            })
            .unwrap()
    }

    fn create_group(store: &Arc<dyn EnrollmentStore>, name: &str, capacity: u32) -> Group {
        store
            .create_group(CreateGroupRequest {
                name: name.to_string(),
                capacity,
                invite_link: String::new(),
            })
            .unwrap()
    }

    #[test]
    fn test_assign_picks_first_group_with_room() {
        let (assigner, store) = setup();
        create_group(&store, "alpha", 1);
        let beta = create_group(&store, "beta", 2);

        let a1 = register(&store, 1);
        let a2 = register(&store, 2);

        assigner.assign(&a1.id).unwrap();
        let (_, group) = assigner.assign(&a2.id).unwrap();
        assert_eq!(group.id, beta.id);
    }

    #[test]
    fn test_assign_no_capacity() {
        let (assigner, store) = setup();
        create_group(&store, "alpha", 1);

        let a1 = register(&store, 1);
        let a2 = register(&store, 2);

        assigner.assign(&a1.id).unwrap();
        let result = assigner.assign(&a2.id);
        assert!(matches!(result, Err(EnrollmentError::CapacityExceeded)));
    }

    #[test]
    fn test_assign_missing_applicant() {
        let (assigner, store) = setup();
        create_group(&store, "alpha", 1);

        let result = assigner.assign("missing");
        assert!(matches!(result, Err(EnrollmentError::NotFound(_))));
    }

    #[test]
    fn test_confirm_join_twice_succeeds() {
        let (assigner, store) = setup();
        let applicant = register(&store, 1);

        let first = assigner.confirm_join(&applicant.id).unwrap();
        let second = assigner.confirm_join(&applicant.id).unwrap();
        assert!(first.join_confirmed);
        assert!(second.join_confirmed);
    }

    #[tokio::test]
    async fn test_assign_emits_audit_event() {
        let (tx, mut rx) = tokio::sync::mpsc::channel(10);
        let audit = AuditHandle::new(tx);

        let store: Arc<dyn EnrollmentStore> = Arc::new(SqliteEnrollmentStore::in_memory().unwrap());
        let assigner = GroupAssigner::new(Arc::clone(&store)).with_audit(audit);

        create_group(&store, "alpha", 1);
        let applicant = register(&store, 1);
        assigner.assign(&applicant.id).unwrap();

        let envelope = rx.recv().await.expect("Should receive audit event");
        assert!(matches!(envelope.event, AuditEvent::GroupAssigned { .. }));
    }
}
