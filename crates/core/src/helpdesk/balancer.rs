//! Ticket load balancing across active online operators.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::BALANCE_RUNS_TOTAL;
use crate::ticket::{TicketError, TicketStore};

use super::{HelpdeskError, HelpdeskStore, OperatorFilter};

#[derive(Debug, Error)]
pub enum BalanceError {
    /// Nothing to balance across.
    #[error("no active online operators to balance across")]
    NoOperators,

    #[error(transparent)]
    Ticket(#[from] TicketError),

    #[error(transparent)]
    Helpdesk(#[from] HelpdeskError),
}

/// Per-operator result of a balance run.
#[derive(Debug, Clone, Serialize)]
pub struct OperatorLoad {
    pub operator_id: String,
    pub assigned: u32,
}

/// Result of a balance run.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub operators: u32,
    pub tickets: u32,
    pub loads: Vec<OperatorLoad>,
}

/// Redistributes open and in-progress tickets evenly across active online
/// operators.
///
/// Deterministic: tickets in insertion order, operators in registration
/// order, dealt round-robin, so any two operators' counts differ by at
/// most one. Manual assignments stand until the next run overwrites them.
pub struct OperatorLoadBalancer {
    tickets: Arc<dyn TicketStore>,
    helpdesk: Arc<dyn HelpdeskStore>,
    audit: Option<AuditHandle>,
}

impl OperatorLoadBalancer {
    pub fn new(tickets: Arc<dyn TicketStore>, helpdesk: Arc<dyn HelpdeskStore>) -> Self {
        Self {
            tickets,
            helpdesk,
            audit: None,
        }
    }

    /// Attach an audit handle for emitting balance events.
    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Run one balance pass. `balanced_by` is recorded in the audit trail.
    pub fn balance(&self, balanced_by: &str) -> Result<BalanceReport, BalanceError> {
        let operators = self
            .helpdesk
            .list_operators(&OperatorFilter::active_online())?;

        if operators.is_empty() {
            return Err(BalanceError::NoOperators);
        }

        let tickets = self.tickets.list_balanceable()?;

        let mut loads: Vec<OperatorLoad> = operators
            .iter()
            .map(|op| OperatorLoad {
                operator_id: op.user_id.clone(),
                assigned: 0,
            })
            .collect();

        for (i, ticket) in tickets.iter().enumerate() {
            let slot = i % operators.len();
            self.tickets
                .assign(&ticket.id, Some(&operators[slot].user_id))?;
            loads[slot].assigned += 1;
        }

        BALANCE_RUNS_TOTAL.inc();
        info!(
            operators = operators.len(),
            tickets = tickets.len(),
            "Balanced tickets across operators"
        );

        if let Some(ref audit) = self.audit {
            audit.try_emit(AuditEvent::TicketsBalanced {
                operators: operators.len() as u32,
                tickets: tickets.len() as u32,
                balanced_by: balanced_by.to_string(),
            });
        }

        Ok(BalanceReport {
            operators: operators.len() as u32,
            tickets: tickets.len() as u32,
            loads,
        })
    }
}
