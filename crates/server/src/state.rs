use std::sync::Arc;

use prereg_core::{
    AuditHandle, AuditStore, Authenticator, Config, ContentStore, EnrollmentStore, GroupAssigner,
    HelpdeskStore, OperatorLoadBalancer, QueueStore, SanitizedConfig, TicketStore,
};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    enrollment: Arc<dyn EnrollmentStore>,
    tickets: Arc<dyn TicketStore>,
    queue: Arc<dyn QueueStore>,
    helpdesk: Arc<dyn HelpdeskStore>,
    content: Arc<dyn ContentStore>,
    assigner: GroupAssigner,
    balancer: OperatorLoadBalancer,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        enrollment: Arc<dyn EnrollmentStore>,
        tickets: Arc<dyn TicketStore>,
        queue: Arc<dyn QueueStore>,
        helpdesk: Arc<dyn HelpdeskStore>,
        content: Arc<dyn ContentStore>,
        assigner: GroupAssigner,
        balancer: OperatorLoadBalancer,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            authenticator,
            audit,
            audit_store,
            enrollment,
            tickets,
            queue,
            helpdesk,
            content,
            assigner,
            balancer,
            ws_broadcaster,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn enrollment(&self) -> &dyn EnrollmentStore {
        self.enrollment.as_ref()
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.tickets.as_ref()
    }

    pub fn queue_store(&self) -> &dyn QueueStore {
        self.queue.as_ref()
    }

    pub fn helpdesk_store(&self) -> &dyn HelpdeskStore {
        self.helpdesk.as_ref()
    }

    pub fn content_store(&self) -> &dyn ContentStore {
        self.content.as_ref()
    }

    pub fn assigner(&self) -> &GroupAssigner {
        &self.assigner
    }

    pub fn balancer(&self) -> &OperatorLoadBalancer {
        &self.balancer
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
