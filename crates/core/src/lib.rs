pub mod audit;
pub mod auth;
pub mod config;
pub mod content;
pub mod enrollment;
pub mod helpdesk;
pub mod metrics;
pub mod queue;
pub mod ticket;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator, Role,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ApiKeyEntry, AuthConfig, AuthMethod,
    Config, ConfigError, DatabaseConfig, RegistrationConfig, SanitizedConfig, ServerConfig,
};
pub use content::{
    Announcement, ContentError, ContentStore, CreateAnnouncementRequest, SqliteContentStore,
    UpdateAnnouncementRequest,
};
pub use enrollment::{
    Applicant, ApplicantFilter, CreateGroupRequest, EnrollmentError, EnrollmentStore, Group,
    GroupAssigner, RegisterApplicantRequest, SqliteEnrollmentStore, UpdateGroupRequest,
};
pub use helpdesk::{
    BalanceError, BalanceReport, Counter, CreateOperatorRequest, HelpdeskError, HelpdeskStore,
    Operator, OperatorFilter, OperatorLoad, OperatorLoadBalancer, SqliteHelpdeskStore,
    UpdateCounterRequest, UpdateOperatorRequest,
};
pub use queue::{
    CreateQueueTicketRequest, QueueError, QueueFilter, QueueStatus, QueueStore, QueueTicket,
    SqliteQueueStore,
};
pub use ticket::{
    AppendedMessage, CreateTicketRequest, SqliteTicketStore, Ticket, TicketError, TicketFilter,
    TicketMessage, TicketPriority, TicketStatus, TicketStore, TicketTransition,
};
