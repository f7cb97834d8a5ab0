//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `ProposalRepository` - Proposal aggregate persistence with CAS status writes
//! - `AuditLogStore` - Append-only audit trail backend
//! - `NotificationRepository` - Notification rows and preferences
//!
//! ## Collaborator Ports
//!
//! - `UserDirectory` - Identity lookups owned by the external account system
//! - `ProposalGateway` - Client-side submission calls across the network boundary

mod audit_log_store;
mod notification_repository;
mod proposal_gateway;
mod proposal_repository;
mod user_directory;

pub use audit_log_store::AuditLogStore;
pub use notification_repository::NotificationRepository;
pub use proposal_gateway::{GatewayError, ProposalGateway, SubmitReceipt};
pub use proposal_repository::ProposalRepository;
pub use user_directory::UserDirectory;
