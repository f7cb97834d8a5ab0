//! Workflow application services.

mod service;

pub use service::ProposalWorkflow;
