//! Proposal Desk - Approval workflow core for institutional event proposals.
//!
//! Implements the proposal status lifecycle, its immutable audit trail,
//! per-user notification fan-out, and the client-side submission retry
//! driver that talks to the workflow across the network boundary.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
