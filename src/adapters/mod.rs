//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx implementations of the persistence ports
//! - `http` - reqwest implementation of the submission gateway
//! - `memory` - deterministic in-memory implementations for tests

pub mod http;
pub mod memory;
pub mod postgres;
