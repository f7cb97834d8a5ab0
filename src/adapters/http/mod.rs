//! HTTP adapters - the client side of the network boundary.

mod gateway;

pub use gateway::HttpProposalGateway;
