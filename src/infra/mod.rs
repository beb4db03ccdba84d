//! Implementations of the external-collaborator ports.

pub mod http_fetcher;
pub mod in_memory;
