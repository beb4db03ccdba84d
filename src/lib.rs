pub mod config;
pub mod error;
pub mod logging;

// Domain data shapes shared across layers
pub mod domain;

// Application boundary: ports and the rebuild/update orchestrators
pub mod app;

// The reconciliation pipeline stages
pub mod pipeline;

// Infrastructure implementations of the ports
pub mod infra;
