// Shared infrastructure
pub mod config;
pub mod error;

// Domain layer
pub mod session;
pub mod template;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
