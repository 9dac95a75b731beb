// Shared infrastructure
pub mod config;
pub mod error;

// Identity and wire types
pub mod chat;
pub mod identity;

// Transport layer
pub mod transport;

// Connection lifecycle
pub mod manager;
