// Document store handle shared by every collection
pub mod store;

// Subject secrets
pub mod credentials;

// Shared key + basic-auth gate
pub mod auth;

// Telemetry events
pub mod event;

// Chunked blob uploads
pub mod blob;

// Task descriptors
pub mod task;

// Configuration
pub mod config;

// HTTP router and handlers
pub mod api;
