// Public entities for the HealthMonitor API
// This module contains data structures that are shared across the application boundary

// Common entities for error handling
pub mod common;

// Auth entities
pub mod auth;

// User and device binding entities
pub mod user;

// Record entities
pub mod record;
