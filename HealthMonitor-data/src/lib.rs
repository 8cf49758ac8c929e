// HealthMonitor Data
// This crate handles storage of users, device bindings and device records

// Database connection management
pub mod database;

// Repository implementations for data access
pub mod repository;

// Data storage models
pub mod models;
