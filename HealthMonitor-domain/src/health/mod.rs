//! Domain layer health check functionality
//! This module provides health check services for the application

use health_monitor_data::database::{self, DatabasePool};
use std::collections::HashMap;
use std::time::Instant;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use tracing::{debug, error};

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Mark the process start; uptime is measured from the first call
pub fn mark_started() {
    Lazy::force(&STARTED_AT);
}

/// Seconds since [`mark_started`] (or the first health check)
pub fn uptime_seconds() -> u64 {
    STARTED_AT.elapsed().as_secs()
}

/// System health status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentStatus {
    /// Component is functioning normally
    Healthy,
    /// Component works with reduced guarantees
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone)]
pub struct HealthComponent {
    /// Status of the component
    pub status: ComponentStatus,
    /// Optional details about the component status
    pub details: Option<String>,
}

/// Represents the overall health of the system
#[derive(Debug, Clone)]
pub struct SystemHealth {
    /// Overall system status
    pub status: SystemStatus,
    /// Crate version
    pub version: String,
    pub uptime_seconds: u64,
    /// Map of component names to their health status
    pub components: HashMap<String, HealthComponent>,
}

impl SystemHealth {
    /// Overall status is the worst component status
    pub fn from_components(components: HashMap<String, HealthComponent>) -> Self {
        let status = if components.values().any(|c| c.status == ComponentStatus::Unhealthy) {
            SystemStatus::Unhealthy
        } else if components.values().any(|c| c.status == ComponentStatus::Degraded) {
            SystemStatus::Degraded
        } else {
            SystemStatus::Healthy
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime_seconds(),
            components,
        }
    }
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    ///
    /// - Ok(true) if a pooled connection answers
    /// - Ok(false) if the service runs on in-memory storage, including an
    ///   in-memory SQLite pool
    /// - Err if the database cannot be reached
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Health service backed by the database pool the repositories use
#[derive(Debug, Clone)]
pub struct HealthService {
    pool: Option<DatabasePool>,
}

impl HealthService {
    /// `None` means the repositories run on in-memory storage.
    /// An in-memory pool (the fallback when the database file cannot be
    /// opened) is reported as degraded as well.
    pub fn new(pool: Option<DatabasePool>) -> Self {
        Self { pool }
    }

    /// Health service for the process-wide pool
    pub fn from_global() -> Self {
        Self::new(database::get_db_pool().ok())
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let db_component = match self.check_database_status().await {
            Ok(true) => HealthComponent {
                status: ComponentStatus::Healthy,
                details: self.pool.as_ref().map(DatabasePool::describe),
            },
            Ok(false) => HealthComponent {
                status: ComponentStatus::Degraded,
                details: Some("Running on in-memory storage; data is not persisted".to_string()),
            },
            Err(e) => HealthComponent {
                status: ComponentStatus::Unhealthy,
                details: Some(e),
            },
        };

        SystemHealth::from_components(
            vec![("database".to_string(), db_component)].into_iter().collect(),
        )
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let pool = match &self.pool {
            Some(pool) => pool.clone(),
            None => return Ok(false),
        };

        let result = tokio::task::spawn_blocking(move || {
            pool.ping()?;
            pool.is_in_memory()
        })
        .await
        .map_err(|e| format!("Database check did not complete: {}", e))?;

        match result {
            Ok(in_memory) => {
                debug!(in_memory, "Database ping succeeded");
                Ok(!in_memory)
            }
            Err(e) => {
                error!("Database ping failed: {}", e);
                Err(format!("Database connection error: {}", e))
            }
        }
    }
}
