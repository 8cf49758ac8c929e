// Testing utilities and mock implementations for the domain layer
// This module is only available when the "mock" feature is enabled

// Re-export useful test mocks from the data layer
pub use health_monitor_data::repository::tests::{MockRecordRepository, MockUserRepository};

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;

use crate::auth::password::{PasswordConfig, PasswordManager, PasswordError};
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};
use crate::services::records::{create_record_service, RecordServiceTrait};
use crate::services::users::{create_user_service, UserServiceTrait};

/// Password manager with minimal Argon2 cost, for tests only
pub fn fast_password_manager() -> Result<PasswordManager, PasswordError> {
    PasswordManager::new(PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 })
}

/// User service over a fresh mock repository
pub fn create_mock_user_service() -> Result<Arc<dyn UserServiceTrait>, PasswordError> {
    Ok(create_user_service(MockUserRepository::new(), fast_password_manager()?))
}

/// Record service over the given mock repository
pub fn create_mock_record_service(repository: MockRecordRepository) -> Arc<dyn RecordServiceTrait> {
    create_record_service(repository)
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    /// Database component status
    database_status: ComponentStatus,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
        }
    }

    /// Configure the mock with a degraded database
    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    /// Configure the mock with an unhealthy database
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let components = HashMap::from([(
            "database".to_string(),
            HealthComponent {
                status: self.database_status,
                details: match self.database_status {
                    ComponentStatus::Healthy => None,
                    ComponentStatus::Degraded => Some("Running on in-memory storage".to_string()),
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                },
            },
        )]);

        SystemHealth::from_components(components)
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy => Ok(true),
            ComponentStatus::Degraded => Ok(false),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}
