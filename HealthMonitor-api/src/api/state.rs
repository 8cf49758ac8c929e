use std::sync::Arc;
use axum::extract::FromRef;
use thiserror::Error;
use tracing::info;

use health_monitor_domain::auth::password::PasswordError;
use health_monitor_domain::auth::token::{SecurityError, TokenService};
use health_monitor_domain::auth::AuthState;
use health_monitor_domain::health::{HealthService, HealthServiceTrait};
use health_monitor_domain::services::{
    create_default_record_service, create_default_user_service, RecordServiceTrait, UserServiceTrait,
};

/// Configuration problems detected while assembling the application
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Token(#[from] SecurityError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserServiceTrait>,
    pub records: Arc<dyn RecordServiceTrait>,
    pub tokens: Arc<TokenService>,
    pub health: Arc<dyn HealthServiceTrait>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserServiceTrait>,
        records: Arc<dyn RecordServiceTrait>,
        tokens: Arc<TokenService>,
        health: Arc<dyn HealthServiceTrait>,
    ) -> Self {
        Self { users, records, tokens, health }
    }

    /// Build services from the environment and the process-wide database pool
    pub fn from_env() -> Result<Self, StartupError> {
        let tokens = Arc::new(TokenService::from_env()?);
        let users = create_default_user_service()?;
        let records = create_default_record_service();
        let health: Arc<dyn HealthServiceTrait> = Arc::new(HealthService::from_global());

        info!("Application services created");
        Ok(Self::new(users, records, tokens, health))
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> AuthState {
        AuthState::new(Arc::clone(&state.tokens), Arc::clone(&state.users))
    }
}
