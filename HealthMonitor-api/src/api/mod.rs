pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;

pub use error::ApiError;
pub use state::{AppState, StartupError};

/// Create the application router from the environment
pub async fn create_application() -> Result<Router, StartupError> {
    routes::create_app().await
}
