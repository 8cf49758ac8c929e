pub mod auth;
pub mod health;
pub mod records;
pub mod users;

// Re-export handlers for easier imports
pub use auth::login_access_token;
pub use health::health_check;
pub use records::{create_record, list_records};
pub use users::{bind_device, read_current_user, register, unbind_device};
