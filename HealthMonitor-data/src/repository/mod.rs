// Repository module structure
pub mod errors;
mod backend;
mod in_memory;
mod records;
mod storage;
mod users;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use records::{RecordRepository, RecordRepositoryTrait};
pub use users::{UserRepository, UserRepositoryTrait};

/// Mock repositories for both testing and when the mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    pub use super::records::tests::MockRecordRepository;
    pub use super::users::tests::MockUserRepository;
}
