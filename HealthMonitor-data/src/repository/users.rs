use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{DeviceBinding, NewUser, StoredUser};
use crate::database::DatabasePool;
use super::backend::Backend;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::{DatabaseStorage, UserLookup};

/// Repository trait for users and their device bindings
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    /// Insert a new user; duplicate phone number or national id is a conflict
    async fn create(&self, user: NewUser) -> Result<StoredUser, RepositoryError>;

    /// Get a user by id
    async fn get_by_id(&self, id: i64) -> Result<Option<StoredUser>, RepositoryError>;

    /// Get a user by phone number
    async fn get_by_phone(&self, phone_number: &str) -> Result<Option<StoredUser>, RepositoryError>;

    /// Get a user by national id
    async fn get_by_national_id(&self, national_id: &str) -> Result<Option<StoredUser>, RepositoryError>;

    /// Bind a device to a user. Re-binding the same device is a no-op,
    /// binding a new one replaces the old binding, and a device held by
    /// another user is a conflict.
    async fn bind_device(
        &self,
        user_id: i64,
        device_id: &str,
        bound_at: DateTime<Utc>,
    ) -> Result<DeviceBinding, RepositoryError>;

    /// Release the user's device; returns whether one was bound
    async fn unbind_device(&self, user_id: i64) -> Result<bool, RepositoryError>;
}

/// Repository for users backed by SQLite, or by in-memory storage when no
/// database pool is available.
#[derive(Debug, Clone)]
pub struct UserRepository {
    backend: Backend,
}

impl Default for UserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository {
    /// Create a repository on the process-wide pool
    pub fn new() -> Self {
        Self { backend: Backend::from_global() }
    }

    /// Create a repository on an explicit pool
    pub fn with_pool(pool: DatabasePool) -> Self {
        Self { backend: Backend::Database(pool) }
    }

    /// Create a repository that keeps everything in memory
    pub fn in_memory() -> Self {
        Self { backend: Backend::Memory(InMemoryStorage::new()) }
    }

    /// Whether rows are kept in memory rather than in the database
    pub fn is_in_memory(&self) -> bool {
        matches!(self.backend, Backend::Memory(_))
    }

    async fn find(&self, lookup: UserLookup<'_>) -> Result<Option<StoredUser>, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::find_user(pool, lookup).await,
            Backend::Memory(storage) => storage.find_user(lookup).await,
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, user: NewUser) -> Result<StoredUser, RepositoryError> {
        debug!("Creating user with phone_number={}", user.phone_number);

        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::insert_user(pool, user).await,
            Backend::Memory(storage) => storage.insert_user(user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<StoredUser>, RepositoryError> {
        self.find(UserLookup::Id(id)).await
    }

    async fn get_by_phone(&self, phone_number: &str) -> Result<Option<StoredUser>, RepositoryError> {
        self.find(UserLookup::Phone(phone_number)).await
    }

    async fn get_by_national_id(&self, national_id: &str) -> Result<Option<StoredUser>, RepositoryError> {
        self.find(UserLookup::NationalId(national_id)).await
    }

    async fn bind_device(
        &self,
        user_id: i64,
        device_id: &str,
        bound_at: DateTime<Utc>,
    ) -> Result<DeviceBinding, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::bind_device(pool, user_id, device_id, bound_at).await,
            Backend::Memory(storage) => storage.bind_device(user_id, device_id, bound_at).await,
        }
    }

    async fn unbind_device(&self, user_id: i64) -> Result<bool, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::unbind_device(pool, user_id).await,
            Backend::Memory(storage) => storage.unbind_device(user_id).await,
        }
    }
}

/// Mock user repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use crate::database::DatabaseError;

    /// In-memory user repository that can be switched to fail every call
    #[derive(Debug, Clone, Default)]
    pub struct MockUserRepository {
        storage: InMemoryStorage,
        failing: bool,
    }

    impl MockUserRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository whose every operation fails like an unreachable database
        pub fn failing() -> Self {
            Self { storage: InMemoryStorage::new(), failing: true }
        }

        fn check(&self) -> Result<(), RepositoryError> {
            if self.failing {
                Err(RepositoryError::Database(DatabaseError::PoolNotInitialized))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl UserRepositoryTrait for MockUserRepository {
        async fn create(&self, user: NewUser) -> Result<StoredUser, RepositoryError> {
            self.check()?;
            self.storage.insert_user(user).await
        }

        async fn get_by_id(&self, id: i64) -> Result<Option<StoredUser>, RepositoryError> {
            self.check()?;
            self.storage.find_user(UserLookup::Id(id)).await
        }

        async fn get_by_phone(&self, phone_number: &str) -> Result<Option<StoredUser>, RepositoryError> {
            self.check()?;
            self.storage.find_user(UserLookup::Phone(phone_number)).await
        }

        async fn get_by_national_id(&self, national_id: &str) -> Result<Option<StoredUser>, RepositoryError> {
            self.check()?;
            self.storage.find_user(UserLookup::NationalId(national_id)).await
        }

        async fn bind_device(
            &self,
            user_id: i64,
            device_id: &str,
            bound_at: DateTime<Utc>,
        ) -> Result<DeviceBinding, RepositoryError> {
            self.check()?;
            self.storage.bind_device(user_id, device_id, bound_at).await
        }

        async fn unbind_device(&self, user_id: i64) -> Result<bool, RepositoryError> {
            self.check()?;
            self.storage.unbind_device(user_id).await
        }
    }
}
