use async_trait::async_trait;
use tracing::debug;

use crate::models::{NewRecord, RecordQuery, StoredRecord};
use crate::database::DatabasePool;
use super::backend::Backend;
use super::errors::RepositoryError;
use super::in_memory::InMemoryStorage;
use super::storage::DatabaseStorage;

/// Repository trait for device records
#[async_trait]
pub trait RecordRepositoryTrait: Send + Sync {
    /// Insert a record; id is assigned by storage
    async fn create(&self, record: NewRecord) -> Result<StoredRecord, RepositoryError>;

    /// Records for one device and type, newest first (ties broken by id),
    /// together with the number of matches ignoring `skip` and `limit`
    async fn query_by_device(&self, query: &RecordQuery) -> Result<(Vec<StoredRecord>, usize), RepositoryError>;
}

/// Repository for device records
#[derive(Debug, Clone)]
pub struct RecordRepository {
    backend: Backend,
}

impl Default for RecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordRepository {
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
}

#[async_trait]
impl RecordRepositoryTrait for RecordRepository {
    async fn create(&self, record: NewRecord) -> Result<StoredRecord, RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::insert_record(pool, record).await,
            Backend::Memory(storage) => {
                debug!("Storing {} record in memory for device {}", record.record_type, record.device_id);
                storage.insert_record(record).await
            }
        }
    }

    async fn query_by_device(&self, query: &RecordQuery) -> Result<(Vec<StoredRecord>, usize), RepositoryError> {
        match &self.backend {
            Backend::Database(pool) => DatabaseStorage::query_records(pool, query).await,
            Backend::Memory(storage) => storage.query_records(query).await,
        }
    }
}

/// Mock record repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use std::sync::{Arc, Mutex};
    use super::*;
    use crate::database::DatabaseError;
    use super::super::in_memory::page_records;

    /// Mock implementation of RecordRepository for testing
    #[derive(Debug, Clone, Default)]
    pub struct MockRecordRepository {
        records: Arc<Mutex<Vec<StoredRecord>>>,
        failing: bool,
    }

    impl MockRecordRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined records
        pub fn with_records(records: Vec<StoredRecord>) -> Self {
            Self { records: Arc::new(Mutex::new(records)), failing: false }
        }

        /// Create a mock repository whose every operation fails like an unreachable database
        pub fn failing() -> Self {
            Self { records: Arc::default(), failing: true }
        }

        /// Everything stored so far
        pub fn records(&self) -> Vec<StoredRecord> {
            self.records.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RecordRepositoryTrait for MockRecordRepository {
        async fn create(&self, record: NewRecord) -> Result<StoredRecord, RepositoryError> {
            if self.failing {
                return Err(RepositoryError::Database(DatabaseError::PoolNotInitialized));
            }

            let mut records = self.records.lock()?;
            let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            let stored = record.into_stored(id);
            records.push(stored.clone());
            Ok(stored)
        }

        async fn query_by_device(&self, query: &RecordQuery) -> Result<(Vec<StoredRecord>, usize), RepositoryError> {
            if self.failing {
                return Err(RepositoryError::Database(DatabaseError::PoolNotInitialized));
            }

            let records = self.records.lock()?;
            Ok(page_records(records.iter(), query))
        }
    }
}
