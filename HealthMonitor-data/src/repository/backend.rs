use tracing::{debug, warn};

use crate::database::{get_db_pool, DatabasePool};
use super::in_memory::InMemoryStorage;

/// Where a repository keeps its rows
#[derive(Debug, Clone)]
pub(crate) enum Backend {
    Database(DatabasePool),
    Memory(InMemoryStorage),
}

impl Backend {
    /// Use the process-wide pool when it has been initialized, in-memory storage otherwise
    pub(crate) fn from_global() -> Self {
        match get_db_pool() {
            Ok(pool) => {
                debug!("Repository using database storage");
                Backend::Database(pool)
            }
            Err(e) => {
                warn!("Database not available ({}), using in-memory storage", e);
                Backend::Memory(InMemoryStorage::new())
            }
        }
    }
}
