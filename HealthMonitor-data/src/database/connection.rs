//! Database connection module for the HealthMonitor application
//!
//! Users, device bindings and records live in a SQLite database reached
//! through an r2d2 connection pool. The server binary initialises one
//! process-wide pool; tests and embedders can build their own with
//! [`DatabasePool::open`] or [`DatabasePool::in_memory`].

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::{info, error, warn};

use super::migrations::run_sqlite_migrations;

/// Global database pool used by the server binary
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Default location of the SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "data/health_monitor.db";

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based)
    Sqlite,
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database connection pool
#[derive(Debug, Clone)]
pub enum DatabasePool {
    /// SQLite connection pool
    SQLite(Arc<r2d2::Pool<SqliteConnectionManager>>),
}

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// SQLite connection pool error
    #[error("SQLite connection pool error: {0}")]
    SqlitePoolError(#[from] r2d2::Error),

    /// Filesystem error while preparing the database location
    #[error("Database I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database pool already initialized
    #[error("Database pool is already initialized")]
    PoolAlreadyInitialized,

    /// Database pool not initialized
    #[error("Database pool is not initialized")]
    PoolNotInitialized,

    /// Unsupported database type
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    /// Invalid configuration value
    #[error("Database configuration error: {0}")]
    ConfigError(String),

    /// Migration error
    #[error("Database migration error: {0}")]
    MigrationError(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type
    pub db_type: DatabaseType,
    /// Path to SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection checkout timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let defaults = Self::default();

        let db_type = env::var("DB_TYPE")
            .unwrap_or_else(|_| "sqlite".to_string())
            .parse::<DatabaseType>()?;

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) => {
                info!("Using SQLite database at: {}", path);
                path
            },
            Err(_) => {
                info!("No DB_SQLITE_PATH provided, will use default path: {}", defaults.sqlite_path);
                defaults.sqlite_path
            }
        };

        let max_connections = parse_env("DB_MAX_CONNECTIONS", defaults.max_connections)?;
        let timeout_seconds = parse_env("DB_TIMEOUT_SECONDS", defaults.timeout_seconds)?;

        info!("Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds);

        Ok(DatabaseConfig {
            db_type,
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Parse a numeric environment variable, falling back to `default` when unset
fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, DatabaseError> {
    match env::var(name) {
        Ok(value) => value.parse::<T>()
            .map_err(|_| DatabaseError::ConfigError(format!("{} must be a number, got '{}'", name, value))),
        Err(_) => Ok(default),
    }
}

impl DatabasePool {
    /// Open a file-backed SQLite pool and run migrations
    pub fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing SQLite database at: {}", config.sqlite_path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(&config.sqlite_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating parent directory: {:?}", parent);
                std::fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(&config.sqlite_path)
            .with_init(|conn| conn.busy_timeout(Duration::from_secs(5)));

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.timeout_seconds))
            .build(manager)?;

        let pool = DatabasePool::SQLite(Arc::new(pool));
        pool.migrate()?;

        info!("SQLite connection pool created successfully");
        Ok(pool)
    }

    /// Open a private in-memory SQLite database.
    /// The pool holds a single connection since every in-memory connection is
    /// its own database; it is never recycled for the same reason.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        info!("Initializing in-memory SQLite database");

        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let pool = DatabasePool::SQLite(Arc::new(pool));
        pool.migrate()?;

        info!("In-memory SQLite database initialized successfully");
        Ok(pool)
    }

    /// Check out a pooled connection
    pub fn connection(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, DatabaseError> {
        match self {
            DatabasePool::SQLite(pool) => Ok(pool.get()?),
        }
    }

    /// Run a trivial query to verify the database answers
    pub fn ping(&self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// File backing the main database; `None` for an in-memory database
    pub fn database_file(&self) -> Result<Option<String>, DatabaseError> {
        let conn = self.connection()?;
        let path: String = conn.query_row("PRAGMA database_list", [], |row| row.get(2))?;
        Ok(Some(path).filter(|p| !p.is_empty() && p != ":memory:"))
    }

    /// Whether the pool keeps its data in memory only
    pub fn is_in_memory(&self) -> Result<bool, DatabaseError> {
        Ok(self.database_file()?.is_none())
    }

    /// Human readable description of the pool
    pub fn describe(&self) -> String {
        match self {
            DatabasePool::SQLite(pool) => {
                let location = match self.database_file() {
                    Ok(None) => "SQLite in-memory database".to_string(),
                    Ok(Some(path)) => format!("SQLite database at {}", path),
                    Err(e) => {
                        error!("Failed to inspect SQLite database: {}", e);
                        return format!("SQLite connection error: {}", e);
                    }
                };

                let state = pool.state();
                format!("{} (connections: active={}, idle={})",
                    location,
                    state.connections,
                    state.idle_connections
                )
            }
        }
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)
    }
}

/// Initialize the process-wide database connection pool from the environment.
/// Falls back to an in-memory database when the configured file cannot be opened.
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;

    info!("Initializing database pool with type: {:?}", config.db_type);

    let pool = match DatabasePool::open(&config) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open SQLite database at {}: {}", config.sqlite_path, e);
            warn!("Falling back to in-memory SQLite database");
            DatabasePool::in_memory()?
        }
    };

    DB_POOL.set(pool).map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

/// Get the process-wide database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get()
        .cloned()
        .ok_or(DatabaseError::PoolNotInitialized)
}

/// Get information about the process-wide database connection
pub fn get_connection_info() -> Option<String> {
    DB_POOL.get().map(DatabasePool::describe)
}
