use std::sync::PoisonError;
use thiserror::Error;
use rusqlite::ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE};
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Uniqueness or ownership conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// Serialization of a JSON column failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Lock error
    #[error("Lock error: {0}")]
    Lock(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RepositoryError {
    /// True when the error is a uniqueness or ownership conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.extended_code == SQLITE_CONSTRAINT_UNIQUE
                    || failure.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                RepositoryError::Conflict(
                    message.clone().unwrap_or_else(|| "constraint violation".to_string()),
                )
            }
            _ => RepositoryError::Sqlite(error),
        }
    }
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(error: PoisonError<T>) -> Self {
        RepositoryError::Lock(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (v TEXT UNIQUE)", []).unwrap();
        conn.execute("INSERT INTO t (v) VALUES ('a')", []).unwrap();

        let err = conn.execute("INSERT INTO t (v) VALUES ('a')", []).unwrap_err();
        let err = RepositoryError::from(err);

        assert!(err.is_conflict());
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[test]
    fn test_primary_key_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute("CREATE TABLE t (id TEXT PRIMARY KEY NOT NULL)", []).unwrap();
        conn.execute("INSERT INTO t (id) VALUES ('a')", []).unwrap();

        let err = conn.execute("INSERT INTO t (id) VALUES ('a')", []).unwrap_err();
        assert!(RepositoryError::from(err).is_conflict());
    }

    #[test]
    fn test_other_constraint_violations_are_not_conflicts() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE t (v TEXT NOT NULL, n INTEGER CHECK (n > 0))",
            [],
        )
        .unwrap();

        let not_null = conn.execute("INSERT INTO t (v, n) VALUES (NULL, 1)", []).unwrap_err();
        assert!(matches!(RepositoryError::from(not_null), RepositoryError::Sqlite(_)));

        let check = conn.execute("INSERT INTO t (v, n) VALUES ('a', 0)", []).unwrap_err();
        assert!(matches!(RepositoryError::from(check), RepositoryError::Sqlite(_)));
    }

    #[test]
    fn test_other_sqlite_errors_are_not_conflicts() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM missing_table", []).unwrap_err();

        assert!(matches!(RepositoryError::from(err), RepositoryError::Sqlite(_)));
    }
}
