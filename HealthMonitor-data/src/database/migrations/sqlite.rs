use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_user_table(conn)?;
    create_device_binding_table(conn)?;
    create_record_table(conn)?;
    create_record_index(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the user table
fn create_user_table(conn: &Connection) -> Result<(), String> {
    info!("Creating user table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            phone_number TEXT NOT NULL UNIQUE,
            national_id TEXT NOT NULL UNIQUE,
            full_name TEXT,
            hashed_password TEXT NOT NULL,
            gender TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            height INTEGER NOT NULL,
            weight INTEGER NOT NULL,
            sickness TEXT NOT NULL,
            sickness_history TEXT NOT NULL DEFAULT '[]',
            family_sickness_history TEXT NOT NULL DEFAULT '[]',
            medicines TEXT NOT NULL DEFAULT '[]',
            allergies TEXT NOT NULL DEFAULT '[]'
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the device binding table.
/// Both columns are unique: one owner per device, one device per user.
fn create_device_binding_table(conn: &Connection) -> Result<(), String> {
    info!("Creating device_binding table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS device_binding (
            device_id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL UNIQUE REFERENCES user(id),
            bound_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create the record table
fn create_record_table(conn: &Connection) -> Result<(), String> {
    info!("Creating record table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            record_type TEXT NOT NULL,
            heart_rate INTEGER,
            body_temperature REAL,
            spo2 INTEGER,
            blood_pressure TEXT,
            ecg TEXT,
            acc TEXT,
            gps TEXT
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}

/// Create index matching the device listing query
fn create_record_index(conn: &Connection) -> Result<(), String> {
    info!("Creating index on device_id, record_type, created_at");

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_record_device_type_created
        ON record (device_id, record_type, created_at DESC, id DESC)",
        [],
    ).map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
             AND name IN ('user', 'device_binding', 'record')",
            [],
            |row| row.get(0),
        ).unwrap();
        assert_eq!(tables, 3);
    }
}
