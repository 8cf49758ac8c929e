// Database migrations module
// Migrations are idempotent CREATE ... IF NOT EXISTS statements run at pool start-up

mod sqlite;
pub use sqlite::run_migrations as run_sqlite_migrations;
