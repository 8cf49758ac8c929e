// Domain entities and value objects
pub mod conversions;
pub mod record;
pub mod user;

// Re-export common types for easier imports
pub use record::{Record, RecordMeasurements, RecordPage, RecordType};
pub use user::{BindDevice, Gender, RegisterUser, User};
