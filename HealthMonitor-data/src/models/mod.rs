// Storage models
pub mod record;
pub mod user;

pub use record::{NewRecord, RecordQuery, StoredRecord, DEFAULT_PAGE_LIMIT};
pub use user::{DeviceBinding, NewUser, StoredUser};
