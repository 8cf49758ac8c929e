use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Storage model for a registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredUser {
    /// Server-assigned identifier
    pub id: i64,

    /// Login phone number, unique
    pub phone_number: String,

    /// National identification number, unique
    pub national_id: String,

    pub full_name: Option<String>,

    /// Argon2 PHC string
    pub hashed_password: String,

    /// Device currently bound to the user, resolved from `device_binding`
    pub device_id: Option<String>,

    /// `male` or `female`
    pub gender: String,

    /// Birth date as `YYYY-MM-DD`
    pub birth_date: String,

    /// Height in centimetres
    pub height: i32,

    /// Weight in kilograms
    pub weight: i32,

    pub sickness: String,
    pub sickness_history: Vec<String>,
    pub family_sickness_history: Vec<String>,
    pub medicines: Vec<String>,
    pub allergies: Vec<String>,
}

/// Input data for inserting a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub phone_number: String,
    pub national_id: String,
    pub full_name: Option<String>,
    pub hashed_password: String,
    pub gender: String,
    pub birth_date: String,
    pub height: i32,
    pub weight: i32,
    pub sickness: String,
    pub sickness_history: Vec<String>,
    pub family_sickness_history: Vec<String>,
    pub medicines: Vec<String>,
    pub allergies: Vec<String>,
}

impl NewUser {
    /// Build the stored row once an id has been assigned
    pub fn into_stored(self, id: i64) -> StoredUser {
        StoredUser {
            id,
            phone_number: self.phone_number,
            national_id: self.national_id,
            full_name: self.full_name,
            hashed_password: self.hashed_password,
            device_id: None,
            gender: self.gender,
            birth_date: self.birth_date,
            height: self.height,
            weight: self.weight,
            sickness: self.sickness,
            sickness_history: self.sickness_history,
            family_sickness_history: self.family_sickness_history,
            medicines: self.medicines,
            allergies: self.allergies,
        }
    }
}

/// Ownership of a device by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub device_id: String,
    pub user_id: i64,
    pub bound_at: DateTime<Utc>,
}
