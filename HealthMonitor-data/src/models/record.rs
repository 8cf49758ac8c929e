use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Default page size for record listings
pub const DEFAULT_PAGE_LIMIT: usize = 100;

/// Storage model for a device record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Server-assigned identifier, increasing with insertion order
    pub id: i64,

    /// Device that produced the record
    pub device_id: String,

    /// Insertion time
    pub created_at: DateTime<Utc>,

    /// Record type name (`VIDEO`, `SOUND`, `MOTION`, `ECG`, `ORT`)
    pub record_type: String,

    /// Heart rate in beats per minute
    pub heart_rate: Option<i32>,

    /// Body temperature in degrees Celsius
    pub body_temperature: Option<f64>,

    /// Oxygen saturation percentage
    pub spo2: Option<i32>,

    /// Blood pressure as text, e.g. `120/80`
    pub blood_pressure: Option<String>,

    /// Opaque ECG payload reference
    pub ecg: Option<String>,

    /// Opaque accelerometer payload reference
    pub acc: Option<String>,

    /// Opaque location payload reference
    pub gps: Option<String>,
}

/// Input data for inserting a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub record_type: String,
    pub heart_rate: Option<i32>,
    pub body_temperature: Option<f64>,
    pub spo2: Option<i32>,
    pub blood_pressure: Option<String>,
    pub ecg: Option<String>,
    pub acc: Option<String>,
    pub gps: Option<String>,
}

impl NewRecord {
    /// Build the stored row once an id has been assigned
    pub fn into_stored(self, id: i64) -> StoredRecord {
        StoredRecord {
            id,
            device_id: self.device_id,
            created_at: self.created_at,
            record_type: self.record_type,
            heart_rate: self.heart_rate,
            body_temperature: self.body_temperature,
            spo2: self.spo2,
            blood_pressure: self.blood_pressure,
            ecg: self.ecg,
            acc: self.acc,
            gps: self.gps,
        }
    }
}

/// Page of records for one device and record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub device_id: String,
    pub record_type: String,
    /// Zero-based offset
    pub skip: usize,
    pub limit: usize,
}

impl RecordQuery {
    /// Query with the default page size
    pub fn new(device_id: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            record_type: record_type.into(),
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }
}
