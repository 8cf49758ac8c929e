use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Kind of signal a record carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    Video,
    Sound,
    Motion,
    Ecg,
    Ort,
}

impl RecordType {
    /// All record types in declaration order
    pub const ALL: [RecordType; 5] = [
        RecordType::Video,
        RecordType::Sound,
        RecordType::Motion,
        RecordType::Ecg,
        RecordType::Ort,
    ];

    /// Wire and storage spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Video => "VIDEO",
            RecordType::Sound => "SOUND",
            RecordType::Motion => "MOTION",
            RecordType::Ecg => "ECG",
            RecordType::Ort => "ORT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown record type: {}", s))
    }
}

/// Measurements carried by a record; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordMeasurements {
    /// Heart rate in beats per minute
    #[validate(range(min = 20, max = 300, message = "Heart rate must be between 20 and 300 bpm"))]
    pub heart_rate: Option<i32>,

    /// Body temperature in degrees Celsius
    #[validate(range(min = 25.0, max = 45.0, message = "Body temperature must be between 25 and 45 °C"))]
    pub body_temperature: Option<f64>,

    /// Oxygen saturation percentage
    #[validate(range(min = 0, max = 100, message = "SPO2 must be between 0 and 100"))]
    pub spo2: Option<i32>,

    /// Blood pressure such as `120/80`
    #[validate(length(max = 16, message = "Blood pressure cannot exceed 16 characters"))]
    pub blood_pressure: Option<String>,

    #[validate(length(max = 2048, message = "ECG reference cannot exceed 2048 characters"))]
    pub ecg: Option<String>,

    #[validate(length(max = 2048, message = "Accelerometer reference cannot exceed 2048 characters"))]
    pub acc: Option<String>,

    #[validate(length(max = 2048, message = "GPS reference cannot exceed 2048 characters"))]
    pub gps: Option<String>,
}

/// A stored device record
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub device_id: String,
    pub created_at: DateTime<Utc>,
    pub record_type: RecordType,
    pub measurements: RecordMeasurements,
}

/// One page of records plus the number of matches across all pages
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordPage {
    pub data: Vec<Record>,
    pub count: usize,
}

impl RecordPage {
    pub fn empty() -> Self {
        Self::default()
    }
}
