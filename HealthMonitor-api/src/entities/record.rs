use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use utoipa::{IntoParams, ToSchema};

use health_monitor_domain::entities::{Record, RecordMeasurements, RecordPage, RecordType};

/// Record type as exchanged on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PublicRecordType {
    Video,
    Sound,
    Motion,
    Ecg,
    Ort,
}

impl From<PublicRecordType> for RecordType {
    fn from(record_type: PublicRecordType) -> Self {
        match record_type {
            PublicRecordType::Video => RecordType::Video,
            PublicRecordType::Sound => RecordType::Sound,
            PublicRecordType::Motion => RecordType::Motion,
            PublicRecordType::Ecg => RecordType::Ecg,
            PublicRecordType::Ort => RecordType::Ort,
        }
    }
}

impl From<RecordType> for PublicRecordType {
    fn from(record_type: RecordType) -> Self {
        match record_type {
            RecordType::Video => PublicRecordType::Video,
            RecordType::Sound => PublicRecordType::Sound,
            RecordType::Motion => PublicRecordType::Motion,
            RecordType::Ecg => PublicRecordType::Ecg,
            RecordType::Ort => PublicRecordType::Ort,
        }
    }
}

/// Measurements submitted by a device. The device itself is taken from the
/// caller's account, never from the body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PublicCreateRecordRequest {
    /// Beats per minute, 20 to 300
    pub heart_rate: Option<i32>,

    /// Degrees Celsius, 25 to 45
    pub body_temperature: Option<f64>,

    /// Oxygen saturation percentage, 0 to 100
    pub spo2: Option<i32>,

    #[schema(example = "120/80")]
    pub blood_pressure: Option<String>,

    /// Reference to the stored ECG trace
    pub ecg: Option<String>,

    /// Reference to the stored accelerometer trace
    pub acc: Option<String>,

    /// Reference to the stored GPS trace
    pub gps: Option<String>,
}

/// Public representation of a record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicRecord {
    pub id: i64,

    /// Assigned by the server at insertion
    pub created_at: DateTime<Utc>,

    pub record_type: PublicRecordType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spo2: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecg: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub acc: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gps: Option<String>,
}

/// A page of records, newest first, with the number of matches across all pages
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicRecordPage {
    pub data: Vec<PublicRecord>,
    pub count: usize,
}

/// Query parameters for listing records
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordListParams {
    /// Zero-based offset into the result set
    pub skip: usize,

    /// Page size (default: 100, max: 1000)
    pub limit: Option<usize>,

    /// Record type to list
    #[param(value_type = PublicRecordType)]
    pub rtype: PublicRecordType,
}

/// Query parameters for creating a record
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordTypeParams {
    /// Type of the record being submitted
    #[param(value_type = PublicRecordType)]
    pub rtype: PublicRecordType,
}

pub fn convert_to_domain_measurements(request: PublicCreateRecordRequest) -> RecordMeasurements {
    RecordMeasurements {
        heart_rate: request.heart_rate,
        body_temperature: request.body_temperature,
        spo2: request.spo2,
        blood_pressure: request.blood_pressure,
        ecg: request.ecg,
        acc: request.acc,
        gps: request.gps,
    }
}

/// Convert a domain record to its public form; the device id is dropped
pub fn convert_to_public_record(record: Record) -> PublicRecord {
    let m = record.measurements;
    PublicRecord {
        id: record.id,
        created_at: record.created_at,
        record_type: record.record_type.into(),
        heart_rate: m.heart_rate,
        body_temperature: m.body_temperature,
        spo2: m.spo2,
        blood_pressure: m.blood_pressure,
        ecg: m.ecg,
        acc: m.acc,
        gps: m.gps,
    }
}

pub fn convert_to_public_page(page: RecordPage) -> PublicRecordPage {
    PublicRecordPage {
        data: page.data.into_iter().map(convert_to_public_record).collect(),
        count: page.count,
    }
}
