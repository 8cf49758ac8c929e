use chrono::{DateTime, NaiveDate, Utc};
use health_monitor_data::models::{NewRecord, NewUser, StoredRecord, StoredUser};

use crate::entities::record::{Record, RecordMeasurements, RecordType};
use crate::entities::user::{Gender, RegisterUser, User, BIRTH_DATE_FORMAT};

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert a stored user row into a domain user.
/// Fails when the row holds a gender or birth date the domain cannot represent.
pub fn convert_to_domain_user(data_user: StoredUser) -> Result<User, String> {
    let gender = data_user.gender.parse::<Gender>()?;
    let birth_date = NaiveDate::parse_from_str(&data_user.birth_date, BIRTH_DATE_FORMAT)
        .map_err(|e| format!("Invalid stored birth date '{}': {}", data_user.birth_date, e))?;

    Ok(User {
        id: data_user.id,
        phone_number: data_user.phone_number,
        national_id: data_user.national_id,
        full_name: data_user.full_name,
        hashed_password: data_user.hashed_password,
        device_id: data_user.device_id,
        gender,
        birth_date,
        height: data_user.height,
        weight: data_user.weight,
        sickness: data_user.sickness,
        sickness_history: data_user.sickness_history,
        family_sickness_history: data_user.family_sickness_history,
        medicines: data_user.medicines,
        allergies: data_user.allergies,
    })
}

/// Convert a validated registration into a storage row; the plaintext password is left behind
pub fn convert_to_data_new_user(request: &RegisterUser, hashed_password: String) -> NewUser {
    NewUser {
        phone_number: request.phone_number.clone(),
        national_id: request.national_id.clone(),
        full_name: request.full_name.clone(),
        hashed_password,
        gender: request.gender.as_str().to_string(),
        birth_date: request.birth_date.clone(),
        height: request.height,
        weight: request.weight,
        sickness: request.sickness.clone(),
        sickness_history: request.sickness_history.clone(),
        family_sickness_history: request.family_sickness_history.clone(),
        medicines: request.medicines.clone(),
        allergies: request.allergies.clone(),
    }
}

/// Convert a stored record row into a domain record
pub fn convert_to_domain_record(data_record: StoredRecord) -> Result<Record, String> {
    let record_type = data_record.record_type.parse::<RecordType>()?;

    Ok(Record {
        id: data_record.id,
        device_id: data_record.device_id,
        created_at: data_record.created_at,
        record_type,
        measurements: RecordMeasurements {
            heart_rate: data_record.heart_rate,
            body_temperature: data_record.body_temperature,
            spo2: data_record.spo2,
            blood_pressure: data_record.blood_pressure,
            ecg: data_record.ecg,
            acc: data_record.acc,
            gps: data_record.gps,
        },
    })
}

/// Convert measurements into a storage row for a device
pub fn convert_to_data_new_record(
    measurements: RecordMeasurements,
    record_type: RecordType,
    device_id: &str,
    created_at: DateTime<Utc>,
) -> NewRecord {
    NewRecord {
        device_id: device_id.to_string(),
        created_at,
        record_type: record_type.as_str().to_string(),
        heart_rate: measurements.heart_rate,
        body_temperature: measurements.body_temperature,
        spo2: measurements.spo2,
        blood_pressure: measurements.blood_pressure,
        ecg: measurements.ecg,
        acc: measurements.acc,
        gps: measurements.gps,
    }
}
