use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;

use crate::models::{DeviceBinding, NewRecord, NewUser, RecordQuery, StoredRecord, StoredUser};
use crate::database::DatabasePool;
use super::errors::RepositoryError;

/// Columns selected for a user row, joined with its device binding
const USER_COLUMNS: &str =
    "u.id, u.phone_number, u.national_id, u.full_name, u.hashed_password, b.device_id,
     u.gender, u.birth_date, u.height, u.weight, u.sickness,
     u.sickness_history, u.family_sickness_history, u.medicines, u.allergies";

const RECORD_COLUMNS: &str =
    "id, device_id, created_at, record_type, heart_rate, body_temperature, spo2,
     blood_pressure, ecg, acc, gps";

/// Format a timestamp as fixed-width RFC 3339 so that text order is time order
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_list(row: &Row<'_>, idx: usize) -> rusqlite::Result<Vec<String>> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<StoredUser> {
    Ok(StoredUser {
        id: row.get(0)?,
        phone_number: row.get(1)?,
        national_id: row.get(2)?,
        full_name: row.get(3)?,
        hashed_password: row.get(4)?,
        device_id: row.get(5)?,
        gender: row.get(6)?,
        birth_date: row.get(7)?,
        height: row.get(8)?,
        weight: row.get(9)?,
        sickness: row.get(10)?,
        sickness_history: parse_list(row, 11)?,
        family_sickness_history: parse_list(row, 12)?,
        medicines: parse_list(row, 13)?,
        allergies: parse_list(row, 14)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        device_id: row.get(1)?,
        created_at: parse_timestamp(row, 2)?,
        record_type: row.get(3)?,
        heart_rate: row.get(4)?,
        body_temperature: row.get(5)?,
        spo2: row.get(6)?,
        blood_pressure: row.get(7)?,
        ecg: row.get(8)?,
        acc: row.get(9)?,
        gps: row.get(10)?,
    })
}

fn binding_from_row(row: &Row<'_>) -> rusqlite::Result<DeviceBinding> {
    Ok(DeviceBinding {
        device_id: row.get(0)?,
        user_id: row.get(1)?,
        bound_at: parse_timestamp(row, 2)?,
    })
}

/// Lookup key for a single user
#[derive(Debug, Clone, Copy)]
pub(crate) enum UserLookup<'a> {
    Id(i64),
    Phone(&'a str),
    NationalId(&'a str),
}

/// Database storage operations for users, device bindings and records
pub struct DatabaseStorage;

impl DatabaseStorage {
    /// Insert a user; duplicate phone number or national id surfaces as a conflict
    pub async fn insert_user(pool: &DatabasePool, user: NewUser) -> Result<StoredUser, RepositoryError> {
        debug!("Storing user in database: phone_number={}", user.phone_number);

        let conn = pool.connection()?;
        conn.execute(
            "INSERT INTO user
             (phone_number, national_id, full_name, hashed_password, gender, birth_date,
              height, weight, sickness, sickness_history, family_sickness_history, medicines, allergies)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                user.phone_number,
                user.national_id,
                user.full_name,
                user.hashed_password,
                user.gender,
                user.birth_date,
                user.height,
                user.weight,
                user.sickness,
                serde_json::to_string(&user.sickness_history)?,
                serde_json::to_string(&user.family_sickness_history)?,
                serde_json::to_string(&user.medicines)?,
                serde_json::to_string(&user.allergies)?,
            ],
        )?;

        let id = conn.last_insert_rowid();
        debug!("Stored user with id={}", id);
        Ok(user.into_stored(id))
    }

    /// Find a single user together with its bound device
    pub(crate) async fn find_user(pool: &DatabasePool, lookup: UserLookup<'_>) -> Result<Option<StoredUser>, RepositoryError> {
        debug!("Looking up user in database: {:?}", lookup);

        let conn = pool.connection()?;
        let (filter, value): (&str, rusqlite::types::Value) = match lookup {
            UserLookup::Id(id) => ("u.id = ?1", id.into()),
            UserLookup::Phone(phone) => ("u.phone_number = ?1", phone.to_string().into()),
            UserLookup::NationalId(national_id) => ("u.national_id = ?1", national_id.to_string().into()),
        };

        let sql = format!(
            "SELECT {} FROM user u LEFT JOIN device_binding b ON b.user_id = u.id WHERE {}",
            USER_COLUMNS, filter
        );

        let user = conn
            .query_row(&sql, [value], user_from_row)
            .optional()?;

        Ok(user)
    }

    /// Bind a device to a user inside one transaction.
    /// Fails with a conflict when another user holds the device.
    pub async fn bind_device(
        pool: &DatabasePool,
        user_id: i64,
        device_id: &str,
        bound_at: DateTime<Utc>,
    ) -> Result<DeviceBinding, RepositoryError> {
        debug!("Binding device {} to user {}", device_id, user_id);

        let mut conn = pool.connection()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let user_exists = tx
            .query_row("SELECT 1 FROM user WHERE id = ?1", [user_id], |_| Ok(()))
            .optional()?
            .is_some();
        if !user_exists {
            return Err(RepositoryError::NotFound(format!("user {}", user_id)));
        }

        let existing = tx
            .query_row(
                "SELECT device_id, user_id, bound_at FROM device_binding WHERE device_id = ?1",
                [device_id],
                binding_from_row,
            )
            .optional()?;

        if let Some(binding) = existing {
            if binding.user_id != user_id {
                return Err(RepositoryError::Conflict(format!(
                    "device {} is bound to another account",
                    device_id
                )));
            }
            // Already bound to this user
            tx.commit()?;
            return Ok(binding);
        }

        tx.execute("DELETE FROM device_binding WHERE user_id = ?1", [user_id])?;
        tx.execute(
            "INSERT INTO device_binding (device_id, user_id, bound_at) VALUES (?1, ?2, ?3)",
            params![device_id, user_id, format_timestamp(&bound_at)],
        )?;
        tx.commit()?;

        Ok(DeviceBinding {
            device_id: device_id.to_string(),
            user_id,
            bound_at,
        })
    }

    /// Release the user's device, returning whether a binding existed
    pub async fn unbind_device(pool: &DatabasePool, user_id: i64) -> Result<bool, RepositoryError> {
        debug!("Unbinding device from user {}", user_id);

        let conn = pool.connection()?;
        let removed = conn.execute("DELETE FROM device_binding WHERE user_id = ?1", [user_id])?;
        Ok(removed > 0)
    }

    /// Insert a record
    pub async fn insert_record(pool: &DatabasePool, record: NewRecord) -> Result<StoredRecord, RepositoryError> {
        debug!("Storing {} record for device {}", record.record_type, record.device_id);

        let conn = pool.connection()?;
        conn.execute(
            "INSERT INTO record
             (device_id, created_at, record_type, heart_rate, body_temperature, spo2,
              blood_pressure, ecg, acc, gps)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.device_id,
                format_timestamp(&record.created_at),
                record.record_type,
                record.heart_rate,
                record.body_temperature,
                record.spo2,
                record.blood_pressure,
                record.ecg,
                record.acc,
                record.gps,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Ok(record.into_stored(id))
    }

    /// Page of records for a device and type, newest first, with the total match count
    pub async fn query_records(pool: &DatabasePool, query: &RecordQuery) -> Result<(Vec<StoredRecord>, usize), RepositoryError> {
        debug!(
            "Querying records from database: device_id={}, record_type={}, skip={}, limit={}",
            query.device_id, query.record_type, query.skip, query.limit
        );

        let conn = pool.connection()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM record WHERE device_id = ?1 AND record_type = ?2",
            params![query.device_id, query.record_type],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {} FROM record
             WHERE device_id = ?1 AND record_type = ?2
             ORDER BY created_at DESC, id DESC
             LIMIT ?3 OFFSET ?4",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                query.device_id,
                query.record_type,
                i64::try_from(query.limit).unwrap_or(i64::MAX),
                i64::try_from(query.skip).unwrap_or(i64::MAX),
            ],
            record_from_row,
        )?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }

        Ok((records, usize::try_from(total).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_timestamp_is_fixed_width_and_ordered() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let later = early + Duration::nanoseconds(1);

        let a = format_timestamp(&early);
        let b = format_timestamp(&later);

        assert_eq!(a, "2024-01-01T08:00:00.000000000Z");
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }
}
