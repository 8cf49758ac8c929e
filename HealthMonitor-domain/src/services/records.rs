use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, warn};
use chrono::Utc;
use validator::Validate;
use async_trait::async_trait;

use health_monitor_data::models::RecordQuery;
use health_monitor_data::repository::{RecordRepository, RecordRepositoryTrait, RepositoryError};
use crate::auth::access::DeviceScope;
use crate::auth::logging::log_access_denied;
use crate::entities::conversions;
use crate::entities::{Record, RecordMeasurements, RecordPage, RecordType};
use super::format_validation_errors;

pub use health_monitor_data::models::DEFAULT_PAGE_LIMIT;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Message returned when a caller without a device tries to write
pub const NO_DEVICE_BOUND: &str = "No device is bound to this account";

/// Record service errors
#[derive(Debug, Error)]
pub enum RecordServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Trait for record ingestion and retrieval
#[async_trait]
pub trait RecordServiceTrait: Send + Sync {
    /// Store a record for the caller's device; id and creation time are assigned here
    async fn create_record(
        &self,
        scope: &DeviceScope,
        record_type: RecordType,
        measurements: RecordMeasurements,
    ) -> Result<Record, RecordServiceError>;

    /// Page through the caller's records of one type, newest first.
    /// `limit` defaults to [`DEFAULT_PAGE_LIMIT`] and is capped at [`MAX_PAGE_LIMIT`].
    async fn list_records(
        &self,
        scope: &DeviceScope,
        record_type: RecordType,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<RecordPage, RecordServiceError>;
}

/// Record service for domain logic
pub struct RecordService<R: RecordRepositoryTrait> {
    repository: R,
}

impl<R: RecordRepositoryTrait> RecordService<R> {
    /// Create a new record service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> RecordServiceError {
        error!("Record repository failure: {}", err);
        RecordServiceError::RepositoryError(err.to_string())
    }

    fn to_domain(&self, data_record: health_monitor_data::models::StoredRecord) -> Result<Record, RecordServiceError> {
        conversions::convert_to_domain_record(data_record).map_err(|e| {
            error!("Stored record cannot be converted: {}", e);
            RecordServiceError::RepositoryError(e)
        })
    }
}

#[async_trait]
impl<R: RecordRepositoryTrait> RecordServiceTrait for RecordService<R> {
    async fn create_record(
        &self,
        scope: &DeviceScope,
        record_type: RecordType,
        measurements: RecordMeasurements,
    ) -> Result<Record, RecordServiceError> {
        if let Err(validation_errors) = measurements.validate() {
            let message = format_validation_errors(&validation_errors);
            warn!("Rejected {} record: {}", record_type, message);
            return Err(RecordServiceError::ValidationError(message));
        }

        let device_id = match scope.device_id() {
            Some(device_id) => device_id,
            None => {
                log_access_denied(&scope.user_id().to_string(), "record", NO_DEVICE_BOUND);
                return Err(RecordServiceError::ValidationError(NO_DEVICE_BOUND.to_string()));
            }
        };

        let data_record = conversions::convert_to_data_new_record(
            measurements,
            record_type,
            device_id,
            Utc::now(),
        );

        let stored = self.repository.create(data_record)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        debug!("Stored {} record {} for device {}", record_type, stored.id, device_id);
        self.to_domain(stored)
    }

    async fn list_records(
        &self,
        scope: &DeviceScope,
        record_type: RecordType,
        skip: usize,
        limit: Option<usize>,
    ) -> Result<RecordPage, RecordServiceError> {
        let device_id = match scope.device_id() {
            Some(device_id) => device_id,
            None => {
                debug!("User {} has no bound device, returning an empty page", scope.user_id());
                return Ok(RecordPage::empty());
            }
        };

        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT);
        let query = RecordQuery::new(device_id, record_type.as_str()).page(skip, limit);

        let (data_records, count) = self.repository.query_by_device(&query)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        let data = data_records
            .into_iter()
            .map(|r| self.to_domain(r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordPage { data, count })
    }
}

/// Create a record service on the given repository
pub fn create_record_service<R>(repository: R) -> Arc<dyn RecordServiceTrait>
where
    R: RecordRepositoryTrait + 'static,
{
    Arc::new(RecordService::new(repository))
}

/// Create a default record service using the repository from data layer
pub fn create_default_record_service() -> Arc<dyn RecordServiceTrait> {
    create_record_service(RecordRepository::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};
    use health_monitor_data::models::StoredRecord;
    use health_monitor_data::repository::tests::MockRecordRepository;

    fn scope(device_id: Option<&str>) -> DeviceScope {
        let mut user = crate::entities::conversions::convert_to_domain_user(
            crate::entities::conversions::convert_to_data_new_user(
                &crate::entities::user::tests::registration(),
                "hash".to_string(),
            )
            .into_stored(1),
        )
        .unwrap();
        user.device_id = device_id.map(String::from);
        DeviceScope::for_user(&user)
    }

    fn stored(id: i64, device_id: &str, record_type: &str, created_at: DateTime<Utc>) -> StoredRecord {
        StoredRecord {
            id,
            device_id: device_id.to_string(),
            created_at,
            record_type: record_type.to_string(),
            heart_rate: Some(70),
            body_temperature: None,
            spo2: None,
            blood_pressure: None,
            ecg: None,
            acc: None,
            gps: None,
        }
    }

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[tokio::test]
    async fn test_create_record_assigns_time_and_device() {
        let repository = MockRecordRepository::new();
        let service = RecordService::new(repository.clone());
        let before = Utc::now();

        let record = service
            .create_record(
                &scope(Some("dev-1")),
                RecordType::Ecg,
                RecordMeasurements { heart_rate: Some(75), ..Default::default() },
            )
            .await
            .unwrap();

        assert!(record.created_at >= before);
        assert_eq!(record.device_id, "dev-1");
        assert_eq!(record.record_type, RecordType::Ecg);
        assert_eq!(repository.records().len(), 1);
        assert_eq!(repository.records()[0].record_type, "ECG");
    }

    #[tokio::test]
    async fn test_create_record_without_device_is_rejected() {
        let repository = MockRecordRepository::new();
        let service = RecordService::new(repository.clone());

        let err = service
            .create_record(&scope(None), RecordType::Ecg, RecordMeasurements::default())
            .await
            .unwrap_err();

        assert!(matches!(err, RecordServiceError::ValidationError(ref m) if m == NO_DEVICE_BOUND));
        assert!(repository.records().is_empty());
    }

    #[tokio::test]
    async fn test_create_record_validates_before_storage() {
        let repository = MockRecordRepository::new();
        let service = RecordService::new(repository.clone());

        let err = service
            .create_record(
                &scope(Some("dev-1")),
                RecordType::Ort,
                RecordMeasurements { spo2: Some(150), ..Default::default() },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RecordServiceError::ValidationError(ref m) if m.contains("spo2")));
        assert!(repository.records().is_empty());
    }

    #[tokio::test]
    async fn test_list_records_newest_first_with_count() {
        let repository = MockRecordRepository::with_records(vec![
            stored(1, "dev-1", "ECG", t(1)),
            stored(2, "dev-1", "ECG", t(2)),
            stored(3, "dev-1", "ECG", t(3)),
            stored(4, "dev-1", "SOUND", t(4)),
            stored(5, "dev-2", "ECG", t(5)),
        ]);
        let service = RecordService::new(repository);

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Ecg, 0, None).await.unwrap();
        assert_eq!(page.count, 3);
        let ids: Vec<i64> = page.data.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Ecg, 1, Some(1)).await.unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].created_at, t(2));

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Ecg, 3, Some(10)).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.count, 3);

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Video, 0, None).await.unwrap();
        assert_eq!(page, RecordPage::empty());
    }

    #[tokio::test]
    async fn test_list_records_without_device_is_empty() {
        let repository = MockRecordRepository::with_records(vec![stored(1, "dev-1", "ECG", t(1))]);
        let service = RecordService::new(repository);

        let page = service.list_records(&scope(None), RecordType::Ecg, 0, None).await.unwrap();
        assert_eq!(page.count, 0);
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_list_records_caps_limit() {
        let records = (1..=1005).map(|i| stored(i, "dev-1", "MOTION", t(i))).collect();
        let service = RecordService::new(MockRecordRepository::with_records(records));

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Motion, 0, Some(5000)).await.unwrap();
        assert_eq!(page.data.len(), MAX_PAGE_LIMIT);
        assert_eq!(page.count, 1005);

        let page = service.list_records(&scope(Some("dev-1")), RecordType::Motion, 0, None).await.unwrap();
        assert_eq!(page.data.len(), DEFAULT_PAGE_LIMIT);
    }

    #[tokio::test]
    async fn test_repository_failure_is_reported() {
        let service = RecordService::new(MockRecordRepository::failing());
        let err = service.list_records(&scope(Some("dev-1")), RecordType::Ecg, 0, None).await.unwrap_err();
        assert!(matches!(err, RecordServiceError::RepositoryError(_)));
    }
}
