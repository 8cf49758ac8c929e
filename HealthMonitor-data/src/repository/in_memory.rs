use std::sync::{Arc, Mutex};
use std::collections::{BTreeMap, HashMap};
use chrono::{DateTime, Utc};

use crate::models::{DeviceBinding, NewRecord, NewUser, RecordQuery, StoredRecord, StoredUser};
use super::errors::RepositoryError;
use super::storage::UserLookup;

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<i64, StoredUser>,
    next_user_id: i64,
    /// device_id -> binding
    bindings: HashMap<String, DeviceBinding>,
    records: Vec<StoredRecord>,
    next_record_id: i64,
}

impl State {
    fn with_device(&self, user: &StoredUser) -> StoredUser {
        let mut user = user.clone();
        user.device_id = self.bindings
            .values()
            .find(|binding| binding.user_id == user.id)
            .map(|binding| binding.device_id.clone());
        user
    }
}

/// In-memory storage for users, device bindings and records.
/// One mutex guards everything so each operation is atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<Mutex<State>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a user, rejecting duplicate phone numbers and national ids
    pub async fn insert_user(&self, user: NewUser) -> Result<StoredUser, RepositoryError> {
        let mut state = self.state.lock()?;

        if state.users.values().any(|u| u.phone_number == user.phone_number) {
            return Err(RepositoryError::Conflict("UNIQUE constraint failed: user.phone_number".to_string()));
        }
        if state.users.values().any(|u| u.national_id == user.national_id) {
            return Err(RepositoryError::Conflict("UNIQUE constraint failed: user.national_id".to_string()));
        }

        state.next_user_id += 1;
        let stored = user.into_stored(state.next_user_id);
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    pub(crate) async fn find_user(&self, lookup: UserLookup<'_>) -> Result<Option<StoredUser>, RepositoryError> {
        let state = self.state.lock()?;

        let user = match lookup {
            UserLookup::Id(id) => state.users.get(&id),
            UserLookup::Phone(phone) => state.users.values().find(|u| u.phone_number == phone),
            UserLookup::NationalId(national_id) => state.users.values().find(|u| u.national_id == national_id),
        };

        Ok(user.map(|u| state.with_device(u)))
    }

    /// Bind a device to a user, failing when another user holds it
    pub async fn bind_device(
        &self,
        user_id: i64,
        device_id: &str,
        bound_at: DateTime<Utc>,
    ) -> Result<DeviceBinding, RepositoryError> {
        let mut state = self.state.lock()?;

        if !state.users.contains_key(&user_id) {
            return Err(RepositoryError::NotFound(format!("user {}", user_id)));
        }

        if let Some(binding) = state.bindings.get(device_id) {
            if binding.user_id != user_id {
                return Err(RepositoryError::Conflict(format!(
                    "device {} is bound to another account",
                    device_id
                )));
            }
            return Ok(binding.clone());
        }

        state.bindings.retain(|_, binding| binding.user_id != user_id);

        let binding = DeviceBinding {
            device_id: device_id.to_string(),
            user_id,
            bound_at,
        };
        state.bindings.insert(device_id.to_string(), binding.clone());
        Ok(binding)
    }

    /// Release the user's device, returning whether a binding existed
    pub async fn unbind_device(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock()?;
        let before = state.bindings.len();
        state.bindings.retain(|_, binding| binding.user_id != user_id);
        Ok(state.bindings.len() != before)
    }

    /// Store a record
    pub async fn insert_record(&self, record: NewRecord) -> Result<StoredRecord, RepositoryError> {
        let mut state = self.state.lock()?;
        state.next_record_id += 1;
        let stored = record.into_stored(state.next_record_id);
        state.records.push(stored.clone());
        Ok(stored)
    }

    /// Page of records for a device and type, newest first, with the total match count
    pub async fn query_records(&self, query: &RecordQuery) -> Result<(Vec<StoredRecord>, usize), RepositoryError> {
        let state = self.state.lock()?;
        Ok(page_records(state.records.iter(), query))
    }
}

/// Filter, order and paginate records the same way the SQL query does
pub(crate) fn page_records<'a>(
    records: impl Iterator<Item = &'a StoredRecord>,
    query: &RecordQuery,
) -> (Vec<StoredRecord>, usize) {
    let mut matching: Vec<&StoredRecord> = records
        .filter(|r| r.device_id == query.device_id && r.record_type == query.record_type)
        .collect();

    matching.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });

    let total = matching.len();
    let page = matching
        .into_iter()
        .skip(query.skip)
        .take(query.limit)
        .cloned()
        .collect();

    (page, total)
}
