//! Device-scoped access control
//!
//! Callers only ever see and write records of the device bound to their own
//! account. A [`DeviceScope`] is derived from the authenticated user and is
//! the only way the record service learns which device to use.

use crate::entities::User;

/// The device an authenticated caller may act on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceScope {
    user_id: i64,
    device_id: Option<String>,
}

impl DeviceScope {
    /// Scope of the given user
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            device_id: user.device_id.clone(),
        }
    }

    /// Id of the user the scope belongs to
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Bound device, if any
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }
}
