use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tracing::{info, warn};

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    /// Successful password login
    Login,
    /// Failed login attempt
    FailedLogin,
    /// User registration
    Registration,
    /// Bearer token validation
    TokenValidation,
    /// Access denied to resource
    AccessDenied,
    /// Device bound to an account
    DeviceBinding,
    /// Device released from an account
    DeviceUnbinding,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
            AuthEventType::AccessDenied => write!(f, "ACCESS_DENIED"),
            AuthEventType::DeviceBinding => write!(f, "DEVICE_BINDING"),
            AuthEventType::DeviceUnbinding => write!(f, "DEVICE_UNBINDING"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    /// Type of authentication event
    pub event_type: AuthEventType,
    /// User ID (if available)
    pub user_id: Option<String>,
    /// Timestamp when the event occurred
    pub timestamp: DateTime<Utc>,
    /// Whether the event was successful
    pub success: bool,
    /// Additional details about the event
    pub details: Option<String>,
    /// The resource being accessed (if applicable)
    pub resource: Option<String>,
    /// Duration of the operation in milliseconds (if applicable)
    pub duration_ms: Option<u64>,
    /// Authentication method used (password, jwt)
    pub auth_method: Option<String>,
}

impl AuthEvent {
    /// Create a new authentication event
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    /// Set the details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Set the resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Set the authentication method
    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Log an authentication event
pub fn log_auth_event(event: AuthEvent) {
    let user_id_str = event.user_id.as_deref().unwrap_or("anonymous");
    let details = event.details.as_deref().unwrap_or("");
    let resource = event.resource.as_deref().unwrap_or("-");

    if event.success {
        info!(
            event_type = %event.event_type,
            auth_method = event.auth_method.as_deref().unwrap_or("-"),
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [SUCCESS] [{}] [{}] {}",
            event.event_type,
            user_id_str,
            event.timestamp.to_rfc3339(),
            resource,
            details
        );
    } else {
        warn!(
            event_type = %event.event_type,
            auth_method = event.auth_method.as_deref().unwrap_or("-"),
            duration_ms = event.duration_ms,
            "AUTH-LOG [{}] [{}] [FAILURE] [{}] [{}] {}",
            event.event_type,
            user_id_str,
            event.timestamp.to_rfc3339(),
            resource,
            details
        );
    }
}

/// Log a failed login attempt; the phone number stands in for the unknown user
pub fn log_failed_login(phone_number: &str, reason: &str) {
    let event = AuthEvent::new(AuthEventType::FailedLogin, Some(phone_number), false)
        .with_details(reason)
        .with_auth_method("password");

    log_auth_event(event);
}

/// Log a registration attempt
pub fn log_registration(user_id: Option<&str>, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::Registration, user_id, success);

    if let Some(d) = details {
        event = event.with_details(d);
    }

    log_auth_event(event);
}

/// Log a device binding change
pub fn log_device_binding(user_id: &str, device_id: Option<&str>, success: bool, details: Option<&str>) {
    let event_type = if device_id.is_some() {
        AuthEventType::DeviceBinding
    } else {
        AuthEventType::DeviceUnbinding
    };

    let mut event = AuthEvent::new(event_type, Some(user_id), success);

    if let Some(device_id) = device_id {
        event = event.with_resource(format!("device:{}", device_id));
    }

    if let Some(d) = details {
        event = event.with_details(d);
    }

    log_auth_event(event);
}

/// Log an access denied event
pub fn log_access_denied(user_id: &str, resource: &str, reason: &str) {
    let event = AuthEvent::new(AuthEventType::AccessDenied, Some(user_id), false)
        .with_resource(resource)
        .with_details(reason);

    log_auth_event(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_auth_event() {
        let event = AuthEvent::new(AuthEventType::Login, Some("user123"), true)
            .with_details("Login from mobile app")
            .with_resource("/api/v1/login/access-token")
            .with_duration(150)
            .with_auth_method("password");

        assert_eq!(event.event_type, AuthEventType::Login);
        assert_eq!(event.user_id, Some("user123".to_string()));
        assert!(event.success);
        assert_eq!(event.details, Some("Login from mobile app".to_string()));
        assert_eq!(event.resource, Some("/api/v1/login/access-token".to_string()));
        assert_eq!(event.duration_ms, Some(150));
        assert_eq!(event.auth_method, Some("password".to_string()));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::Login.to_string(), "LOGIN");
        assert_eq!(AuthEventType::FailedLogin.to_string(), "FAILED_LOGIN");
        assert_eq!(AuthEventType::DeviceBinding.to_string(), "DEVICE_BINDING");
        assert_eq!(AuthEventType::DeviceUnbinding.to_string(), "DEVICE_UNBINDING");
    }

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_failed_login("09120000000", "Invalid credentials");
        log_registration(Some("1"), true, None);
        log_device_binding("1", Some("dev-1"), false, Some("device is bound to another account"));
        log_device_binding("1", None, true, None);
        log_access_denied("1", "/api/v1/record", "No device is bound to this account");
    }
}
