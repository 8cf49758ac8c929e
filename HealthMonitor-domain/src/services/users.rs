use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use chrono::Utc;
use validator::Validate;
use async_trait::async_trait;

use health_monitor_data::repository::{RepositoryError, UserRepository, UserRepositoryTrait};
use crate::auth::logging::{log_device_binding, log_registration};
use crate::auth::password::{PasswordError, PasswordManager};
use crate::entities::conversions;
use crate::entities::{BindDevice, RegisterUser, User};
use super::format_validation_errors;

/// User service errors
#[derive(Debug, Error)]
pub enum UserServiceError {
    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Phone number, national id or device already taken
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found error
    #[error("User not found: {0}")]
    NotFound(String),

    /// Password hashing failed
    #[error("Password error: {0}")]
    PasswordError(String),

    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<PasswordError> for UserServiceError {
    fn from(err: PasswordError) -> Self {
        UserServiceError::PasswordError(err.to_string())
    }
}

/// Trait for the user directory
#[async_trait]
pub trait UserServiceTrait: Send + Sync {
    /// Validate a profile, hash its password and store the new user
    async fn register(&self, request: RegisterUser) -> Result<User, UserServiceError>;

    /// Find a user by id
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError>;

    /// Find a user by phone number
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, UserServiceError>;

    /// Find a user by national id
    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<User>, UserServiceError>;

    /// The user owning `phone_number` if `password` matches; unknown phone
    /// numbers and wrong passwords are indistinguishable
    async fn authenticate(&self, phone_number: &str, password: &str) -> Result<Option<User>, UserServiceError>;

    /// Bind a device to the user and return the updated user
    async fn bind_device(&self, user: &User, request: BindDevice) -> Result<User, UserServiceError>;

    /// Release the user's device and return the updated user
    async fn unbind_device(&self, user: &User) -> Result<User, UserServiceError>;
}

/// User service for domain logic
pub struct UserService<R: UserRepositoryTrait> {
    repository: R,
    passwords: PasswordManager,
}

impl<R: UserRepositoryTrait> UserService<R> {
    /// Create a new user service
    pub fn new(repository: R, passwords: PasswordManager) -> Self {
        Self { repository, passwords }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> UserServiceError {
        match err {
            RepositoryError::NotFound(msg) => UserServiceError::NotFound(msg),
            RepositoryError::Conflict(msg) => UserServiceError::Conflict(msg),
            _ => {
                error!("User repository failure: {}", err);
                UserServiceError::RepositoryError(err.to_string())
            }
        }
    }

    fn to_domain(&self, data_user: health_monitor_data::models::StoredUser) -> Result<User, UserServiceError> {
        conversions::convert_to_domain_user(data_user).map_err(|e| {
            error!("Stored user cannot be converted: {}", e);
            UserServiceError::RepositoryError(e)
        })
    }

    async fn reload(&self, user_id: i64) -> Result<User, UserServiceError> {
        self.find_by_id(user_id)
            .await?
            .ok_or_else(|| UserServiceError::NotFound(format!("user {}", user_id)))
    }

    async fn hash_password(&self, password: String) -> Result<String, UserServiceError> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| UserServiceError::PasswordError(e.to_string()))?
            .map_err(UserServiceError::from)
    }

    async fn verify_password(&self, password: &str, hashed_password: &str) -> Result<bool, UserServiceError> {
        let passwords = self.passwords.clone();
        let password = password.to_string();
        let hashed_password = hashed_password.to_string();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hashed_password))
            .await
            .map_err(|e| UserServiceError::PasswordError(e.to_string()))
    }
}

#[async_trait]
impl<R: UserRepositoryTrait> UserServiceTrait for UserService<R> {
    async fn register(&self, request: RegisterUser) -> Result<User, UserServiceError> {
        if let Err(validation_errors) = request.validate() {
            let message = format_validation_errors(&validation_errors);
            warn!("Rejected registration: {}", message);
            return Err(UserServiceError::ValidationError(message));
        }

        // Checked up front for a field-specific message; the UNIQUE constraints are the backstop
        if self.repository.get_by_phone(&request.phone_number).await
            .map_err(|e| self.map_repo_error(e))?
            .is_some()
        {
            log_registration(None, false, Some("Phone number already registered"));
            return Err(UserServiceError::Conflict(
                "A user with this phone number already exists".to_string(),
            ));
        }

        if self.repository.get_by_national_id(&request.national_id).await
            .map_err(|e| self.map_repo_error(e))?
            .is_some()
        {
            log_registration(None, false, Some("National ID already registered"));
            return Err(UserServiceError::Conflict(
                "A user with this national ID already exists".to_string(),
            ));
        }

        let hashed_password = self.hash_password(request.password.clone()).await?;
        let data_user = conversions::convert_to_data_new_user(&request, hashed_password);

        let stored = self.repository.create(data_user)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    log_registration(None, false, Some("Concurrent registration"));
                }
                self.map_repo_error(e)
            })?;

        info!("Registered user {}", stored.id);
        log_registration(Some(&stored.id.to_string()), true, None);

        self.to_domain(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        self.repository.get_by_id(id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(|u| self.to_domain(u))
            .transpose()
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, UserServiceError> {
        self.repository.get_by_phone(phone_number)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(|u| self.to_domain(u))
            .transpose()
    }

    async fn find_by_national_id(&self, national_id: &str) -> Result<Option<User>, UserServiceError> {
        self.repository.get_by_national_id(national_id)
            .await
            .map_err(|e| self.map_repo_error(e))?
            .map(|u| self.to_domain(u))
            .transpose()
    }

    async fn authenticate(&self, phone_number: &str, password: &str) -> Result<Option<User>, UserServiceError> {
        let user = match self.find_by_phone(phone_number).await? {
            Some(user) => user,
            None => {
                debug!("Authentication failed: unknown phone number");
                return Ok(None);
            }
        };

        if self.verify_password(password, &user.hashed_password).await? {
            Ok(Some(user))
        } else {
            debug!("Authentication failed: wrong password for user {}", user.id);
            Ok(None)
        }
    }

    async fn bind_device(&self, user: &User, request: BindDevice) -> Result<User, UserServiceError> {
        if let Err(validation_errors) = request.validate() {
            return Err(UserServiceError::ValidationError(format_validation_errors(&validation_errors)));
        }

        let user_id = user.id.to_string();
        match self.repository.bind_device(user.id, &request.device_id, Utc::now()).await {
            Ok(_) => {
                log_device_binding(&user_id, Some(&request.device_id), true, None);
            }
            Err(RepositoryError::Conflict(msg)) => {
                log_device_binding(&user_id, Some(&request.device_id), false, Some(&msg));
                return Err(UserServiceError::Conflict(
                    "This device is already bound to another account".to_string(),
                ));
            }
            Err(e) => return Err(self.map_repo_error(e)),
        }

        self.reload(user.id).await
    }

    async fn unbind_device(&self, user: &User) -> Result<User, UserServiceError> {
        let removed = self.repository.unbind_device(user.id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        if removed {
            log_device_binding(&user.id.to_string(), None, true, None);
        }

        self.reload(user.id).await
    }
}

/// Create a user service on the given repository
pub fn create_user_service<R>(repository: R, passwords: PasswordManager) -> Arc<dyn UserServiceTrait>
where
    R: UserRepositoryTrait + 'static,
{
    Arc::new(UserService::new(repository, passwords))
}

/// Create a default user service using the repository from data layer
pub fn create_default_user_service() -> Result<Arc<dyn UserServiceTrait>, PasswordError> {
    let passwords = PasswordManager::from_env()?;
    Ok(create_user_service(UserRepository::new(), passwords))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use health_monitor_data::repository::tests::MockUserRepository;
    use crate::auth::password::PasswordConfig;
    use crate::entities::user::tests::registration;

    pub(crate) fn fast_passwords() -> PasswordManager {
        PasswordManager::new(PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap()
    }

    fn service() -> UserService<MockUserRepository> {
        UserService::new(MockUserRepository::new(), fast_passwords())
    }

    #[tokio::test]
    async fn test_register_hashes_password_and_echoes_profile() {
        let service = service();
        let request = registration();

        let user = service.register(request.clone()).await.unwrap();
        assert!(user.id > 0);
        assert_eq!(user.phone_number, request.phone_number);
        assert_eq!(user.national_id, request.national_id);
        assert_eq!(user.full_name, request.full_name);
        assert_eq!(user.device_id, None);
        assert_ne!(user.hashed_password, request.password);
        assert!(fast_passwords().verify(&request.password, &user.hashed_password));

        let found = service.find_by_national_id(&request.national_id).await.unwrap().unwrap();
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn test_register_duplicate_phone_is_conflict() {
        let service = service();
        let first = service.register(registration()).await.unwrap();

        let mut duplicate = registration();
        duplicate.national_id = "9999".to_string();
        duplicate.full_name = Some("Someone Else".to_string());
        let err = service.register(duplicate).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(ref m) if m.contains("phone number")));

        let mut duplicate = registration();
        duplicate.phone_number = "09129999999".to_string();
        let err = service.register(duplicate).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(ref m) if m.contains("national ID")));

        let unchanged = service.find_by_phone(&first.phone_number).await.unwrap().unwrap();
        assert_eq!(unchanged, first);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_profile_before_storage() {
        let service = service();
        let mut request = registration();
        request.phone_number = "not-a-phone".to_string();
        request.birth_date = "1990/01/01".to_string();

        match service.register(request).await {
            Err(UserServiceError::ValidationError(msg)) => {
                assert!(msg.contains("birth_date"));
                assert!(msg.contains("phone_number"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(service.find_by_phone("not-a-phone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let service = service();
        let request = registration();
        let user = service.register(request.clone()).await.unwrap();

        let authenticated = service.authenticate(&request.phone_number, &request.password).await.unwrap();
        assert_eq!(authenticated.map(|u| u.id), Some(user.id));

        assert!(service.authenticate(&request.phone_number, "wrong-password").await.unwrap().is_none());
        assert!(service.authenticate("09000000000", &request.password).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bind_and_unbind_device() {
        let service = service();
        let alice = service.register(registration()).await.unwrap();

        let mut other = registration();
        other.phone_number = "09120000002".to_string();
        other.national_id = "222".to_string();
        let bob = service.register(other).await.unwrap();

        let alice = service.bind_device(&alice, BindDevice { device_id: "dev-1".to_string() }).await.unwrap();
        assert_eq!(alice.device_id.as_deref(), Some("dev-1"));

        let err = service.bind_device(&bob, BindDevice { device_id: "dev-1".to_string() }).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Conflict(_)));

        let err = service.bind_device(&bob, BindDevice { device_id: String::new() }).await.unwrap_err();
        assert!(matches!(err, UserServiceError::ValidationError(_)));

        let alice = service.unbind_device(&alice).await.unwrap();
        assert_eq!(alice.device_id, None);

        let bob = service.bind_device(&bob, BindDevice { device_id: "dev-1".to_string() }).await.unwrap();
        assert_eq!(bob.device_id.as_deref(), Some("dev-1"));
    }

    #[tokio::test]
    async fn test_repository_failure_is_reported() {
        let service = UserService::new(MockUserRepository::failing(), fast_passwords());
        let err = service.find_by_id(1).await.unwrap_err();
        assert!(matches!(err, UserServiceError::RepositoryError(_)));
    }
}
