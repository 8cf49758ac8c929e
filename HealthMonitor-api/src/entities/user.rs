use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use health_monitor_domain::entities::{BindDevice, Gender, RegisterUser, User};
use health_monitor_domain::entities::user::BIRTH_DATE_FORMAT;

/// Gender as exchanged on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PublicGender {
    Male,
    Female,
}

impl From<PublicGender> for Gender {
    fn from(gender: PublicGender) -> Self {
        match gender {
            PublicGender::Male => Gender::Male,
            PublicGender::Female => Gender::Female,
        }
    }
}

impl From<Gender> for PublicGender {
    fn from(gender: Gender) -> Self {
        match gender {
            Gender::Male => PublicGender::Male,
            Gender::Female => PublicGender::Female,
        }
    }
}

/// Registration request payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicRegistrationRequest {
    /// 1 to 11 digits
    #[schema(example = "09120000001")]
    pub phone_number: String,

    pub national_id: String,

    pub full_name: Option<String>,

    /// 8 to 40 characters
    pub password: String,

    pub gender: PublicGender,

    /// `YYYY-MM-DD`
    #[schema(example = "1990-05-17")]
    pub birth_date: String,

    /// Height in centimetres
    pub height: i32,

    /// Weight in kilograms
    pub weight: i32,

    #[serde(default)]
    pub sickness: String,

    #[serde(default)]
    pub sickness_history: Vec<String>,

    #[serde(default)]
    pub family_sickness_history: Vec<String>,

    #[serde(default)]
    pub medicines: Vec<String>,

    #[serde(default)]
    pub allergies: Vec<String>,
}

/// Public view of a user; the password hash is never exposed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: i64,
    pub phone_number: String,
    pub national_id: String,
    pub full_name: Option<String>,
    /// Device bound to the account, if any
    pub device_id: Option<String>,
    pub gender: PublicGender,
    pub birth_date: String,
    pub height: i32,
    pub weight: i32,
    pub sickness: String,
    pub sickness_history: Vec<String>,
    pub family_sickness_history: Vec<String>,
    pub medicines: Vec<String>,
    pub allergies: Vec<String>,
}

/// Request to bind a device to the caller's account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicBindDeviceRequest {
    #[schema(example = "watch-7f3a")]
    pub device_id: String,
}

/// Convert a public registration request to the domain request
pub fn convert_to_domain_registration(request: PublicRegistrationRequest) -> RegisterUser {
    RegisterUser {
        phone_number: request.phone_number,
        national_id: request.national_id,
        full_name: request.full_name,
        password: request.password,
        gender: request.gender.into(),
        birth_date: request.birth_date,
        height: request.height,
        weight: request.weight,
        sickness: request.sickness,
        sickness_history: request.sickness_history,
        family_sickness_history: request.family_sickness_history,
        medicines: request.medicines,
        allergies: request.allergies,
    }
}

pub fn convert_to_domain_bind_device(request: PublicBindDeviceRequest) -> BindDevice {
    BindDevice { device_id: request.device_id }
}

/// Convert a domain user to its public view
pub fn convert_to_public_user(user: User) -> PublicUser {
    PublicUser {
        id: user.id,
        phone_number: user.phone_number,
        national_id: user.national_id,
        full_name: user.full_name,
        device_id: user.device_id,
        gender: user.gender.into(),
        birth_date: user.birth_date.format(BIRTH_DATE_FORMAT).to_string(),
        height: user.height,
        weight: user.weight,
        sickness: user.sickness,
        sickness_history: user.sickness_history,
        family_sickness_history: user.family_sickness_history,
        medicines: user.medicines,
        allergies: user.allergies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_public_user_hides_password_hash() {
        let user = User {
            id: 3,
            phone_number: "0912".to_string(),
            national_id: "42".to_string(),
            full_name: None,
            hashed_password: "$argon2id$secret".to_string(),
            device_id: Some("dev-1".to_string()),
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 9).unwrap(),
            height: 175,
            weight: 70,
            sickness: String::new(),
            sickness_history: vec![],
            family_sickness_history: vec![],
            medicines: vec!["aspirin".to_string()],
            allergies: vec![],
        };

        let json = serde_json::to_value(convert_to_public_user(user)).unwrap();
        assert_eq!(json["birth_date"], "1985-03-09");
        assert_eq!(json["gender"], "male");
        assert_eq!(json["device_id"], "dev-1");
        assert!(json.get("hashed_password").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_registration_defaults_optional_lists() {
        let request: PublicRegistrationRequest = serde_json::from_value(serde_json::json!({
            "phone_number": "0912",
            "national_id": "42",
            "password": "password123",
            "gender": "female",
            "birth_date": "1990-01-01",
            "height": 160,
            "weight": 55
        }))
        .unwrap();

        let domain = convert_to_domain_registration(request);
        assert_eq!(domain.gender, Gender::Female);
        assert!(domain.sickness.is_empty());
        assert!(domain.allergies.is_empty());
    }
}
