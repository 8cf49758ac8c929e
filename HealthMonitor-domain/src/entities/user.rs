use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use validator::{Validate, ValidationError};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Birth dates are exchanged as `YYYY-MM-DD`
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Gender of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub phone_number: String,
    pub national_id: String,
    pub full_name: Option<String>,
    /// Argon2 PHC string, never the plaintext
    pub hashed_password: String,
    /// Device currently bound to the account
    pub device_id: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    /// Height in centimetres
    pub height: i32,
    /// Weight in kilograms
    pub weight: i32,
    pub sickness: String,
    pub sickness_history: Vec<String>,
    pub family_sickness_history: Vec<String>,
    pub medicines: Vec<String>,
    pub allergies: Vec<String>,
}

/// Registration profile, validated before anything is stored
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(custom = "validate_phone_number")]
    pub phone_number: String,

    #[validate(length(min = 1, max = 32, message = "National ID must be between 1 and 32 characters"))]
    pub national_id: String,

    #[validate(length(max = 255, message = "Full name cannot exceed 255 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 8, max = 40, message = "Password must be between 8 and 40 characters"))]
    pub password: String,

    pub gender: Gender,

    #[validate(custom = "validate_birth_date")]
    pub birth_date: String,

    #[validate(range(min = 1, max = 300, message = "Height must be between 1 and 300 cm"))]
    pub height: i32,

    #[validate(range(min = 1, max = 500, message = "Weight must be between 1 and 500 kg"))]
    pub weight: i32,

    #[validate(length(max = 1000, message = "Sickness cannot exceed 1000 characters"))]
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

/// Request to bind a device to the caller
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BindDevice {
    #[validate(length(min = 1, max = 128, message = "Device ID must be between 1 and 128 characters"))]
    pub device_id: String,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Phone numbers are 1 to 11 ASCII digits
pub fn validate_phone_number(phone_number: &str) -> Result<(), ValidationError> {
    if phone_number.is_empty()
        || phone_number.len() > 11
        || !phone_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid("phone_number", "Phone number must be 1 to 11 digits"));
    }
    Ok(())
}

/// Birth dates must be real calendar dates in `YYYY-MM-DD` form
pub fn validate_birth_date(birth_date: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(birth_date, BIRTH_DATE_FORMAT)
        .map(|_| ())
        .map_err(|_| invalid("birth_date", "Birth date must be a valid YYYY-MM-DD date"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn registration() -> RegisterUser {
        RegisterUser {
            phone_number: "09120000001".to_string(),
            national_id: "0012345678".to_string(),
            full_name: Some("Sara Ahmadi".to_string()),
            password: "s3cure-password".to_string(),
            gender: Gender::Female,
            birth_date: "1990-05-17".to_string(),
            height: 168,
            weight: 60,
            sickness: "none".to_string(),
            sickness_history: vec![],
            family_sickness_history: vec!["diabetes".to_string()],
            medicines: vec![],
            allergies: vec!["penicillin".to_string()],
        }
    }

    #[test]
    fn test_valid_registration() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn test_phone_number_rules() {
        assert!(validate_phone_number("0912").is_ok());
        assert!(validate_phone_number("09120000001").is_ok());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("091200000012").is_err());
        assert!(validate_phone_number("+9891200000").is_err());
        assert!(validate_phone_number("0912abc").is_err());
    }

    #[test]
    fn test_birth_date_rules() {
        assert!(validate_birth_date("2000-02-29").is_ok());
        assert!(validate_birth_date("2001-02-29").is_err());
        assert!(validate_birth_date("17/05/1990").is_err());
    }

    #[test]
    fn test_out_of_range_fields_are_rejected() {
        let mut request = registration();
        request.password = "short".to_string();
        request.height = 0;
        request.weight = 501;

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("height"));
        assert!(fields.contains_key("weight"));
    }

    #[test]
    fn test_gender_round_trip() {
        assert_eq!("male".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!(Gender::Female.to_string(), "female");
        assert!("other".parse::<Gender>().is_err());
        assert_eq!(serde_json::to_string(&Gender::Female).unwrap(), "\"female\"");
    }
}
