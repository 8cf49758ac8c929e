// Domain services
// This module contains business logic implementations.
pub mod records;
pub mod users;

use validator::ValidationErrors;

// Re-export service traits and factory functions
pub use records::{create_default_record_service, RecordService, RecordServiceError, RecordServiceTrait};
pub use users::{create_default_user_service, UserService, UserServiceError, UserServiceTrait};

/// Flatten validator errors into one message, fields in alphabetical order
pub(crate) fn format_validation_errors(validation_errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = validation_errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .iter()
        .map(|(field, errors)| {
            let error_msgs: Vec<String> = errors
                .iter()
                .map(|err| {
                    if let Some(msg) = &err.message {
                        msg.to_string()
                    } else {
                        format!("Invalid {}", field)
                    }
                })
                .collect();
            format!("{}: {}", field, error_msgs.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ")
}
