use thiserror::Error;

/// Errors that can occur while adding a system to a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SystemRegistrationError {
    #[error("system '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("system '{name}' does not access any components")]
    EmptyAccess { name: String },
}
