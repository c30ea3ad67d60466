use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Clone, Serialize, PartialEq)]
pub enum SantaError {
    #[error("Actor identity is required")]
    MissingActor,
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Participant {0} not found")]
    ParticipantNotFound(String),
    #[error("Gift {0} not found")]
    GiftNotFound(String),
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("User {0} is not group admin")]
    NotGroupAdmin(String),
    #[error("User {0} cannot edit gifts of this participant")]
    NotGiftOwner(String),
    #[error("Invalid invite code")]
    InvalidInviteCode,
    #[error("Invite code not found")]
    InviteCodeNotFound,
    #[error("Could not allocate a free invite code after {0} attempts")]
    InviteCodeExhausted(usize),
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Cascade delete incomplete: {deleted} removed, {} failed", .failed.len())]
    PartialCascade { deleted: usize, failed: Vec<String> },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl SantaError {
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        SantaError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}
