use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::SantaError;
use crate::core::live::{Entry, FeedState};
use crate::core::models::{AccessKind, Group};
use crate::core::session::{Language, Session};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    /// Defaults to the configured budget when omitted.
    pub max_budget: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameGroupRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    pub code: String,
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AddParticipantRequest {
    pub name: String,
    pub email: String,
    pub user_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetLanguageRequest {
    pub language: Language,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub actor: String,
    pub language: Language,
}

impl SessionResponse {
    pub fn from_session(session: &Session) -> Result<Self, SantaError> {
        Ok(SessionResponse {
            actor: session.actor()?.to_string(),
            language: session.language(),
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct LanguageResponse {
    /// Value the client should persist as its preference.
    pub language: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: usize,
}

/// A group as the caller sees it in the aggregated view.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct GroupView {
    pub id: String,
    pub name: String,
    pub admin_user_id: String,
    pub max_budget: f64,
    pub invite_code: String,
    #[schema(value_type = String, example = "2026-11-02T18:04:12.512Z")]
    pub created_at: DateTime<Utc>,
    pub access_kind: AccessKind,
}

impl From<&Entry<Group>> for GroupView {
    fn from(entry: &Entry<Group>) -> Self {
        let group = &entry.record;
        GroupView {
            id: group.id.clone(),
            name: group.name.clone(),
            admin_user_id: group.admin_user_id.clone(),
            max_budget: group.max_budget,
            invite_code: group.invite_code.clone(),
            created_at: group.created_at,
            access_kind: entry.access_kind,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FeedErrorResponse {
    pub streams: Vec<String>,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct GroupFeedResponse {
    pub groups: Vec<GroupView>,
    pub loading: bool,
    pub error: Option<FeedErrorResponse>,
    pub version: u64,
}

impl From<&FeedState> for GroupFeedResponse {
    fn from(state: &FeedState) -> Self {
        GroupFeedResponse {
            groups: state.groups.iter().map(GroupView::from).collect(),
            loading: state.loading,
            error: state.error.as_ref().map(|e| FeedErrorResponse {
                streams: e.streams.iter().map(|s| s.as_str().to_string()).collect(),
                message: e.message.clone(),
            }),
            version: state.version,
        }
    }
}

// Error response struct
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for SantaError to implement IntoResponse
pub struct ApiError(pub SantaError);

impl From<SantaError> for ApiError {
    fn from(err: SantaError) -> Self {
        ApiError(err)
    }
}

const RETRY_LATER: &str = "Something went wrong, please try again";

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self.0 {
            SantaError::MissingActor => (StatusCode::UNAUTHORIZED, "Sign in to continue".to_string()),
            SantaError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid or expired session".to_string()),
            SantaError::GroupNotFound(_) => (StatusCode::NOT_FOUND, "Group not found".to_string()),
            SantaError::ParticipantNotFound(_) => (StatusCode::NOT_FOUND, "Participant not found".to_string()),
            SantaError::GiftNotFound(_) => (StatusCode::NOT_FOUND, "Gift not found".to_string()),
            SantaError::AlreadyGroupMember(_) => {
                (StatusCode::CONFLICT, "You already belong to this group".to_string())
            }
            SantaError::NotGroupMember(_) => {
                (StatusCode::FORBIDDEN, "You do not have access to this group".to_string())
            }
            SantaError::NotGroupAdmin(_) => (StatusCode::FORBIDDEN, "Only the group admin can do this".to_string()),
            SantaError::NotGiftOwner(_) => {
                (StatusCode::FORBIDDEN, "You can only edit your own wish list".to_string())
            }
            SantaError::InvalidInviteCode => (
                StatusCode::BAD_REQUEST,
                "Invite codes are 6 letters or digits".to_string(),
            ),
            SantaError::InviteCodeNotFound => (StatusCode::NOT_FOUND, "No group uses this invite code".to_string()),
            SantaError::InvalidEmail(email) => (StatusCode::BAD_REQUEST, format!("Invalid email: {}", email)),
            SantaError::InvalidInput(_, field) => (StatusCode::BAD_REQUEST, field.description.clone()),
            SantaError::PartialCascade { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Some items could not be deleted, please try again".to_string(),
            ),
            SantaError::InviteCodeExhausted(_) | SantaError::Transport(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, RETRY_LATER.to_string())
            }
            SantaError::StorageError(_) | SantaError::LoggingError(_) | SantaError::InternalServerError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, RETRY_LATER.to_string())
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
