use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::query::{Document, FieldValue};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Admin => "ADMIN",
            Role::Member => "MEMBER",
        };
        write!(f, "{}", s)
    }
}

/// Membership record stored under `groups/{id}/members`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Member {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub role: Role,
    /// Present for `Member`, absent for `Admin`.
    pub participant_id: Option<String>,
    #[schema(value_type = String, example = "2026-11-02T18:04:12.512Z")]
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewMember {
    pub user_id: String,
    pub role: Role,
    pub participant_id: Option<String>,
}

impl Document for Member {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id.as_str()),
            "group_id" => FieldValue::from(self.group_id.as_str()),
            "user_id" => FieldValue::from(self.user_id.as_str()),
            "role" => FieldValue::from(self.role.to_string()),
            "participant_id" => FieldValue::from(self.participant_id.as_deref()),
            "joined_at" => FieldValue::from(self.joined_at),
            _ => FieldValue::Null,
        }
    }
}

/// How an actor reaches a group. `Admin` dominates `Member`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AccessKind {
    Member,
    Admin,
}

impl AccessKind {
    pub fn merge(self, other: AccessKind) -> AccessKind {
        self.max(other)
    }
}
