use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::query::{Chronological, Document, FieldValue};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Participant {
    pub id: String,
    pub group_id: String,
    pub name: String,
    pub email: String,
    /// Set once the invited person has linked an account.
    pub user_id: Option<String>,
    #[schema(value_type = String, example = "2026-11-02T18:04:12.512Z")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub user_id: Option<String>,
}

impl Participant {
    pub fn is_linked_to(&self, actor: &str) -> bool {
        self.user_id.as_deref() == Some(actor)
    }
}

impl Document for Participant {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id.as_str()),
            "group_id" => FieldValue::from(self.group_id.as_str()),
            "name" => FieldValue::from(self.name.as_str()),
            "email" => FieldValue::from(self.email.as_str()),
            "user_id" => FieldValue::from(self.user_id.as_deref()),
            "created_at" => FieldValue::from(self.created_at),
            _ => FieldValue::Null,
        }
    }
}

impl Chronological for Participant {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ParticipantSummary {
    pub participant_id: String,
    pub gift_count: usize,
    pub total: f64,
    pub max_budget: f64,
    pub remaining: f64,
    pub over_budget: bool,
}
