use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::query::{Chronological, Document, FieldValue};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub admin_user_id: String,
    pub max_budget: f64,
    pub invite_code: String,
    #[schema(value_type = String, example = "2026-11-02T18:04:12.512Z")]
    pub created_at: DateTime<Utc>,
}

/// Group body before the store assigns `id` and `created_at`.
#[derive(Clone, Debug)]
pub struct NewGroup {
    pub name: String,
    pub admin_user_id: String,
    pub max_budget: f64,
    pub invite_code: String,
}

impl Group {
    pub fn is_admin(&self, actor: &str) -> bool {
        self.admin_user_id == actor
    }
}

impl Document for Group {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id.as_str()),
            "name" => FieldValue::from(self.name.as_str()),
            "admin_user_id" => FieldValue::from(self.admin_user_id.as_str()),
            "max_budget" => FieldValue::from(self.max_budget),
            "invite_code" => FieldValue::from(self.invite_code.as_str()),
            "created_at" => FieldValue::from(self.created_at),
            _ => FieldValue::Null,
        }
    }
}

impl Chronological for Group {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
