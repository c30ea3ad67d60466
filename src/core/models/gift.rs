use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::query::{Document, FieldValue};

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Gift {
    pub id: String,
    pub group_id: String,
    pub participant_id: String,
    pub title: String,
    pub price: f64,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct NewGift {
    pub title: String,
    pub price: f64,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// Partial gift update. An empty `url` or `image_url` clears the field.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct GiftPatch {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

impl Document for Gift {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::from(self.id.as_str()),
            "group_id" => FieldValue::from(self.group_id.as_str()),
            "participant_id" => FieldValue::from(self.participant_id.as_str()),
            "title" => FieldValue::from(self.title.as_str()),
            "price" => FieldValue::from(self.price),
            "url" => FieldValue::from(self.url.as_deref()),
            "image_url" => FieldValue::from(self.image_url.as_deref()),
            _ => FieldValue::Null,
        }
    }
}

pub fn calculate_total(gifts: &[Gift]) -> f64 {
    gifts.iter().map(|g| g.price).sum()
}
