//! Queries understood by the document store.
//!
//! A [`Query`] is a set of equality filters plus at most one ordering key.
//! Ties on the ordering key fall back to document id so results are stable.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::fmt;

/// Value of a single document field, as seen by filters and ordering.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum FieldValue {
    Null,
    Number(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Time(value)
    }
}

impl From<Option<&str>> for FieldValue {
    fn from(value: Option<&str>) -> Self {
        value.map(FieldValue::from).unwrap_or(FieldValue::Null)
    }
}

/// A record held by the document store.
pub trait Document: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn field(&self, name: &str) -> FieldValue;
}

/// A record carrying a backend-assigned creation timestamp.
pub trait Chronological: Document {
    fn created_at(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: FieldValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn matches<T: Document>(&self, doc: &T) -> bool {
        self.filters.iter().all(|f| doc.field(&f.field) == f.value)
    }

    /// Orders `docs` by the query's sort key, then by id ascending.
    pub fn sort<T: Document>(&self, docs: &mut [T]) {
        docs.sort_by(|a, b| {
            let primary = match &self.order_by {
                Some(order) => {
                    let cmp = a
                        .field(&order.field)
                        .partial_cmp(&b.field(&order.field))
                        .unwrap_or(Ordering::Equal);
                    match order.direction {
                        Direction::Ascending => cmp,
                        Direction::Descending => cmp.reverse(),
                    }
                }
                None => Ordering::Equal,
            };
            primary.then_with(|| a.id().cmp(b.id()))
        });
    }

    /// Matching documents from `docs`, sorted.
    pub fn select<'a, T: Document>(&self, docs: impl IntoIterator<Item = &'a T>) -> Vec<T> {
        let mut out: Vec<T> = docs.into_iter().filter(|d| self.matches(*d)).cloned().collect();
        self.sort(&mut out);
        out
    }
}

/// Location of a collection in the document hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollectionPath {
    Groups,
    Participants { group_id: String },
    Gifts { group_id: String, participant_id: String },
    Members { group_id: String },
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionPath::Groups => write!(f, "groups"),
            CollectionPath::Participants { group_id } => write!(f, "groups/{}/participants", group_id),
            CollectionPath::Gifts {
                group_id,
                participant_id,
            } => write!(f, "groups/{}/participants/{}/gifts", group_id, participant_id),
            CollectionPath::Members { group_id } => write!(f, "groups/{}/members", group_id),
        }
    }
}
