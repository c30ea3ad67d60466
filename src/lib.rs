pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::SantaError;
pub use crate::core::live::GroupFeed;
pub use crate::core::services::{SantaService, ServiceSettings};
pub use crate::core::session::{Language, Session};
pub use crate::infrastructure::logging::in_memory::InMemoryLogging;
pub use crate::infrastructure::storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests; // Include integration tests
