mod aggregation_tests;
mod api_tests;
mod group_tests;
mod session_tests;

use crate::core::live::{FeedState, GroupFeed};
use crate::core::models::Group;
use crate::core::services::{SantaService, ServiceSettings};
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use std::sync::Arc;
use std::time::Duration;

pub const ALICE: &str = "alice-uid";
pub const BOB: &str = "bob-uid";
pub const CAROL: &str = "carol-uid";

pub fn create_test_service() -> SantaService<InMemoryLogging, InMemoryStorage> {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    SantaService::new(storage, logging, ServiceSettings::default())
}

pub async fn create_family_group(service: &SantaService<InMemoryLogging, InMemoryStorage>) -> Group {
    service
        .create_group(ALICE, "Family 2026".to_string(), None)
        .await
        .unwrap()
}

/// Waits for a feed state matching `predicate`, failing the test after a
/// generous timeout instead of hanging.
pub async fn wait_for_state(
    feed: &mut GroupFeed,
    predicate: impl FnMut(&Arc<FeedState>) -> bool,
) -> Arc<FeedState> {
    tokio::time::timeout(Duration::from_secs(5), feed.wait_for(predicate))
        .await
        .expect("feed did not reach the expected state")
}

pub fn group_ids(state: &FeedState) -> Vec<&str> {
    state.groups.iter().map(|e| e.record.id.as_str()).collect()
}
