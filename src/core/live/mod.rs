pub mod aggregation;
pub mod publisher;
pub mod resolver;
pub mod subscription;

pub use aggregation::{AggregationStore, Entry, Grant, Source};
pub use publisher::{FeedError, FeedState, FeedStream, GroupFeed};
pub use resolver::{MembershipResolver, Resolution};
pub use subscription::{ChangeKind, DocumentChange, QuerySnapshot, Subscription, SubscriptionEvent, SubscriptionSink};
