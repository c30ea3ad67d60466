use crate::core::errors::SantaError;
use crate::core::live::subscription::Subscription;
use crate::core::models::{
    Gift, Group, Member, NewGift, NewGroup, NewMember, NewParticipant, Participant,
};
use crate::core::query::Query;
use async_trait::async_trait;

/// Hierarchical document store: `groups/{id}` with `participants`, `gifts`
/// and `members` sub-collections. Every write touches a single document.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn add_group(&self, group: NewGroup) -> Result<Group, SantaError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SantaError>;
    async fn update_group(&self, group: Group) -> Result<(), SantaError>;
    async fn delete_group(&self, group_id: &str) -> Result<(), SantaError>;
    async fn find_groups(&self, query: &Query) -> Result<Vec<Group>, SantaError>;
    async fn watch_groups(&self, query: Query) -> Result<Subscription<Group>, SantaError>;

    async fn add_member(&self, group_id: &str, member: NewMember) -> Result<Member, SantaError>;
    async fn find_members(&self, group_id: &str, query: &Query) -> Result<Vec<Member>, SantaError>;
    async fn delete_member(&self, group_id: &str, member_id: &str) -> Result<(), SantaError>;

    async fn add_participant(
        &self,
        group_id: &str,
        participant: NewParticipant,
    ) -> Result<Participant, SantaError>;
    async fn get_participant(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> Result<Option<Participant>, SantaError>;
    async fn find_participants(&self, group_id: &str, query: &Query) -> Result<Vec<Participant>, SantaError>;
    async fn watch_participants(
        &self,
        group_id: &str,
        query: Query,
    ) -> Result<Subscription<Participant>, SantaError>;
    async fn delete_participant(&self, group_id: &str, participant_id: &str) -> Result<(), SantaError>;

    async fn add_gift(&self, group_id: &str, participant_id: &str, gift: NewGift) -> Result<Gift, SantaError>;
    async fn get_gift(
        &self,
        group_id: &str,
        participant_id: &str,
        gift_id: &str,
    ) -> Result<Option<Gift>, SantaError>;
    async fn update_gift(&self, gift: Gift) -> Result<(), SantaError>;
    async fn find_gifts(&self, group_id: &str, participant_id: &str, query: &Query) -> Result<Vec<Gift>, SantaError>;
    async fn watch_gifts(
        &self,
        group_id: &str,
        participant_id: &str,
        query: Query,
    ) -> Result<Subscription<Gift>, SantaError>;
    async fn delete_gift(&self, group_id: &str, participant_id: &str, gift_id: &str) -> Result<(), SantaError>;
}

pub mod in_memory;
