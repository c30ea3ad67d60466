use crate::core::errors::SantaError;
use crate::core::live::subscription::{Subscription, SubscriptionSink};
use crate::core::models::{
    Gift, Group, Member, NewGift, NewGroup, NewMember, NewParticipant, Participant,
};
use crate::core::query::{CollectionPath, Document, Query};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Failure modes the in-memory store can be told to simulate.
#[derive(Clone, Debug, PartialEq)]
pub enum Fault {
    /// Reads of `groups/{group_id}/members` fail.
    MemberReads { group_id: String },
    /// Deleting the document with this id fails.
    Delete { id: String },
    /// Writes into this collection fail.
    Writes { path: CollectionPath },
    /// New group subscriptions cannot be established.
    GroupWatch,
}

struct Collection<T> {
    path: CollectionPath,
    docs: HashMap<String, T>,
    sinks: Vec<SubscriptionSink<T>>,
}

impl<T: Document + PartialEq> Collection<T> {
    fn new(path: CollectionPath) -> Self {
        Collection {
            path,
            docs: HashMap::new(),
            sinks: Vec::new(),
        }
    }

    fn notify(&mut self) {
        let docs = &self.docs;
        self.sinks.retain_mut(|sink| sink.publish(docs.values()));
    }

    fn insert(&mut self, doc: T) {
        self.docs.insert(doc.id().to_string(), doc);
        self.notify();
    }

    fn replace(&mut self, doc: T) -> bool {
        match self.docs.get_mut(doc.id()) {
            Some(existing) => {
                *existing = doc;
                self.notify();
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: &str) {
        if self.docs.remove(id).is_some() {
            self.notify();
        }
    }

    fn watch(&mut self, query: Query) -> Subscription<T> {
        let (mut sink, subscription) = Subscription::channel(self.path.clone(), query);
        if sink.publish(self.docs.values()) {
            self.sinks.push(sink);
        }
        subscription
    }

    fn fail_subscribers(&mut self, err: SantaError) -> usize {
        let count = self.sinks.len();
        for sink in self.sinks.drain(..) {
            sink.fail(err.clone());
        }
        count
    }
}

#[derive(Clone)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<Collection<Group>>>,
    members: Arc<RwLock<HashMap<String, Collection<Member>>>>,
    participants: Arc<RwLock<HashMap<String, Collection<Participant>>>>,
    gifts: Arc<RwLock<HashMap<(String, String), Collection<Gift>>>>,
    faults: Arc<RwLock<Vec<Fault>>>,
    clock: Arc<Mutex<DateTime<Utc>>>,
    member_reads: Arc<AtomicUsize>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            groups: Arc::new(RwLock::new(Collection::new(CollectionPath::Groups))),
            members: Arc::new(RwLock::new(HashMap::new())),
            participants: Arc::new(RwLock::new(HashMap::new())),
            gifts: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(RwLock::new(Vec::new())),
            clock: Arc::new(Mutex::new(DateTime::<Utc>::MIN_UTC)),
            member_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub async fn inject_fault(&self, fault: Fault) {
        debug!(?fault, "fault injected");
        self.faults.write().await.push(fault);
    }

    pub async fn clear_faults(&self) {
        self.faults.write().await.clear();
    }

    /// Simulates a dropped connection: every open group subscription
    /// receives a transport error and stops.
    pub async fn drop_group_subscriptions(&self) -> usize {
        let dropped = self
            .groups
            .write()
            .await
            .fail_subscribers(SantaError::Transport("connection reset".to_string()));
        warn!(dropped, "group subscriptions dropped");
        dropped
    }

    /// How many membership reads were served or refused so far.
    pub fn member_reads(&self) -> usize {
        self.member_reads.load(Ordering::SeqCst)
    }

    async fn has_fault(&self, fault: &Fault) -> bool {
        self.faults.read().await.iter().any(|f| f == fault)
    }

    async fn check_write(&self, path: CollectionPath) -> Result<(), SantaError> {
        if self.has_fault(&Fault::Writes { path: path.clone() }).await {
            return Err(SantaError::StorageError(format!("write to {} rejected", path)));
        }
        Ok(())
    }

    async fn check_delete(&self, id: &str) -> Result<(), SantaError> {
        if self.has_fault(&Fault::Delete { id: id.to_string() }).await {
            return Err(SantaError::StorageError(format!("delete of {} rejected", id)));
        }
        Ok(())
    }

    /// Server timestamp, strictly increasing across calls.
    async fn server_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.clock.lock().await;
        let now = Utc::now().max(*last + Duration::microseconds(1));
        *last = now;
        now
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn add_group(&self, group: NewGroup) -> Result<Group, SantaError> {
        self.check_write(CollectionPath::Groups).await?;
        let created = Group {
            id: Uuid::new_v4().to_string(),
            name: group.name,
            admin_user_id: group.admin_user_id,
            max_budget: group.max_budget,
            invite_code: group.invite_code,
            created_at: self.server_timestamp().await,
        };
        self.groups.write().await.insert(created.clone());
        Ok(created)
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, SantaError> {
        Ok(self.groups.read().await.docs.get(group_id).cloned())
    }

    async fn update_group(&self, group: Group) -> Result<(), SantaError> {
        self.check_write(CollectionPath::Groups).await?;
        let id = group.id.clone();
        if self.groups.write().await.replace(group) {
            Ok(())
        } else {
            Err(SantaError::GroupNotFound(id))
        }
    }

    /// Removes the group document and drops every subcollection kept under
    /// it. Watchers of those subcollections see their stream end.
    async fn delete_group(&self, group_id: &str) -> Result<(), SantaError> {
        self.check_delete(group_id).await?;
        self.groups.write().await.remove(group_id);
        self.members.write().await.remove(group_id);
        self.participants.write().await.remove(group_id);
        self.gifts.write().await.retain(|(group, _), _| group != group_id);
        debug!(group_id, "group subcollections dropped");
        Ok(())
    }

    async fn find_groups(&self, query: &Query) -> Result<Vec<Group>, SantaError> {
        Ok(query.select(self.groups.read().await.docs.values()))
    }

    async fn watch_groups(&self, query: Query) -> Result<Subscription<Group>, SantaError> {
        if self.has_fault(&Fault::GroupWatch).await {
            return Err(SantaError::Transport("group subscription refused".to_string()));
        }
        Ok(self.groups.write().await.watch(query))
    }

    async fn add_member(&self, group_id: &str, member: NewMember) -> Result<Member, SantaError> {
        let path = CollectionPath::Members {
            group_id: group_id.to_string(),
        };
        self.check_write(path.clone()).await?;
        let created = Member {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            user_id: member.user_id,
            role: member.role,
            participant_id: member.participant_id,
            joined_at: self.server_timestamp().await,
        };
        self.members
            .write()
            .await
            .entry(group_id.to_string())
            .or_insert_with(|| Collection::new(path))
            .insert(created.clone());
        Ok(created)
    }

    async fn find_members(&self, group_id: &str, query: &Query) -> Result<Vec<Member>, SantaError> {
        self.member_reads.fetch_add(1, Ordering::SeqCst);
        if self
            .has_fault(&Fault::MemberReads {
                group_id: group_id.to_string(),
            })
            .await
        {
            return Err(SantaError::Transport(format!("read of groups/{}/members failed", group_id)));
        }
        Ok(self
            .members
            .read()
            .await
            .get(group_id)
            .map(|c| query.select(c.docs.values()))
            .unwrap_or_default())
    }

    async fn delete_member(&self, group_id: &str, member_id: &str) -> Result<(), SantaError> {
        self.check_delete(member_id).await?;
        if let Some(collection) = self.members.write().await.get_mut(group_id) {
            collection.remove(member_id);
        }
        Ok(())
    }

    async fn add_participant(
        &self,
        group_id: &str,
        participant: NewParticipant,
    ) -> Result<Participant, SantaError> {
        let path = CollectionPath::Participants {
            group_id: group_id.to_string(),
        };
        self.check_write(path.clone()).await?;
        let created = Participant {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            name: participant.name,
            email: participant.email,
            user_id: participant.user_id,
            created_at: self.server_timestamp().await,
        };
        self.participants
            .write()
            .await
            .entry(group_id.to_string())
            .or_insert_with(|| Collection::new(path))
            .insert(created.clone());
        Ok(created)
    }

    async fn get_participant(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> Result<Option<Participant>, SantaError> {
        Ok(self
            .participants
            .read()
            .await
            .get(group_id)
            .and_then(|c| c.docs.get(participant_id).cloned()))
    }

    async fn find_participants(&self, group_id: &str, query: &Query) -> Result<Vec<Participant>, SantaError> {
        Ok(self
            .participants
            .read()
            .await
            .get(group_id)
            .map(|c| query.select(c.docs.values()))
            .unwrap_or_default())
    }

    async fn watch_participants(
        &self,
        group_id: &str,
        query: Query,
    ) -> Result<Subscription<Participant>, SantaError> {
        let path = CollectionPath::Participants {
            group_id: group_id.to_string(),
        };
        Ok(self
            .participants
            .write()
            .await
            .entry(group_id.to_string())
            .or_insert_with(|| Collection::new(path))
            .watch(query))
    }

    async fn delete_participant(&self, group_id: &str, participant_id: &str) -> Result<(), SantaError> {
        self.check_delete(participant_id).await?;
        if let Some(collection) = self.participants.write().await.get_mut(group_id) {
            collection.remove(participant_id);
        }
        Ok(())
    }

    async fn add_gift(&self, group_id: &str, participant_id: &str, gift: NewGift) -> Result<Gift, SantaError> {
        let path = CollectionPath::Gifts {
            group_id: group_id.to_string(),
            participant_id: participant_id.to_string(),
        };
        self.check_write(path.clone()).await?;
        let created = Gift {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            participant_id: participant_id.to_string(),
            title: gift.title,
            price: gift.price,
            url: gift.url,
            image_url: gift.image_url,
        };
        self.gifts
            .write()
            .await
            .entry((group_id.to_string(), participant_id.to_string()))
            .or_insert_with(|| Collection::new(path))
            .insert(created.clone());
        Ok(created)
    }

    async fn get_gift(
        &self,
        group_id: &str,
        participant_id: &str,
        gift_id: &str,
    ) -> Result<Option<Gift>, SantaError> {
        Ok(self
            .gifts
            .read()
            .await
            .get(&(group_id.to_string(), participant_id.to_string()))
            .and_then(|c| c.docs.get(gift_id).cloned()))
    }

    async fn update_gift(&self, gift: Gift) -> Result<(), SantaError> {
        let key = (gift.group_id.clone(), gift.participant_id.clone());
        self.check_write(CollectionPath::Gifts {
            group_id: key.0.clone(),
            participant_id: key.1.clone(),
        })
        .await?;
        let id = gift.id.clone();
        let replaced = self
            .gifts
            .write()
            .await
            .get_mut(&key)
            .map(|c| c.replace(gift))
            .unwrap_or(false);
        if replaced {
            Ok(())
        } else {
            Err(SantaError::GiftNotFound(id))
        }
    }

    async fn find_gifts(&self, group_id: &str, participant_id: &str, query: &Query) -> Result<Vec<Gift>, SantaError> {
        Ok(self
            .gifts
            .read()
            .await
            .get(&(group_id.to_string(), participant_id.to_string()))
            .map(|c| query.select(c.docs.values()))
            .unwrap_or_default())
    }

    async fn watch_gifts(
        &self,
        group_id: &str,
        participant_id: &str,
        query: Query,
    ) -> Result<Subscription<Gift>, SantaError> {
        let path = CollectionPath::Gifts {
            group_id: group_id.to_string(),
            participant_id: participant_id.to_string(),
        };
        Ok(self
            .gifts
            .write()
            .await
            .entry((group_id.to_string(), participant_id.to_string()))
            .or_insert_with(|| Collection::new(path))
            .watch(query))
    }

    async fn delete_gift(&self, group_id: &str, participant_id: &str, gift_id: &str) -> Result<(), SantaError> {
        self.check_delete(gift_id).await?;
        if let Some(collection) = self
            .gifts
            .write()
            .await
            .get_mut(&(group_id.to_string(), participant_id.to_string()))
        {
            collection.remove(gift_id);
        }
        Ok(())
    }
}
