//! Live view of every group an actor can reach.
//!
//! A [`GroupFeed`] owns a background task that listens to two group
//! subscriptions (groups the actor administers, and all groups as membership
//! candidates), runs the [`MembershipResolver`] whenever the candidate set
//! changes and merges both into an [`AggregationStore`]. Consumers read
//! [`FeedState`] values through a `watch` channel: bursts coalesce to the
//! latest state and every published state is a complete merge.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::errors::SantaError;
use crate::core::live::aggregation::{AggregationStore, Entry, Grant, Source};
use crate::core::live::resolver::MembershipResolver;
use crate::core::live::subscription::{QuerySnapshot, Subscription, SubscriptionEvent};
use crate::core::models::Group;
use crate::core::query::{Direction, Query};
use crate::infrastructure::storage::Storage;

const TRANSPORT_MESSAGE: &str = "Live updates are unavailable right now. Showing the last known groups.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedStream {
    /// Groups administered by the actor.
    Owned,
    /// Every group, checked for membership.
    Candidates,
}

impl FeedStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedStream::Owned => "owned",
            FeedStream::Candidates => "candidates",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedError {
    pub streams: Vec<FeedStream>,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeedState {
    pub groups: Vec<Entry<Group>>,
    /// True until the owned stream delivered and one resolver pass finished.
    pub loading: bool,
    pub error: Option<FeedError>,
    pub version: u64,
}

impl FeedState {
    fn initial() -> Self {
        FeedState {
            groups: Vec::new(),
            loading: true,
            error: None,
            version: 0,
        }
    }

    pub fn is_settled(&self) -> bool {
        !self.loading || self.error.is_some()
    }
}

enum FeedCommand {
    Reconnect,
    Recheck,
}

pub struct GroupFeed {
    state: watch::Receiver<Arc<FeedState>>,
    commands: mpsc::UnboundedSender<FeedCommand>,
    task: Option<JoinHandle<()>>,
}

impl GroupFeed {
    /// Starts the feed for `actor`. Must be called inside a Tokio runtime.
    pub fn spawn<S: Storage + 'static>(storage: Arc<S>, actor: &str) -> Result<Self, SantaError> {
        let resolver = MembershipResolver::new(Arc::clone(&storage), actor)?;
        let (state_tx, state_rx) = watch::channel(Arc::new(FeedState::initial()));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let worker = FeedWorker {
            storage,
            resolver,
            store: AggregationStore::new(),
            owned: None,
            candidates: None,
            latest_candidates: Vec::new(),
            failed: BTreeSet::new(),
            owned_ready: false,
            resolved_once: false,
            state: state_tx,
            published: None,
        };
        info!(actor, "group feed started");
        let task = tokio::spawn(worker.run(commands_rx));
        Ok(GroupFeed {
            state: state_rx,
            commands: commands_tx,
            task: Some(task),
        })
    }

    pub fn current(&self) -> Arc<FeedState> {
        Arc::clone(&self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<FeedState>> {
        self.state.clone()
    }

    /// Waits until the first full merge is out or an error is reported.
    pub async fn settled(&mut self) -> Arc<FeedState> {
        self.wait_for(|s| s.is_settled()).await
    }

    /// Waits for the next state satisfying `predicate`. Falls back to the
    /// last state if the worker is gone.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&Arc<FeedState>) -> bool) -> Arc<FeedState> {
        let found = self.state.wait_for(predicate).await.map(|state| Arc::clone(&state));
        found.unwrap_or_else(|_| self.current())
    }

    /// Asks the feed to re-establish any subscription that failed.
    pub fn reconnect(&self) {
        let _ = self.commands.send(FeedCommand::Reconnect);
    }

    /// Re-runs the membership checks over the current candidates. Membership
    /// writes do not touch the group documents, so callers trigger this after
    /// joining or leaving a group.
    pub fn recheck(&self) {
        let _ = self.commands.send(FeedCommand::Recheck);
    }

    /// Tears the feed down. Outstanding checks are abandoned and no further
    /// state is published. Idempotent.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("group feed closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for GroupFeed {
    fn drop(&mut self) {
        self.close();
    }
}

struct FeedWorker<S> {
    storage: Arc<S>,
    resolver: MembershipResolver<S>,
    store: AggregationStore<Group>,
    owned: Option<Subscription<Group>>,
    candidates: Option<Subscription<Group>>,
    latest_candidates: Vec<Group>,
    failed: BTreeSet<FeedStream>,
    owned_ready: bool,
    resolved_once: bool,
    state: watch::Sender<Arc<FeedState>>,
    published: Option<(u64, bool, BTreeSet<FeedStream>)>,
}

enum Step {
    Owned(Option<SubscriptionEvent<Group>>),
    Candidates(Option<SubscriptionEvent<Group>>),
    Command(Option<FeedCommand>),
}

async fn next_event(subscription: &mut Option<Subscription<Group>>) -> Option<SubscriptionEvent<Group>> {
    match subscription {
        Some(s) => s.next().await,
        None => std::future::pending().await,
    }
}

impl<S: Storage + 'static> FeedWorker<S> {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<FeedCommand>) {
        self.connect().await;
        self.publish();
        loop {
            let step = tokio::select! {
                event = next_event(&mut self.owned) => Step::Owned(event),
                event = next_event(&mut self.candidates) => Step::Candidates(event),
                command = commands.recv() => Step::Command(command),
            };
            match step {
                Step::Owned(Some(SubscriptionEvent::Snapshot(snapshot))) => self.apply_owned(snapshot),
                Step::Candidates(Some(SubscriptionEvent::Snapshot(snapshot))) => {
                    self.apply_candidates(snapshot).await
                }
                Step::Owned(Some(SubscriptionEvent::Failed(err))) => self.mark_failed(FeedStream::Owned, err),
                Step::Owned(None) => self.mark_failed(FeedStream::Owned, closed()),
                Step::Candidates(Some(SubscriptionEvent::Failed(err))) => {
                    self.mark_failed(FeedStream::Candidates, err)
                }
                Step::Candidates(None) => self.mark_failed(FeedStream::Candidates, closed()),
                Step::Command(Some(FeedCommand::Reconnect)) => self.connect().await,
                Step::Command(Some(FeedCommand::Recheck)) => {
                    let candidates = self.latest_candidates.clone();
                    self.resolve_candidates(candidates).await
                }
                Step::Command(None) => break,
            }
            self.publish();
        }
        debug!(actor = self.resolver.actor(), "group feed worker stopped");
    }

    /// Opens whichever of the two subscriptions is not running.
    async fn connect(&mut self) {
        let actor = self.resolver.actor().to_string();
        if self.owned.is_none() {
            let query = Query::new()
                .where_eq("admin_user_id", actor.as_str())
                .order_by("created_at", Direction::Descending);
            match self.storage.watch_groups(query).await {
                Ok(subscription) => {
                    self.owned = Some(subscription);
                    self.failed.remove(&FeedStream::Owned);
                }
                Err(err) => self.mark_failed(FeedStream::Owned, err),
            }
        }
        if self.candidates.is_none() {
            match self.storage.watch_groups(Query::new()).await {
                Ok(subscription) => {
                    self.candidates = Some(subscription);
                    self.failed.remove(&FeedStream::Candidates);
                }
                Err(err) => self.mark_failed(FeedStream::Candidates, err),
            }
        }
    }

    fn mark_failed(&mut self, stream: FeedStream, err: SantaError) {
        warn!(actor = self.resolver.actor(), ?stream, error = %err, "group subscription lost");
        match stream {
            FeedStream::Owned => self.owned = None,
            FeedStream::Candidates => self.candidates = None,
        }
        self.failed.insert(stream);
    }

    fn apply_owned(&mut self, snapshot: QuerySnapshot<Group>) {
        for removed in snapshot.removed() {
            self.store.retract(removed, Source::Owned);
        }
        let current: BTreeSet<&str> = snapshot.docs.iter().map(|g| g.id.as_str()).collect();
        for id in self.store.ids_from(Source::Owned) {
            if !current.contains(id.as_str()) {
                self.store.retract(&id, Source::Owned);
            }
        }
        for group in snapshot.docs {
            self.store.upsert(group, Grant::Owned);
        }
        self.owned_ready = true;
    }

    async fn apply_candidates(&mut self, snapshot: QuerySnapshot<Group>) {
        let mut removed: BTreeSet<String> = snapshot.removed().map(String::from).collect();
        let mut latest = snapshot.docs;
        // Coalesce whatever else is already queued; only the newest candidate
        // set needs a resolver pass.
        while let Some(event) = self.candidates.as_mut().and_then(Subscription::try_next) {
            match event {
                SubscriptionEvent::Snapshot(next) => {
                    removed.extend(next.removed().map(String::from));
                    latest = next.docs;
                }
                SubscriptionEvent::Failed(err) => {
                    self.mark_failed(FeedStream::Candidates, err);
                    break;
                }
            }
        }

        let present: BTreeSet<&str> = latest.iter().map(|g| g.id.as_str()).collect();
        for id in removed.iter().filter(|id| !present.contains(id.as_str())) {
            self.store.remove(id);
        }
        for id in self.store.ids_from(Source::Resolved) {
            if !present.contains(id.as_str()) {
                self.store.retract(&id, Source::Resolved);
            }
        }

        self.resolve_candidates(latest).await;
    }

    async fn resolve_candidates(&mut self, latest: Vec<Group>) {
        let resolution = self.resolver.resolve(&latest).await;
        self.latest_candidates = latest.clone();
        for group in latest {
            match resolution.access.get(&group.id) {
                Some(kind) => {
                    self.store.upsert(group, Grant::Resolved(*kind));
                }
                None => {
                    let id = group.id.clone();
                    self.store.refresh(group);
                    self.store.retract(&id, Source::Resolved);
                }
            }
        }
        self.resolved_once = true;
    }

    fn publish(&mut self) {
        let loading = !(self.owned_ready && self.resolved_once);
        let marker = (self.store.version(), loading, self.failed.clone());
        if self.published.as_ref() == Some(&marker) {
            return;
        }
        let error = (!self.failed.is_empty()).then(|| FeedError {
            streams: self.failed.iter().copied().collect(),
            message: TRANSPORT_MESSAGE.to_string(),
        });
        let version = self.state.borrow().version + 1;
        self.state.send_replace(Arc::new(FeedState {
            groups: self.store.snapshot(),
            loading,
            error,
            version,
        }));
        self.published = Some(marker);
    }
}

fn closed() -> SantaError {
    SantaError::Transport("subscription closed".to_string())
}
