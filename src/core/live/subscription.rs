//! Live query subscriptions.
//!
//! The store side holds a [`SubscriptionSink`] per active query and pushes a
//! fresh [`QuerySnapshot`] after every write that changes the query result.
//! The consumer side is a [`Subscription`]: an initial snapshot, then deltas,
//! until the transport fails or the consumer cancels.

use std::collections::HashMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::errors::SantaError;
use crate::core::query::{CollectionPath, Document, Query};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub id: String,
}

/// Full ordered result of a query plus what changed since the previous one.
#[derive(Clone, Debug)]
pub struct QuerySnapshot<T> {
    pub docs: Vec<T>,
    pub changes: Vec<DocumentChange>,
}

impl<T> QuerySnapshot<T> {
    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.changes
            .iter()
            .filter(|c| c.kind == ChangeKind::Removed)
            .map(|c| c.id.as_str())
    }
}

#[derive(Debug)]
pub enum SubscriptionEvent<T> {
    Snapshot(QuerySnapshot<T>),
    /// Terminal. Nothing more is delivered on this subscription.
    Failed(SantaError),
}

pub struct Subscription<T> {
    path: CollectionPath,
    events: Option<mpsc::UnboundedReceiver<SubscriptionEvent<T>>>,
}

impl<T: Document> Subscription<T> {
    /// Creates a connected sink/subscription pair for `query` on `path`.
    pub fn channel(path: CollectionPath, query: Query) -> (SubscriptionSink<T>, Subscription<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = SubscriptionSink {
            query,
            tx,
            last: HashMap::new(),
            primed: false,
        };
        let subscription = Subscription {
            path,
            events: Some(rx),
        };
        (sink, subscription)
    }

    pub fn path(&self) -> &CollectionPath {
        &self.path
    }

    /// Next event, or `None` once the subscription failed or was cancelled.
    pub async fn next(&mut self) -> Option<SubscriptionEvent<T>> {
        let received = self.events.as_mut()?.recv().await;
        self.settle(received)
    }

    /// Like [`Subscription::next`] but returns `None` straight away when
    /// nothing is queued.
    pub fn try_next(&mut self) -> Option<SubscriptionEvent<T>> {
        match self.events.as_mut()?.try_recv() {
            Ok(event) => self.settle(Some(event)),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => self.settle(None),
        }
    }

    fn settle(&mut self, received: Option<SubscriptionEvent<T>>) -> Option<SubscriptionEvent<T>> {
        match received {
            Some(SubscriptionEvent::Failed(err)) => {
                debug!(path = %self.path, error = %err, "subscription failed");
                self.events = None;
                Some(SubscriptionEvent::Failed(err))
            }
            Some(event) => Some(event),
            None => {
                self.events = None;
                None
            }
        }
    }

    /// Stops delivery. Calling this more than once is harmless.
    pub fn cancel(&mut self) {
        if let Some(mut events) = self.events.take() {
            events.close();
            debug!(path = %self.path, "subscription cancelled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.events.is_some()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(mut events) = self.events.take() {
            events.close();
        }
    }
}

/// Producer half of a [`Subscription`], owned by the document store.
pub struct SubscriptionSink<T> {
    query: Query,
    tx: mpsc::UnboundedSender<SubscriptionEvent<T>>,
    last: HashMap<String, T>,
    primed: bool,
}

impl<T: Document + PartialEq> SubscriptionSink<T> {
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Recomputes the query over `docs` and pushes a snapshot when the result
    /// changed. The first call always delivers. Returns `false` once the
    /// consumer is gone.
    pub fn publish<'a>(&mut self, docs: impl IntoIterator<Item = &'a T>) -> bool {
        let current = self.query.select(docs);
        let mut changes = Vec::new();
        for doc in &current {
            match self.last.get(doc.id()) {
                None => changes.push(DocumentChange {
                    kind: ChangeKind::Added,
                    id: doc.id().to_string(),
                }),
                Some(previous) if previous != doc => changes.push(DocumentChange {
                    kind: ChangeKind::Modified,
                    id: doc.id().to_string(),
                }),
                Some(_) => {}
            }
        }
        let mut removed: Vec<&String> = self
            .last
            .keys()
            .filter(|id| !current.iter().any(|d| d.id() == id.as_str()))
            .collect();
        removed.sort();
        changes.extend(removed.into_iter().map(|id| DocumentChange {
            kind: ChangeKind::Removed,
            id: id.clone(),
        }));

        if self.primed && changes.is_empty() {
            return !self.is_closed();
        }
        self.primed = true;
        self.last = current.iter().map(|d| (d.id().to_string(), d.clone())).collect();
        self.tx
            .send(SubscriptionEvent::Snapshot(QuerySnapshot { docs: current, changes }))
            .is_ok()
    }

    /// Reports a transport failure and closes this sink.
    pub fn fail(self, err: SantaError) {
        let _ = self.tx.send(SubscriptionEvent::Failed(err));
    }
}
