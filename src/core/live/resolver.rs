use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::errors::SantaError;
use crate::core::models::{AccessKind, Group};
use crate::core::query::Query;
use crate::infrastructure::storage::Storage;

/// Outcome of one resolver pass over the candidate groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Groups the actor can currently reach.
    pub access: BTreeMap<String, AccessKind>,
    /// Groups whose membership check failed. Their previous access-kind, if
    /// any, is carried over into `access`.
    pub unknown: BTreeSet<String>,
}

/// Decides which groups an actor reaches, directly as admin or through a
/// membership record.
pub struct MembershipResolver<S> {
    storage: Arc<S>,
    actor: String,
    known: BTreeMap<String, AccessKind>,
}

impl<S: Storage> MembershipResolver<S> {
    pub fn new(storage: Arc<S>, actor: &str) -> Result<Self, SantaError> {
        if actor.trim().is_empty() {
            return Err(SantaError::MissingActor);
        }
        Ok(MembershipResolver {
            storage,
            actor: actor.to_string(),
            known: BTreeMap::new(),
        })
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Access-kinds from the last completed pass.
    pub fn known(&self) -> &BTreeMap<String, AccessKind> {
        &self.known
    }

    /// Checks every candidate concurrently and merges once all checks have
    /// settled. Candidates owned by the actor skip the membership read.
    pub async fn resolve(&mut self, candidates: &[Group]) -> Resolution {
        let actor = self.actor.as_str();
        let storage = &self.storage;
        let checks = candidates.iter().filter(|g| !g.is_admin(actor)).map(|group| async move {
            let query = Query::new().where_eq("user_id", actor);
            let linked = storage
                .find_members(&group.id, &query)
                .await
                .map(|records| !records.is_empty());
            (group.id.as_str(), linked)
        });
        let outcomes = join_all(checks).await;

        let mut resolution = Resolution::default();
        for group in candidates.iter().filter(|g| g.is_admin(actor)) {
            resolution.access.insert(group.id.clone(), AccessKind::Admin);
        }
        for (group_id, linked) in outcomes {
            match linked {
                Ok(true) => {
                    resolution.access.insert(group_id.to_string(), AccessKind::Member);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(group_id, error = %err, "membership check failed, keeping previous access");
                    resolution.unknown.insert(group_id.to_string());
                    if let Some(previous) = self.known.get(group_id) {
                        resolution.access.insert(group_id.to_string(), *previous);
                    }
                }
            }
        }

        debug!(
            actor = %self.actor,
            candidates = candidates.len(),
            granted = resolution.access.len(),
            unknown = resolution.unknown.len(),
            "membership resolved"
        );
        self.known = resolution.access.clone();
        resolution
    }
}
