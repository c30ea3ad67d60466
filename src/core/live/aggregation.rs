//! Keyed merge of records reached through more than one live source.
//!
//! Every entry carries the justifications that keep it in the store: direct
//! ownership and/or a resolved membership. An entry with no justification
//! left is dropped, so the store never holds an id nobody vouches for.

use serde::Serialize;
use std::collections::HashMap;

use crate::core::models::AccessKind;
use crate::core::query::Chronological;

/// Where a justification comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    /// The owner-filtered subscription.
    Owned,
    /// A membership resolver pass.
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grant {
    Owned,
    Resolved(AccessKind),
}

/// A record plus how the actor reaches it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry<T> {
    #[serde(flatten)]
    pub record: T,
    pub access_kind: AccessKind,
}

#[derive(Clone, Debug)]
struct Slot<T> {
    record: T,
    owned: bool,
    resolved: Option<AccessKind>,
}

impl<T> Slot<T> {
    fn access_kind(&self) -> Option<AccessKind> {
        let owned = self.owned.then_some(AccessKind::Admin);
        match (owned, self.resolved) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, b) => a.or(b),
        }
    }

    fn is_justified(&self) -> bool {
        self.owned || self.resolved.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct AggregationStore<T> {
    slots: HashMap<String, Slot<T>>,
    version: u64,
}

impl<T> Default for AggregationStore<T> {
    fn default() -> Self {
        AggregationStore {
            slots: HashMap::new(),
            version: 0,
        }
    }
}

impl<T: Chronological + PartialEq> AggregationStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `record` (last writer wins) and records `grant`
    /// for it. Returns `true` when the store contents changed.
    pub fn upsert(&mut self, record: T, grant: Grant) -> bool {
        let id = record.id().to_string();
        let changed = match self.slots.get_mut(&id) {
            Some(slot) => {
                let mut changed = false;
                if slot.record != record {
                    slot.record = record;
                    changed = true;
                }
                match grant {
                    Grant::Owned if !slot.owned => {
                        slot.owned = true;
                        changed = true;
                    }
                    Grant::Resolved(kind) if slot.resolved != Some(kind) => {
                        slot.resolved = Some(kind);
                        changed = true;
                    }
                    _ => {}
                }
                changed
            }
            None => {
                let (owned, resolved) = match grant {
                    Grant::Owned => (true, None),
                    Grant::Resolved(kind) => (false, Some(kind)),
                };
                self.slots.insert(
                    id,
                    Slot {
                        record,
                        owned,
                        resolved,
                    },
                );
                true
            }
        };
        self.bump(changed)
    }

    /// Overwrites the body of an entry already present, leaving its
    /// justifications alone. Absent ids are ignored.
    pub fn refresh(&mut self, record: T) -> bool {
        let changed = match self.slots.get_mut(record.id()) {
            Some(slot) if slot.record != record => {
                slot.record = record;
                true
            }
            _ => false,
        };
        self.bump(changed)
    }

    /// Withdraws one justification for `id`. The entry leaves the store once
    /// nothing justifies it. A no-op when `id` is absent or `source` never
    /// vouched for it.
    pub fn retract(&mut self, id: &str, source: Source) -> bool {
        let Some(slot) = self.slots.get_mut(id) else {
            return false;
        };
        let changed = match source {
            Source::Owned => std::mem::replace(&mut slot.owned, false),
            Source::Resolved => slot.resolved.take().is_some(),
        };
        if !slot.is_justified() {
            self.slots.remove(id);
        }
        self.bump(changed)
    }

    /// Drops `id` regardless of what justified it.
    pub fn remove(&mut self, id: &str) -> bool {
        let changed = self.slots.remove(id).is_some();
        self.bump(changed)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    pub fn access_kind(&self, id: &str) -> Option<AccessKind> {
        self.slots.get(id).and_then(Slot::access_kind)
    }

    /// Ids currently vouched for by `source`.
    pub fn ids_from(&self, source: Source) -> Vec<String> {
        let mut ids: Vec<String> = self
            .slots
            .iter()
            .filter(|(_, slot)| match source {
                Source::Owned => slot.owned,
                Source::Resolved => slot.resolved.is_some(),
            })
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Incremented on every effective change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Every entry, newest `created_at` first, ties by id ascending.
    pub fn snapshot(&self) -> Vec<Entry<T>> {
        let mut entries: Vec<Entry<T>> = self
            .slots
            .values()
            .filter_map(|slot| {
                slot.access_kind().map(|access_kind| Entry {
                    record: slot.record.clone(),
                    access_kind,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.record
                .created_at()
                .cmp(&a.record.created_at())
                .then_with(|| a.record.id().cmp(b.record.id()))
        });
        entries
    }

    fn bump(&mut self, changed: bool) -> bool {
        if changed {
            self.version += 1;
        }
        changed
    }
}
