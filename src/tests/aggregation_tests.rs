use crate::core::live::{AggregationStore, Grant, Source};
use crate::core::models::{AccessKind, Group};
use chrono::{TimeZone, Utc};

fn group(id: &str, created_secs: i64) -> Group {
    Group {
        id: id.to_string(),
        name: format!("Group {}", id),
        admin_user_id: "owner".to_string(),
        max_budget: 15.0,
        invite_code: "ABC123".to_string(),
        created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
    }
}

fn ids(store: &AggregationStore<Group>) -> Vec<String> {
    store.snapshot().into_iter().map(|e| e.record.id).collect()
}

#[test]
fn test_retract_absent_id_is_noop() {
    let mut store: AggregationStore<Group> = AggregationStore::new();
    store.upsert(group("g1", 10), Grant::Owned);
    let version = store.version();

    assert!(!store.retract("missing", Source::Owned));
    assert!(!store.retract("missing", Source::Resolved));
    assert_eq!(store.version(), version);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_retract_unjustified_source_is_noop() {
    let mut store = AggregationStore::new();
    store.upsert(group("g1", 10), Grant::Owned);
    let version = store.version();

    assert!(!store.retract("g1", Source::Resolved));
    assert_eq!(store.version(), version);
    assert!(store.contains("g1"));
}

#[test]
fn test_admin_dominates_member_with_single_entry() {
    let mut store = AggregationStore::new();
    store.upsert(group("g1", 10), Grant::Resolved(AccessKind::Member));
    store.upsert(group("g1", 10), Grant::Owned);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].access_kind, AccessKind::Admin);

    // Losing ownership falls back to the membership grant.
    store.retract("g1", Source::Owned);
    assert_eq!(store.access_kind("g1"), Some(AccessKind::Member));
    store.retract("g1", Source::Resolved);
    assert!(store.is_empty());
}

#[test]
fn test_permutations_converge() {
    #[derive(Clone, Copy)]
    enum Op {
        Own(&'static str),
        Member(&'static str),
        Drop(&'static str, Source),
    }

    let ops = [
        Op::Own("a"),
        Op::Member("b"),
        Op::Member("a"),
        Op::Drop("b", Source::Resolved),
        Op::Own("c"),
    ];
    let apply = |order: &[usize]| {
        let mut store = AggregationStore::new();
        for &i in order {
            match ops[i] {
                Op::Own(id) => store.upsert(group(id, 1), Grant::Owned),
                Op::Member(id) => store.upsert(group(id, 1), Grant::Resolved(AccessKind::Member)),
                Op::Drop(id, source) => store.retract(id, source),
            };
        }
        store
            .snapshot()
            .into_iter()
            .map(|e| (e.record.id, e.access_kind))
            .collect::<Vec<_>>()
    };

    // Retracting "b" only commutes with its grant when the grant came first,
    // so keep index 1 before index 3 and shuffle everything else.
    let orders: [[usize; 5]; 4] = [[0, 1, 2, 3, 4], [4, 2, 1, 0, 3], [1, 3, 4, 0, 2], [2, 4, 1, 3, 0]];
    let expected = apply(&orders[0]);
    for order in &orders[1..] {
        assert_eq!(apply(order), expected);
    }
    assert_eq!(
        expected,
        vec![("a".to_string(), AccessKind::Admin), ("c".to_string(), AccessKind::Admin)]
    );
}

#[test]
fn test_last_writer_wins_on_body() {
    let mut store = AggregationStore::new();
    store.upsert(group("g1", 10), Grant::Owned);
    let mut renamed = group("g1", 10);
    renamed.name = "Renamed".to_string();
    store.upsert(renamed, Grant::Resolved(AccessKind::Admin));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].record.name, "Renamed");
}

#[test]
fn test_refresh_ignores_absent_ids() {
    let mut store = AggregationStore::new();
    assert!(!store.refresh(group("g1", 10)));
    assert!(store.is_empty());

    store.upsert(group("g1", 10), Grant::Owned);
    let mut renamed = group("g1", 10);
    renamed.name = "Renamed".to_string();
    assert!(store.refresh(renamed));
    assert_eq!(store.snapshot()[0].record.name, "Renamed");
}

#[test]
fn test_snapshot_sorted_newest_first() {
    let mut store = AggregationStore::new();
    store.upsert(group("old", 100), Grant::Owned);
    store.upsert(group("new", 300), Grant::Resolved(AccessKind::Member));
    store.upsert(group("mid", 200), Grant::Owned);

    assert_eq!(ids(&store), vec!["new", "mid", "old"]);
}

#[test]
fn test_equal_created_at_sorts_by_id() {
    let mut store = AggregationStore::new();
    store.upsert(group("zeta", 100), Grant::Owned);
    store.upsert(group("alpha", 100), Grant::Owned);
    store.upsert(group("mu", 100), Grant::Resolved(AccessKind::Member));

    assert_eq!(ids(&store), vec!["alpha", "mu", "zeta"]);
}

#[test]
fn test_unchanged_upsert_keeps_version() {
    let mut store = AggregationStore::new();
    assert!(store.upsert(group("g1", 10), Grant::Owned));
    let version = store.version();
    assert!(!store.upsert(group("g1", 10), Grant::Owned));
    assert_eq!(store.version(), version);
}
