use super::{ALICE, BOB, create_family_group, create_test_service};
use crate::core::constants::{GROUP_CREATED, GROUP_DELETED, GROUP_RENAMED};
use crate::core::errors::SantaError;
use crate::core::live::SubscriptionEvent;
use crate::core::models::{NewGift, Role};
use crate::core::query::{CollectionPath, Query};
use crate::infrastructure::storage::Storage;
use crate::infrastructure::storage::in_memory::Fault;

#[tokio::test]
async fn test_create_group_with_defaults() {
    let service = create_test_service();
    let group = create_family_group(&service).await;

    assert_eq!(group.name, "Family 2026");
    assert_eq!(group.admin_user_id, ALICE);
    assert_eq!(group.max_budget, 15.0);
    assert_eq!(group.invite_code.len(), 6);
    assert!(group.invite_code.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

    let members = service
        .storage()
        .find_members(&group.id, &Query::new())
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, ALICE);
    assert_eq!(members[0].role, Role::Admin);
    assert!(members[0].participant_id.is_none());

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, GROUP_CREATED);
    assert_eq!(logs[0].user_id.as_deref(), Some(ALICE));
    assert_eq!(logs[0].details["invite_code"], group.invite_code);
}

#[tokio::test]
async fn test_create_group_trims_name_and_keeps_budget() {
    let service = create_test_service();
    let group = service
        .create_group(ALICE, "  Office  ".to_string(), Some(0.0))
        .await
        .unwrap();
    assert_eq!(group.name, "Office");
    assert_eq!(group.max_budget, 0.0);
}

#[tokio::test]
async fn test_create_group_validation() {
    let service = create_test_service();

    let result = service.create_group(ALICE, "   ".to_string(), None).await;
    assert!(matches!(result, Err(SantaError::InvalidInput(field, _)) if field == "name"));

    let result = service.create_group(ALICE, "Family".to_string(), Some(-1.0)).await;
    assert!(matches!(result, Err(SantaError::InvalidInput(field, _)) if field == "max_budget"));

    let result = service.create_group(ALICE, "Family".to_string(), Some(f64::NAN)).await;
    assert!(matches!(result, Err(SantaError::InvalidInput(..))));

    let result = service.create_group("", "Family".to_string(), None).await;
    assert!(matches!(result, Err(SantaError::MissingActor)));

    assert!(service.storage().find_groups(&Query::new()).await.unwrap().is_empty());
    assert!(service.get_app_logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_group_write_leaves_nothing() {
    let service = create_test_service();
    service
        .storage()
        .inject_fault(Fault::Writes {
            path: CollectionPath::Groups,
        })
        .await;

    let result = service.create_group(ALICE, "Family".to_string(), None).await;
    assert!(matches!(result, Err(SantaError::StorageError(_))));
    assert!(service.storage().find_groups(&Query::new()).await.unwrap().is_empty());
    assert!(service.get_app_logs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_group_admin_only() {
    let service = create_test_service();
    let group = create_family_group(&service).await;

    let result = service
        .rename_group(BOB, &group.id, "Hijacked".to_string())
        .await;
    assert!(matches!(result, Err(SantaError::NotGroupAdmin(user)) if user == BOB));

    let renamed = service
        .rename_group(ALICE, &group.id, "  Family Christmas ".to_string())
        .await
        .unwrap();
    assert_eq!(renamed.name, "Family Christmas");
    assert_eq!(renamed.invite_code, group.invite_code);

    let stored = service.get_group(ALICE, &group.id).await.unwrap();
    assert_eq!(stored.name, "Family Christmas");

    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.last().unwrap().action, GROUP_RENAMED);
    assert_eq!(logs.last().unwrap().details["from"], "Family 2026");
}

#[tokio::test]
async fn test_rename_unknown_group() {
    let service = create_test_service();
    let result = service
        .rename_group(ALICE, "missing", "Name".to_string())
        .await;
    assert!(matches!(result, Err(SantaError::GroupNotFound(id)) if id == "missing"));
}

#[tokio::test]
async fn test_get_group_requires_access() {
    let service = create_test_service();
    let group = create_family_group(&service).await;

    let result = service.get_group(BOB, &group.id).await;
    assert!(matches!(result, Err(SantaError::NotGroupMember(user)) if user == BOB));

    service
        .join_group_by_code(BOB, &group.invite_code, "Bob".to_string(), "bob@example.com".to_string())
        .await
        .unwrap();
    let seen = service.get_group(BOB, &group.id).await.unwrap();
    assert_eq!(seen.id, group.id);
}

#[tokio::test]
async fn test_delete_group_cascades() {
    let service = create_test_service();
    let group = create_family_group(&service).await;
    let joined = service
        .join_group_by_code(BOB, &group.invite_code, "Bob".to_string(), "bob@example.com".to_string())
        .await
        .unwrap();
    for title in ["Book", "Scarf"] {
        service
            .add_gift(
                BOB,
                &group.id,
                &joined.participant.id,
                NewGift {
                    title: title.to_string(),
                    price: 10.0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let result = service.delete_group(BOB, &group.id).await;
    assert!(matches!(result, Err(SantaError::NotGroupAdmin(_))));

    // 2 gifts, 1 participant, 2 members, the group itself
    let deleted = service.delete_group(ALICE, &group.id).await.unwrap();
    assert_eq!(deleted, 6);

    let storage = service.storage();
    assert!(storage.get_group(&group.id).await.unwrap().is_none());
    assert!(storage.find_members(&group.id, &Query::new()).await.unwrap().is_empty());
    assert!(storage.find_participants(&group.id, &Query::new()).await.unwrap().is_empty());
    assert!(
        storage
            .find_gifts(&group.id, &joined.participant.id, &Query::new())
            .await
            .unwrap()
            .is_empty()
    );
    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs.last().unwrap().action, GROUP_DELETED);
}

#[tokio::test]
async fn test_partial_cascade_keeps_parents() {
    let service = create_test_service();
    let group = create_family_group(&service).await;
    let stuck = service
        .add_participant(ALICE, &group.id, "Bob".to_string(), "bob@example.com".to_string(), None)
        .await
        .unwrap();
    let clean = service
        .add_participant(ALICE, &group.id, "Carol".to_string(), "carol@example.com".to_string(), None)
        .await
        .unwrap();
    let gift = service
        .add_gift(
            ALICE,
            &group.id,
            &stuck.id,
            NewGift {
                title: "Lamp".to_string(),
                price: 12.0,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    service
        .storage()
        .inject_fault(Fault::Delete { id: gift.id.clone() })
        .await;

    let (deleted, failed) = match service.delete_group(ALICE, &group.id).await {
        Err(SantaError::PartialCascade { deleted, failed }) => (deleted, failed),
        other => panic!("expected a partial cascade, got {:?}", other),
    };
    // The clean participant and the admin membership went away.
    assert_eq!(deleted, 2);
    assert!(failed.iter().any(|path| path.ends_with(&gift.id)));
    assert!(failed.iter().any(|path| path.ends_with(&stuck.id)));
    assert!(failed.contains(&format!("groups/{}", group.id)));

    let storage = service.storage();
    assert!(storage.get_group(&group.id).await.unwrap().is_some());
    assert!(storage.get_participant(&group.id, &stuck.id).await.unwrap().is_some());
    assert!(storage.get_participant(&group.id, &clean.id).await.unwrap().is_none());
    assert!(storage.get_gift(&group.id, &stuck.id, &gift.id).await.unwrap().is_some());

    let logs = service.get_app_logs().await.unwrap();
    assert!(logs.iter().all(|log| log.action != GROUP_DELETED));

    // Retrying once the store accepts the delete finishes the job.
    service.storage().clear_faults().await;
    assert_eq!(service.delete_group(ALICE, &group.id).await.unwrap(), 3);
    assert!(service.storage().get_group(&group.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_watch_group_follows_document() {
    let service = create_test_service();
    let group = create_family_group(&service).await;

    let result = service.watch_group(BOB, &group.id).await;
    assert!(matches!(result, Err(SantaError::NotGroupMember(_))));

    let mut subscription = service.watch_group(ALICE, &group.id).await.unwrap();
    let Some(SubscriptionEvent::Snapshot(initial)) = subscription.next().await else {
        panic!("expected initial snapshot");
    };
    assert_eq!(initial.docs.len(), 1);

    // Another group must not show up on this subscription.
    service
        .create_group(ALICE, "Friends".to_string(), None)
        .await
        .unwrap();
    assert!(subscription.try_next().is_none());

    service
        .rename_group(ALICE, &group.id, "Renamed".to_string())
        .await
        .unwrap();
    let Some(SubscriptionEvent::Snapshot(renamed)) = subscription.next().await else {
        panic!("expected update");
    };
    assert_eq!(renamed.docs[0].name, "Renamed");
}

#[tokio::test]
async fn test_delete_group_ends_child_watchers() {
    let service = create_test_service();
    let group = create_family_group(&service).await;
    let participant = service
        .add_participant(ALICE, &group.id, "Bob".to_string(), "bob@example.com".to_string(), None)
        .await
        .unwrap();
    let mut participants = service.watch_participants(ALICE, &group.id).await.unwrap();
    let mut gifts = service.watch_gifts(ALICE, &group.id, &participant.id).await.unwrap();
    participants.next().await;
    gifts.next().await;

    service.delete_group(ALICE, &group.id).await.unwrap();

    let Some(SubscriptionEvent::Snapshot(removed)) = participants.next().await else {
        panic!("expected the participant removal");
    };
    assert_eq!(removed.removed().collect::<Vec<_>>(), vec![participant.id.as_str()]);
    // The subcollections are gone with the group, so both streams end.
    assert!(participants.next().await.is_none());
    assert!(gifts.next().await.is_none());
    assert!(!participants.is_active());
    assert!(!gifts.is_active());

    let storage = service.storage();
    assert!(storage.find_participants(&group.id, &Query::new()).await.unwrap().is_empty());
    assert!(
        storage
            .find_gifts(&group.id, &participant.id, &Query::new())
            .await
            .unwrap()
            .is_empty()
    );
}
