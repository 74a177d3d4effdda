//! Shared tests for SignatureQueueRepo implementations

use chrono::{Duration, Utc};

use super::fixtures::{signature, signature_at, validation};
use crate::{db::repos::SignatureQueueRepo, models::LiveQueue};

// ============================================================================
// Enqueue / Count Tests
// ============================================================================

pub async fn test_enqueue_and_count(repo: &dyn SignatureQueueRepo) {
    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 0);
    assert_eq!(repo.count(LiveQueue::Validations).await.unwrap(), 0);

    repo.enqueue_signature(&signature("k1", Duration::days(1), false))
        .await
        .expect("Failed to enqueue signature");
    repo.enqueue_signature(&signature("k2", Duration::days(1), false))
        .await
        .expect("Failed to enqueue signature");
    repo.enqueue_validation(&validation("k1", Utc::now() + Duration::days(1)))
        .await
        .expect("Failed to enqueue validation");

    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 2);
    assert_eq!(repo.count(LiveQueue::Validations).await.unwrap(), 1);
}

// ============================================================================
// Selection Tests
// ============================================================================

pub async fn test_unprocessed_unmatched_filters(repo: &dyn SignatureQueueRepo) {
    let now = Utc::now();
    let cutoff = now - Duration::days(14);

    let eligible = signature("old-unmatched", Duration::days(20), false);
    let too_young = signature("young", Duration::days(3), false);
    let matched = signature("old-matched", Duration::days(20), false);
    let processed = signature("old-processed", Duration::days(20), true);

    for sig in [&eligible, &too_young, &matched, &processed] {
        repo.enqueue_signature(sig).await.unwrap();
    }
    repo.enqueue_validation(&validation("old-matched", now + Duration::days(1)))
        .await
        .unwrap();

    let selected = repo.list_unprocessed_unmatched(cutoff, 100).await.unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0], eligible);
}

pub async fn test_unprocessed_unmatched_oldest_first_with_limit(repo: &dyn SignatureQueueRepo) {
    let now = Utc::now();
    let oldest = signature_at("a", now - Duration::days(40), false);
    let middle = signature_at("b", now - Duration::days(30), false);
    let newest = signature_at("c", now - Duration::days(20), false);

    // Insert out of order
    for sig in [&middle, &newest, &oldest] {
        repo.enqueue_signature(sig).await.unwrap();
    }

    let selected = repo
        .list_unprocessed_unmatched(now - Duration::days(14), 2)
        .await
        .unwrap();
    let ids: Vec<_> = selected.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![oldest.id, middle.id]);
}

pub async fn test_list_processed_ignores_age(repo: &dyn SignatureQueueRepo) {
    let fresh = signature("fresh", Duration::minutes(5), true);
    let old = signature("old", Duration::days(100), true);
    let unprocessed = signature("pending", Duration::days(100), false);

    for sig in [&fresh, &old, &unprocessed] {
        repo.enqueue_signature(sig).await.unwrap();
    }

    let selected = repo.list_processed(10).await.unwrap();
    let ids: Vec<_> = selected.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![old.id, fresh.id]);
}

pub async fn test_validations_by_secret_keys(repo: &dyn SignatureQueueRepo) {
    let closes = Utc::now() + Duration::days(1);
    let v1 = validation("k1", closes);
    let v2 = validation("k2", closes);
    let other = validation("k3", closes);
    for v in [&v1, &v2, &other] {
        repo.enqueue_validation(v).await.unwrap();
    }

    let mut found = repo
        .list_validations_by_secret_keys(&["k1".to_string(), "k2".to_string()])
        .await
        .unwrap();
    found.sort_by_key(|v| v.secret_key.clone());
    assert_eq!(found, vec![v1, v2]);

    let none = repo.list_validations_by_secret_keys(&[]).await.unwrap();
    assert!(none.is_empty());
}

pub async fn test_orphaned_validations(repo: &dyn SignatureQueueRepo) {
    let now = Utc::now();

    let orphan_closed = validation("gone", now - Duration::days(1));
    let orphan_open = validation("gone-later", now + Duration::days(1));
    let matched_closed = validation("still-here", now - Duration::days(1));
    for v in [&orphan_closed, &orphan_open, &matched_closed] {
        repo.enqueue_validation(v).await.unwrap();
    }
    repo.enqueue_signature(&signature("still-here", Duration::days(2), false))
        .await
        .unwrap();

    let selected = repo.list_orphaned_validations(now, 100).await.unwrap();
    assert_eq!(selected, vec![orphan_closed]);
}

// ============================================================================
// Deletion Tests
// ============================================================================

pub async fn test_delete_by_ids(repo: &dyn SignatureQueueRepo) {
    let keep = signature("keep", Duration::days(1), false);
    let drop_a = signature("a", Duration::days(1), false);
    let drop_b = signature("b", Duration::days(1), false);
    for sig in [&keep, &drop_a, &drop_b] {
        repo.enqueue_signature(sig).await.unwrap();
    }

    let deleted = repo
        .delete_by_ids(LiveQueue::Signatures, &[drop_a.id, drop_b.id])
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 1);

    // Already gone
    let deleted = repo
        .delete_by_ids(LiveQueue::Signatures, &[drop_a.id])
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    let deleted = repo.delete_by_ids(LiveQueue::Signatures, &[]).await.unwrap();
    assert_eq!(deleted, 0);
    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 1);
}

pub async fn test_delete_only_touches_named_queue(repo: &dyn SignatureQueueRepo) {
    let sig = signature("k", Duration::days(1), false);
    let val = validation("k", Utc::now());
    repo.enqueue_signature(&sig).await.unwrap();
    repo.enqueue_validation(&val).await.unwrap();

    // A signature id against the validations queue matches nothing
    let deleted = repo
        .delete_by_ids(LiveQueue::Validations, &[sig.id])
        .await
        .unwrap();
    assert_eq!(deleted, 0);

    let deleted = repo
        .delete_by_ids(LiveQueue::Validations, &[val.id])
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 1);
}

pub async fn test_delete_many_ids_in_chunks(repo: &dyn SignatureQueueRepo) {
    let mut ids = Vec::new();
    for i in 0..1200 {
        let sig = signature(&format!("bulk-{i}"), Duration::days(1), false);
        ids.push(sig.id);
        repo.enqueue_signature(&sig).await.unwrap();
    }

    let deleted = repo
        .delete_by_ids(LiveQueue::Signatures, &ids)
        .await
        .unwrap();
    assert_eq!(deleted, 1200);
    assert_eq!(repo.count(LiveQueue::Signatures).await.unwrap(), 0);
}

// ============================================================================
// SQLite Tests
// ============================================================================

#[cfg(feature = "database-sqlite")]
mod sqlite_tests {
    use crate::db::{
        sqlite::SqliteSignatureQueueRepo,
        tests::harness::{create_sqlite_pool, run_sqlite_live_migrations},
    };

    async fn create_repo() -> SqliteSignatureQueueRepo {
        let pool = create_sqlite_pool().await;
        run_sqlite_live_migrations(&pool).await;
        SqliteSignatureQueueRepo::new(pool)
    }

    macro_rules! sqlite_test {
        ($name:ident) => {
            #[tokio::test]
            async fn $name() {
                let repo = create_repo().await;
                super::$name(&repo).await;
            }
        };
    }

    sqlite_test!(test_enqueue_and_count);
    sqlite_test!(test_unprocessed_unmatched_filters);
    sqlite_test!(test_unprocessed_unmatched_oldest_first_with_limit);
    sqlite_test!(test_list_processed_ignores_age);
    sqlite_test!(test_validations_by_secret_keys);
    sqlite_test!(test_orphaned_validations);
    sqlite_test!(test_delete_by_ids);
    sqlite_test!(test_delete_only_touches_named_queue);
    sqlite_test!(test_delete_many_ids_in_chunks);
}

// ============================================================================
// PostgreSQL Tests
// ============================================================================

#[cfg(feature = "database-postgres")]
mod postgres_tests {
    use crate::db::{
        postgres::PostgresSignatureQueueRepo,
        tests::harness::postgres::{create_isolated_postgres_pool, run_postgres_live_migrations},
    };

    macro_rules! postgres_test {
        ($name:ident) => {
            #[tokio::test]
            #[ignore = "Requires Docker - run with `cargo test -- --ignored`"]
            async fn $name() {
                let pool = create_isolated_postgres_pool().await;
                run_postgres_live_migrations(&pool).await;
                let repo = PostgresSignatureQueueRepo::new(pool, None);
                super::$name(&repo).await;
            }
        };
    }

    postgres_test!(test_enqueue_and_count);
    postgres_test!(test_unprocessed_unmatched_filters);
    postgres_test!(test_unprocessed_unmatched_oldest_first_with_limit);
    postgres_test!(test_list_processed_ignores_age);
    postgres_test!(test_validations_by_secret_keys);
    postgres_test!(test_orphaned_validations);
    postgres_test!(test_delete_by_ids);
    postgres_test!(test_delete_only_touches_named_queue);
    postgres_test!(test_delete_many_ids_in_chunks);
}
