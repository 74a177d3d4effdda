//! Bounded, read-only selection of eligible live rows.

use crate::{
    archive::policy::ArchivePolicy,
    db::{DbResult, SignatureQueueRepo},
    models::ArchiveBatch,
};

/// Rows picked up by the processed stage.
#[derive(Debug)]
pub struct ProcessedSelection {
    pub signatures: ArchiveBatch,
    /// Validation tokens sharing a secret key with one of `signatures`.
    pub validations: ArchiveBatch,
}

impl ProcessedSelection {
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty() && self.validations.is_empty()
    }
}

/// Unprocessed, unmatched signatures past the minimum lifetime.
pub async fn select_pending(
    repo: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
) -> DbResult<ArchiveBatch> {
    let cutoff = policy.unprocessed_cutoff();
    let rows = repo
        .list_unprocessed_unmatched(cutoff, policy.batch_size())
        .await?;

    tracing::debug!(
        selected = rows.len(),
        received_before = %cutoff,
        limit = policy.batch_size(),
        "Selected unvalidated signatures"
    );

    Ok(ArchiveBatch::not_validated_signatures(rows))
}

/// Processed signatures of any age, plus their validation tokens.
pub async fn select_processed(
    repo: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
) -> DbResult<ProcessedSelection> {
    let signatures = repo.list_processed(policy.batch_size()).await?;

    let mut secret_keys: Vec<String> = signatures.iter().map(|s| s.secret_key.clone()).collect();
    secret_keys.sort_unstable();
    secret_keys.dedup();

    let validations = if secret_keys.is_empty() {
        Vec::new()
    } else {
        repo.list_validations_by_secret_keys(&secret_keys).await?
    };

    tracing::debug!(
        signatures = signatures.len(),
        validations = validations.len(),
        limit = policy.batch_size(),
        "Selected processed signatures"
    );

    Ok(ProcessedSelection {
        signatures: ArchiveBatch::processed_signatures(signatures),
        validations: ArchiveBatch::processed_validations(validations),
    })
}

/// Validation tokens with no signature whose validation window has closed.
pub async fn select_orphaned(
    repo: &dyn SignatureQueueRepo,
    policy: &ArchivePolicy,
) -> DbResult<ArchiveBatch> {
    let cutoff = policy.orphan_cutoff();
    let rows = repo
        .list_orphaned_validations(cutoff, policy.batch_size())
        .await?;

    tracing::debug!(
        selected = rows.len(),
        closed_before = %cutoff,
        limit = policy.batch_size(),
        "Selected orphaned validations"
    );

    Ok(ArchiveBatch::orphaned_validations(rows))
}

#[cfg(all(test, feature = "database-sqlite"))]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        config::ArchiveConfig,
        db::{
            sqlite::SqliteSignatureQueueRepo,
            tests::{
                fixtures::{signature, validation},
                harness::{create_sqlite_pool, run_sqlite_live_migrations},
            },
        },
        models::ArchiveTable,
    };

    async fn repo() -> SqliteSignatureQueueRepo {
        let pool = create_sqlite_pool().await;
        run_sqlite_live_migrations(&pool).await;
        SqliteSignatureQueueRepo::new(pool)
    }

    fn policy(batch_size: u32) -> ArchivePolicy {
        let config = ArchiveConfig {
            batch_size,
            ..Default::default()
        };
        ArchivePolicy::new(&config, Utc::now())
    }

    #[tokio::test]
    async fn test_select_pending_respects_batch_size() {
        let repo = repo().await;
        for i in 0..5 {
            repo.enqueue_signature(&signature(&format!("k{i}"), Duration::days(20 + i), false))
                .await
                .unwrap();
        }

        let batch = select_pending(&repo, &policy(3)).await.unwrap();
        assert_eq!(batch.table(), ArchiveTable::SignaturesNotValidated);
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn test_select_processed_includes_matching_validations() {
        let repo = repo().await;
        let processed = signature("done", Duration::hours(1), true);
        let pending = signature("waiting", Duration::hours(1), false);
        let closes = Utc::now() + Duration::days(1);
        let matching = validation("done", closes);
        let unrelated = validation("waiting", closes);

        repo.enqueue_signature(&processed).await.unwrap();
        repo.enqueue_signature(&pending).await.unwrap();
        repo.enqueue_validation(&matching).await.unwrap();
        repo.enqueue_validation(&unrelated).await.unwrap();

        let selection = select_processed(&repo, &policy(10)).await.unwrap();
        assert_eq!(selection.signatures.ids(), vec![processed.id]);
        assert_eq!(selection.validations.ids(), vec![matching.id]);
        assert_eq!(
            selection.validations.table(),
            ArchiveTable::ValidationsProcessed
        );
    }

    #[tokio::test]
    async fn test_select_processed_empty() {
        let repo = repo().await;
        let selection = select_processed(&repo, &policy(10)).await.unwrap();
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_select_orphaned() {
        let repo = repo().await;
        let orphan = validation("lost", Utc::now() - Duration::days(2));
        repo.enqueue_validation(&orphan).await.unwrap();
        repo.enqueue_validation(&validation("open", Utc::now() + Duration::days(2)))
            .await
            .unwrap();

        let batch = select_orphaned(&repo, &policy(10)).await.unwrap();
        assert_eq!(batch.ids(), vec![orphan.id]);
        assert_eq!(batch.table(), ArchiveTable::ValidationsOrphaned);
    }
}
