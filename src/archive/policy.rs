//! Eligibility rules for the three archive stages.
//!
//! The policy is evaluated once per invocation against a fixed `now`, so all
//! stages of a run agree on the cutoffs.

use chrono::{DateTime, Duration, Utc};

use crate::{
    config::{ArchiveConfig, OrphanDeletePolicy},
    db::{DbResult, QueueStatusRepo},
};

/// The three sub-workflows, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveStage {
    Pending,
    Processed,
    Orphaned,
}

impl ArchiveStage {
    pub const ALL: [ArchiveStage; 3] = [
        ArchiveStage::Pending,
        ArchiveStage::Processed,
        ArchiveStage::Orphaned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStage::Pending => "pending",
            ArchiveStage::Processed => "processed",
            ArchiveStage::Orphaned => "orphaned",
        }
    }
}

impl std::fmt::Display for ArchiveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Archive rules resolved against a single point in time.
#[derive(Debug, Clone)]
pub struct ArchivePolicy {
    enabled: bool,
    batch_size: u32,
    now: DateTime<Utc>,
    minimum_lifetime: Duration,
    orphan_delete_policy: OrphanDeletePolicy,
}

impl ArchivePolicy {
    pub fn new(config: &ArchiveConfig, now: DateTime<Utc>) -> Self {
        Self {
            enabled: config.enabled,
            batch_size: config.batch_size,
            now,
            minimum_lifetime: config.minimum_signature_lifetime(),
            orphan_delete_policy: config.orphan_delete_policy,
        }
    }

    /// Whether `stage` should run at all.
    ///
    /// Every stage is gated on the same switch; the stage is passed so each
    /// skip is logged against the stage it affected.
    pub fn allows(&self, stage: ArchiveStage) -> bool {
        if !self.enabled {
            tracing::debug!(stage = %stage, "Archiving disabled, skipping stage");
        }
        self.enabled
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn orphan_delete_policy(&self) -> OrphanDeletePolicy {
        self.orphan_delete_policy
    }

    /// Unprocessed signatures received strictly before this instant are old
    /// enough to archive.
    pub fn unprocessed_cutoff(&self) -> DateTime<Utc> {
        self.now - self.minimum_lifetime
    }

    /// Orphaned validations whose window closed strictly before this instant
    /// are eligible.
    pub fn orphan_cutoff(&self) -> DateTime<Utc> {
        self.now
    }
}

/// The latest instant before which every upstream queue is known to have
/// been drained and every signature is past its minimum lifetime.
///
/// `drains` holds the last-emptied timestamp of each upstream queue; a queue
/// that has never been drained counts as drained at the Unix epoch.
pub fn last_fully_emptied<I>(now: DateTime<Utc>, minimum_lifetime: Duration, drains: I) -> DateTime<Utc>
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    drains
        .into_iter()
        .map(|drained| drained.unwrap_or(DateTime::UNIX_EPOCH))
        .fold(now - minimum_lifetime, std::cmp::min)
}

/// Resolve the watermark by reading the configured upstream queues.
pub async fn query_last_fully_emptied(
    repo: &dyn QueueStatusRepo,
    config: &ArchiveConfig,
    now: DateTime<Utc>,
) -> DbResult<DateTime<Utc>> {
    let mut drains = Vec::with_capacity(config.upstream_queues.len());
    for queue in &config.upstream_queues {
        let drained = repo.last_emptied(queue).await?;
        tracing::debug!(queue = %queue, last_emptied = ?drained, "Read queue drain status");
        drains.push(drained);
    }

    Ok(last_fully_emptied(
        now,
        config.minimum_signature_lifetime(),
        drains,
    ))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn policy() -> ArchivePolicy {
        ArchivePolicy::new(&ArchiveConfig::default(), now())
    }

    fn recent() -> DateTime<Utc> {
        now() - Duration::hours(1)
    }

    fn older() -> DateTime<Utc> {
        now() - Duration::days(30)
    }

    #[test]
    fn test_cutoffs_follow_clock_and_lifetime() {
        assert_eq!(policy().unprocessed_cutoff(), now() - Duration::days(14));
        assert_eq!(policy().orphan_cutoff(), now());

        let config = ArchiveConfig {
            minimum_signature_lifetime_days: 0,
            ..Default::default()
        };
        assert_eq!(ArchivePolicy::new(&config, now()).unprocessed_cutoff(), now());
    }

    #[test]
    fn test_policy_carries_batch_and_orphan_settings() {
        let config = ArchiveConfig {
            batch_size: 7,
            orphan_delete_policy: OrphanDeletePolicy::Confirmed,
            ..Default::default()
        };
        let p = ArchivePolicy::new(&config, now());
        assert_eq!(p.batch_size(), 7);
        assert_eq!(p.orphan_delete_policy(), OrphanDeletePolicy::Confirmed);
        assert_eq!(policy().orphan_delete_policy(), OrphanDeletePolicy::Selected);
    }

    #[test]
    fn test_disabled_blocks_every_stage() {
        let config = ArchiveConfig {
            enabled: false,
            ..Default::default()
        };
        let p = ArchivePolicy::new(&config, now());
        for stage in ArchiveStage::ALL {
            assert!(!p.allows(stage));
        }
        assert!(ArchiveStage::ALL.iter().all(|s| policy().allows(*s)));
    }

    #[rstest]
    #[case::recent_drains_bounded_by_lifetime(vec![Some(recent()), Some(recent())], now() - Duration::days(14))]
    #[case::lagging_queue(vec![Some(recent()), Some(older())], older())]
    #[case::never_drained_pins_epoch(vec![Some(recent()), None], DateTime::UNIX_EPOCH)]
    #[case::no_upstream_queues(vec![], now() - Duration::days(14))]
    fn test_last_fully_emptied_takes_minimum(
        #[case] drains: Vec<Option<DateTime<Utc>>>,
        #[case] expected: DateTime<Utc>,
    ) {
        assert_eq!(last_fully_emptied(now(), Duration::days(14), drains), expected);
    }

    #[cfg(feature = "database-sqlite")]
    #[tokio::test]
    async fn test_query_last_fully_emptied() {
        use crate::db::{
            sqlite::SqliteQueueStatusRepo,
            tests::harness::{create_sqlite_pool, run_sqlite_live_migrations},
        };

        let pool = create_sqlite_pool().await;
        run_sqlite_live_migrations(&pool).await;
        let repo = SqliteQueueStatusRepo::new(pool);
        let config = ArchiveConfig::default();

        // Neither queue has drained yet
        let mark = query_last_fully_emptied(&repo, &config, now()).await.unwrap();
        assert_eq!(mark, DateTime::UNIX_EPOCH);

        let drained = now() - Duration::days(20);
        repo.record_emptied("signatures_pending", drained)
            .await
            .unwrap();
        repo.record_emptied("validations_pending", now())
            .await
            .unwrap();

        let mark = query_last_fully_emptied(&repo, &config, now()).await.unwrap();
        assert_eq!(mark, drained);
    }
}
