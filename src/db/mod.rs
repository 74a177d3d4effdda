mod error;
#[cfg(feature = "database-postgres")]
pub mod postgres;
pub mod repos;
#[cfg(feature = "database-sqlite")]
pub mod sqlite;
mod stores;

#[cfg(all(test, any(feature = "database-sqlite", feature = "database-postgres")))]
pub mod tests;

use std::sync::Arc;

pub use error::{DbError, DbResult};
pub use repos::*;
pub use stores::{ArchiveContext, Stores};

use crate::config::DatabaseConfig;

/// Which side of the pipeline a pool serves. Decides the migration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreRole {
    /// The operational store holding the signature and validation queues
    Live,
    /// The archive store receiving durable copies
    Archive,
}

impl std::fmt::Display for StoreRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreRole::Live => write!(f, "live"),
            StoreRole::Archive => write!(f, "archive"),
        }
    }
}

/// PostgreSQL pool configuration with optional read replica.
#[cfg(feature = "database-postgres")]
pub struct PgPoolPair {
    /// Primary pool for writes.
    pub write: sqlx::PgPool,
    /// Optional read replica pool. If None, reads use the write pool.
    pub read: Option<sqlx::PgPool>,
}

#[cfg(feature = "database-postgres")]
impl PgPoolPair {
    /// Get the pool to use for read operations.
    pub fn read_pool(&self) -> &sqlx::PgPool {
        self.read.as_ref().unwrap_or(&self.write)
    }

    /// Get the pool to use for write operations.
    pub fn write_pool(&self) -> &sqlx::PgPool {
        &self.write
    }
}

/// Cached repository trait objects, created once at startup.
struct CachedRepos {
    signature_queues: Arc<dyn SignatureQueueRepo>,
    archive: Arc<dyn ArchiveRepo>,
    queue_status: Arc<dyn QueueStatusRepo>,
}

enum PoolStorage {
    #[cfg(feature = "database-sqlite")]
    Sqlite(sqlx::SqlitePool),
    #[cfg(feature = "database-postgres")]
    Postgres(PgPoolPair),
    #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
    _None(std::convert::Infallible),
}

/// Database pool supporting both SQLite and PostgreSQL.
///
/// One pool backs one store. The live and archive stores each get their own
/// `DbPool`; see [`Stores`].
pub struct DbPool {
    role: StoreRole,
    inner: PoolStorage,
    repos: CachedRepos,
}

impl DbPool {
    /// Create a DbPool from an existing SQLite pool.
    /// Primarily useful for testing.
    #[cfg(feature = "database-sqlite")]
    pub fn from_sqlite(role: StoreRole, pool: sqlx::SqlitePool) -> Self {
        let repos = CachedRepos {
            signature_queues: Arc::new(sqlite::SqliteSignatureQueueRepo::new(pool.clone())),
            archive: Arc::new(sqlite::SqliteArchiveRepo::new(pool.clone())),
            queue_status: Arc::new(sqlite::SqliteQueueStatusRepo::new(pool.clone())),
        };
        DbPool {
            role,
            inner: PoolStorage::Sqlite(pool),
            repos,
        }
    }

    /// Create a DbPool from existing PostgreSQL pools.
    /// Primarily useful for testing.
    #[cfg(feature = "database-postgres")]
    pub fn from_postgres(
        role: StoreRole,
        write_pool: sqlx::PgPool,
        read_pool: Option<sqlx::PgPool>,
    ) -> Self {
        let repos = CachedRepos {
            signature_queues: Arc::new(postgres::PostgresSignatureQueueRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
            archive: Arc::new(postgres::PostgresArchiveRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
            queue_status: Arc::new(postgres::PostgresQueueStatusRepo::new(
                write_pool.clone(),
                read_pool.clone(),
            )),
        };
        DbPool {
            role,
            inner: PoolStorage::Postgres(PgPoolPair {
                write: write_pool,
                read: read_pool,
            }),
            repos,
        }
    }

    /// Create a database pool from configuration
    pub async fn from_config(role: StoreRole, config: &DatabaseConfig) -> DbResult<Self> {
        match config {
            DatabaseConfig::None => Err(DbError::NotConfigured),
            #[cfg(feature = "database-sqlite")]
            DatabaseConfig::Sqlite(cfg) => {
                let pool = sqlx::sqlite::SqlitePoolOptions::new()
                    .max_connections(cfg.max_connections)
                    .connect_with(
                        sqlx::sqlite::SqliteConnectOptions::new()
                            .filename(&cfg.path)
                            .create_if_missing(cfg.create_if_missing)
                            .journal_mode(if cfg.wal_mode {
                                sqlx::sqlite::SqliteJournalMode::Wal
                            } else {
                                sqlx::sqlite::SqliteJournalMode::Delete
                            })
                            .busy_timeout(std::time::Duration::from_millis(cfg.busy_timeout_ms)),
                    )
                    .await?;

                tracing::debug!(store = %role, path = %cfg.path, "Connected to SQLite store");
                Ok(Self::from_sqlite(role, pool))
            }
            #[cfg(feature = "database-postgres")]
            DatabaseConfig::Postgres(cfg) => {
                let connect_options = cfg
                    .url
                    .parse::<sqlx::postgres::PgConnectOptions>()?
                    .ssl_mode(cfg.ssl_mode.to_sqlx());

                let write_pool = sqlx::postgres::PgPoolOptions::new()
                    .min_connections(cfg.min_connections)
                    .max_connections(cfg.max_connections)
                    .acquire_timeout(std::time::Duration::from_secs(cfg.connect_timeout_secs))
                    .idle_timeout(std::time::Duration::from_secs(cfg.idle_timeout_secs))
                    .connect_with(connect_options)
                    .await?;

                let read_pool = if let Some(read_url) = &cfg.read_url {
                    tracing::info!(store = %role, "Configuring read replica pool");
                    Some(
                        sqlx::postgres::PgPoolOptions::new()
                            .min_connections(cfg.min_connections)
                            .max_connections(cfg.max_connections)
                            .connect(read_url)
                            .await?,
                    )
                } else {
                    None
                };

                tracing::debug!(store = %role, "Connected to PostgreSQL store");
                Ok(Self::from_postgres(role, write_pool, read_pool))
            }
        }
    }

    /// Run the migrations for this pool's role using sqlx's migration runner.
    /// Migrations always run on the primary (write) pool.
    pub async fn run_migrations(&self) -> DbResult<()> {
        match &self.inner {
            #[cfg(feature = "database-sqlite")]
            PoolStorage::Sqlite(pool) => {
                tracing::info!(store = %self.role, "Running SQLite migrations");
                match self.role {
                    StoreRole::Live => sqlx::migrate!("./migrations_sqlx/sqlite/live")
                        .run(pool)
                        .await?,
                    StoreRole::Archive => sqlx::migrate!("./migrations_sqlx/sqlite/archive")
                        .run(pool)
                        .await?,
                }
                tracing::info!(store = %self.role, "SQLite migrations completed successfully");
                Ok(())
            }
            #[cfg(feature = "database-postgres")]
            PoolStorage::Postgres(pools) => {
                tracing::info!(store = %self.role, "Running PostgreSQL migrations");
                match self.role {
                    StoreRole::Live => sqlx::migrate!("./migrations_sqlx/postgres/live")
                        .run(pools.write_pool())
                        .await?,
                    StoreRole::Archive => sqlx::migrate!("./migrations_sqlx/postgres/archive")
                        .run(pools.write_pool())
                        .await?,
                }
                tracing::info!(store = %self.role, "PostgreSQL migrations completed successfully");
                Ok(())
            }
            #[cfg(not(any(feature = "database-sqlite", feature = "database-postgres")))]
            PoolStorage::_None(infallible) => match *infallible {},
        }
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    /// Get the live signature/validation queue repository
    pub fn signature_queues(&self) -> Arc<dyn SignatureQueueRepo> {
        Arc::clone(&self.repos.signature_queues)
    }

    /// Get the archive table repository
    pub fn archive(&self) -> Arc<dyn ArchiveRepo> {
        Arc::clone(&self.repos.archive)
    }

    /// Get the queue drain status repository
    pub fn queue_status(&self) -> Arc<dyn QueueStatusRepo> {
        Arc::clone(&self.repos.queue_status)
    }
}
