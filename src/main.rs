use std::{collections::HashMap, path::PathBuf, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use signature_archive::{
    archive::{self, JobContext, JobStatus},
    config::ArchiverConfig,
    db::{DbPool, StoreRole, Stores},
    observability,
};

const DEFAULT_CONFIG_FILE: &str = "signature-archive.toml";

#[derive(Parser, Debug)]
#[command(version, about = "Signature queue archiver", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./signature-archive.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Archive and prune one batch per stage, then exit (default)
    ///
    /// The process exit code is the job status: 0 on success, 1 on a fatal
    /// store error.
    Run {
        #[command(flatten)]
        job: JobArgs,
        /// Write Prometheus metrics to this file on exit (node_exporter textfile format)
        #[arg(long)]
        metrics_textfile: Option<PathBuf>,
    },
    /// Run the archive job on a fixed interval until stopped
    Worker {
        #[command(flatten)]
        job: JobArgs,
    },
    /// Run live and archive database migrations and exit
    Migrate,
    /// Print the last-fully-emptied watermark of the upstream queues
    Watermark,
}

#[derive(clap::Args, Debug)]
struct JobArgs {
    /// Scheduler job identifier, attached to logs and metrics
    #[arg(long, default_value = "signature-archive")]
    job_id: String,
    /// Host identifier (defaults to $HOSTNAME)
    #[arg(long)]
    server_id: Option<String>,
    /// Worker slot identifier
    #[arg(long, default_value = "0")]
    worker_id: String,
}

impl Default for JobArgs {
    fn default() -> Self {
        Self {
            job_id: "signature-archive".to_string(),
            server_id: None,
            worker_id: "0".to_string(),
        }
    }
}

impl JobArgs {
    fn into_context(self) -> JobContext {
        let server_id = self
            .server_id
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "localhost".to_string());
        JobContext::new(self.job_id, server_id, self.worker_id)
    }
}

/// Resolve the config path. An explicit path must exist; the default file is
/// optional.
fn resolve_config_path(explicit_path: Option<&str>) -> Result<Option<PathBuf>, String> {
    if let Some(path) = explicit_path {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }

    let cwd_config = PathBuf::from(DEFAULT_CONFIG_FILE);
    Ok(cwd_config.exists().then_some(cwd_config))
}

fn load_config(explicit_path: Option<&str>) -> ArchiverConfig {
    let config_path = match resolve_config_path(explicit_path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let result = match &config_path {
        Some(path) => ArchiverConfig::from_file(path),
        None => ArchiverConfig::from_str(""),
    };

    let config = match result {
        Ok(c) => c,
        Err(e) => {
            let source = config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            eprintln!("Failed to load config from {}: {}", source, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if let Some(path) = &config_path {
        tracing::debug!(config_file = %path.display(), "Loaded configuration");
    }

    config
}

/// Connect to both stores, running migrations where configured.
async fn connect_stores(config: &ArchiverConfig) -> Stores {
    if let Err(e) = config.require_stores() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let live = connect(StoreRole::Live, config, false).await;
    let archive = connect(StoreRole::Archive, config, false).await;
    Stores::new(live, archive)
}

async fn connect(role: StoreRole, config: &ArchiverConfig, force_migrations: bool) -> Arc<DbPool> {
    let db_config = match role {
        StoreRole::Live => &config.database,
        StoreRole::Archive => &config.archive_database,
    };

    let pool = match DbPool::from_config(role, db_config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(severity = "alert", store = %role, error = %e, "Failed to connect to store");
            eprintln!("Error: Failed to connect to {} store: {}", role, e);
            std::process::exit(1);
        }
    };

    if (force_migrations || db_config.run_migrations())
        && let Err(e) = pool.run_migrations().await
    {
        tracing::error!(store = %role, error = %e, "Database migrations failed");
        eprintln!("Error: {} store migrations failed: {}", role, e);
        std::process::exit(1);
    }

    Arc::new(pool)
}

fn init_metrics(config: &ArchiverConfig) {
    if let Err(e) = observability::metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    match args.command.unwrap_or(Command::Run {
        job: JobArgs::default(),
        metrics_textfile: None,
    }) {
        Command::Run {
            job,
            metrics_textfile,
        } => run_once(config, job.into_context(), metrics_textfile).await,
        Command::Worker { job } => run_worker(config, job.into_context()).await,
        Command::Migrate => run_migrate(config).await,
        Command::Watermark => run_watermark(config).await,
    }
}

async fn run_once(config: ArchiverConfig, job: JobContext, metrics_textfile: Option<PathBuf>) {
    init_metrics(&config);
    let stores = connect_stores(&config).await;

    let code = archive::run_archive_job(&stores, &config.archive, &job, &HashMap::new()).await;

    let textfile = metrics_textfile.or_else(|| {
        config
            .observability
            .metrics
            .textfile_path
            .as_ref()
            .map(PathBuf::from)
    });
    if let Some(path) = textfile
        && let Err(e) = observability::metrics::write_textfile(&path)
    {
        tracing::warn!(path = %path.display(), error = %e, "Failed to write metrics textfile");
    }

    std::process::exit(code);
}

async fn run_worker(config: ArchiverConfig, job: JobContext) {
    if let Err(e) = config.archive.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    init_metrics(&config);
    let stores = Arc::new(connect_stores(&config).await);

    tokio::select! {
        _ = archive::start_archive_worker(stores, config.archive.clone(), job) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping archive worker");
        }
    }
}

async fn run_migrate(config: ArchiverConfig) {
    if let Err(e) = config.require_stores() {
        eprintln!("Error: {}. Nothing to migrate.", e);
        std::process::exit(1);
    }

    tracing::info!("Running database migrations");
    connect(StoreRole::Live, &config, true).await;
    connect(StoreRole::Archive, &config, true).await;
    tracing::info!("Database migrations completed successfully");
}

async fn run_watermark(config: ArchiverConfig) {
    if config.database.is_none() {
        eprintln!("Error: [database] (live store) is not configured");
        std::process::exit(1);
    }

    let live = connect(StoreRole::Live, &config, false).await;
    match archive::query_last_fully_emptied(live.queue_status().as_ref(), &config.archive, Utc::now())
        .await
    {
        Ok(mark) => println!("{}", mark.to_rfc3339()),
        Err(e) => {
            tracing::error!(severity = "alert", error = %e, "Failed to read queue status");
            eprintln!("Error: {}", e);
            std::process::exit(JobStatus::Error.code());
        }
    }
}
