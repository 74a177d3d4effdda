use tracing::Span;

/// Identifies the scheduler invocation that triggered a run.
///
/// Attached to every log line through [`JobContext::span`] and to every metric
/// as labels, so a failure can be traced back to the job, host and worker
/// that hit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    pub job_id: String,
    pub server_id: String,
    pub worker_id: String,
}

impl JobContext {
    pub fn new(
        job_id: impl Into<String>,
        server_id: impl Into<String>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            server_id: server_id.into(),
            worker_id: worker_id.into(),
        }
    }

    pub fn span(&self) -> Span {
        tracing::info_span!(
            "archive_job",
            job = %self.job_id,
            server = %self.server_id,
            worker = %self.worker_id,
        )
    }
}

/// Outcome of a whole invocation as reported to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    Error,
}

impl JobStatus {
    /// Process-style status code: 0 for success, 1 for a fatal error.
    pub fn code(&self) -> i32 {
        match self {
            JobStatus::Ok => 0,
            JobStatus::Error => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Ok => "ok",
            JobStatus::Error => "error",
        }
    }
}
