// Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::request::{ExtractionRequest, FetchMode};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job Status
///
/// Transitions are monotonic: Queued -> Running -> {Done, Error}.
/// Done and Error are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Done => write!(f, "done"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Label shown while the worker prepares a run
pub const STEP_INITIALIZING: &str = "Initializing";

/// Label shown once a job has finished successfully
pub const STEP_COMPLETED: &str = "Completed";

/// Label shown once a job has failed
pub const STEP_FAILED: &str = "Failed";

/// Job Entity
///
/// `params` is set once at creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    /// 0-100
    pub progress: u8,
    pub current_step: String,

    pub created_at: i64, // epoch ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<i64>,

    /// Present only when status == Error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub params: ExtractionRequest,

    /// Handler table the run is dispatched through
    #[serde(default)]
    pub mode: FetchMode,
}

impl Job {
    /// Create a new queued job
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `params` - The extraction request this job wraps
    pub fn new(id: impl Into<String>, created_at: i64, params: ExtractionRequest) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: 0,
            current_step: "Queued".to_string(),
            created_at,
            started_at: None,
            finished_at: None,
            error_message: None,
            params,
            mode: FetchMode::One,
        }
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Transition to Running with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Queued {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Running.to_string(),
            });
        }
        self.status = JobStatus::Running;
        self.started_at = Some(now_millis);
        self.current_step = STEP_INITIALIZING.to_string();
        Ok(())
    }

    /// Record a progress checkpoint while running.
    ///
    /// Progress never moves backwards; a lower percent only updates the step label.
    pub fn record_progress(&mut self, percent: u8, step: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.not_running());
        }
        self.progress = self.progress.max(percent.min(100));
        self.current_step = step.into();
        Ok(())
    }

    /// Update the step label without touching progress
    pub fn record_step(&mut self, step: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(self.not_running());
        }
        self.current_step = step.into();
        Ok(())
    }

    /// Transition to Done with explicit timestamp
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Done.to_string(),
            });
        }
        self.status = JobStatus::Done;
        self.progress = 100;
        self.current_step = STEP_COMPLETED.to_string();
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Error with explicit timestamp.
    ///
    /// Allowed from Queued as well: a job can fail before its run starts
    /// (e.g. the worker is gone).
    pub fn fail(&mut self, now_millis: i64, message: impl Into<String>) -> Result<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Error.to_string(),
            });
        }
        self.status = JobStatus::Error;
        self.current_step = STEP_FAILED.to_string();
        self.error_message = Some(message.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    fn not_running(&self) -> DomainError {
        if self.status.is_terminal() {
            DomainError::TerminalJob {
                id: self.id.clone(),
                status: self.status.to_string(),
            }
        } else {
            DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "progress".to_string(),
            }
        }
    }
}
