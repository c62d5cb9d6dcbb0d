use std::sync::Arc;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::request::GenerationRequest;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Polling,
    Done,
    Failed,
}

impl JobStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Submitted | Self::Polling)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::Submitted => "📤",
            Self::Polling => "⚡",
            Self::Done => "✅",
            Self::Failed => "❌",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Submitted => "Submitted",
            Self::Polling => "Generating",
            Self::Done => "Done",
            Self::Failed => "Failed",
        }
    }
}

/// A single generation job as observed by the UI.
///
/// Only the polling loop moves a job forward; once `Done` or `Failed` the
/// job is frozen and every further update is ignored.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub id: JobId,
    pub request: Arc<GenerationRequest>,
    pub status: JobStatus,
    pub result_uri: Option<String>,
    pub error_message: Option<String>,
    pub polls: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(request: Arc<GenerationRequest>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            request,
            status: JobStatus::Submitted,
            result_uri: None,
            error_message: None,
            polls: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_poll(&mut self, polls: u32) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Polling;
        self.polls = polls;
        self.touch();
    }

    pub fn complete(&mut self, uri: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Done;
        self.result_uri = Some(uri.into());
        self.touch();
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.error_message = Some(message.into());
        self.touch();
    }

    /// Seconds between creation and the last update
    pub fn elapsed_secs(&self) -> i64 {
        (self.updated_at - self.created_at).num_seconds()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
