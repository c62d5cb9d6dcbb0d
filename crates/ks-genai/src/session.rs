use std::sync::Arc;
use ks_core::job::{GenerationJob, JobId};
use ks_core::request::GenerationRequest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use crate::artifact::LocalArtifact;
use crate::credential::CredentialHost;
use crate::error::GenError;
use crate::workflow::Progress;

/// Everything a background task needs to run one job.
#[derive(Debug, Clone)]
pub struct JobTicket {
    pub id: JobId,
    pub request: Arc<GenerationRequest>,
    pub cancel: CancellationToken,
}

struct ActiveJob {
    job: GenerationJob,
    cancel: CancellationToken,
}

/// Per-view generation state: the credential flag, the one observed job and
/// the artifact it produced.
///
/// A new job cancels the previous one and revokes its artifact; results that
/// arrive for any other job id are dropped.
pub struct GenerationSession {
    credentials: Arc<dyn CredentialHost>,
    credential_available: bool,
    // Set when the service rejects the key; cleared only by a new selection.
    key_rejected: bool,
    current: Option<ActiveJob>,
    artifact: Option<LocalArtifact>,
    last_error: Option<String>,
}

impl GenerationSession {
    pub fn new(credentials: Arc<dyn CredentialHost>) -> Self {
        Self {
            credentials,
            credential_available: false,
            key_rejected: false,
            current: None,
            artifact: None,
            last_error: None,
        }
    }

    pub fn credentials(&self) -> Arc<dyn CredentialHost> {
        self.credentials.clone()
    }

    pub fn credential_available(&self) -> bool {
        self.credential_available
    }

    /// A rejected key stays unavailable even if the host still reports it.
    pub async fn refresh_credentials(&mut self) -> bool {
        self.credential_available = !self.key_rejected && self.credentials.has_selected_api_key().await;
        self.credential_available
    }

    /// Prompts for a key and re-checks.
    pub async fn select_key(&mut self) -> bool {
        self.credentials.open_select_key().await;
        self.key_rejected = false;
        self.refresh_credentials().await
    }

    /// Checks for a usable key, prompting the user once when there is none
    /// or the last one was rejected.
    pub async fn ensure_credentials(&mut self) -> Result<(), GenError> {
        if self.refresh_credentials().await {
            return Ok(());
        }

        if self.select_key().await {
            Ok(())
        } else {
            Err(GenError::CredentialMissing)
        }
    }

    pub fn job(&self) -> Option<&GenerationJob> {
        self.current.as_ref().map(|a| &a.job)
    }

    pub fn artifact(&self) -> Option<&LocalArtifact> {
        self.artifact.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.current.as_ref().is_some_and(|a| a.job.status.is_active())
    }

    /// Starts tracking a fresh job, abandoning whatever ran before.
    pub fn begin(&mut self, request: GenerationRequest) -> Result<JobTicket, GenError> {
        if request.source_image.is_none() {
            self.last_error = Some(GenError::missing_image().to_string());
            return Err(GenError::missing_image());
        }

        self.teardown();

        let job = GenerationJob::new(Arc::new(request));
        let cancel = CancellationToken::new();
        let ticket = JobTicket {
            id: job.id,
            request: job.request.clone(),
            cancel: cancel.clone(),
        };
        info!(job_id = %job.id, "job started");
        self.current = Some(ActiveJob { job, cancel });

        Ok(ticket)
    }

    pub fn on_progress(&mut self, id: JobId, progress: Progress) {
        let Some(active) = self.current.as_mut().filter(|a| a.job.id == id) else {
            return;
        };
        if let Progress::Polled { polls } = progress {
            active.job.record_poll(polls);
        }
    }

    /// Applies a job's outcome. Returns the user-facing error, if any.
    pub fn finish(&mut self, id: JobId, result: Result<LocalArtifact, GenError>) -> Option<&str> {
        let Some(active) = self.current.as_mut().filter(|a| a.job.id == id) else {
            // Superseded job: dropping the result releases its artifact.
            return None;
        };

        match result {
            Ok(artifact) => {
                active.job.complete(artifact.source_uri());
                self.artifact = Some(artifact);
                None
            }
            Err(GenError::Cancelled) => None,
            Err(e) => {
                if e.is_credential_invalid() {
                    warn!(job_id = %id, "credential rejected by generation service");
                    self.credentials.invalidate();
                    self.key_rejected = true;
                    self.credential_available = false;
                }
                let message = e.to_string();
                active.job.fail(message.clone());
                self.last_error = Some(message);
                self.last_error.as_deref()
            }
        }
    }

    /// Records an error raised before any job existed (e.g. missing key).
    pub fn report(&mut self, error: &GenError) {
        if error.is_user_visible() {
            self.last_error = Some(error.to_string());
        }
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Cancels the in-flight job and releases the current artifact.
    pub fn teardown(&mut self) {
        if let Some(active) = self.current.take() {
            active.cancel.cancel();
        }
        if let Some(artifact) = self.artifact.take() {
            artifact.revoke();
        }
        self.last_error = None;
    }
}

impl Drop for GenerationSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
