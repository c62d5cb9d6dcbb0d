//! Submit → poll → download for a single generation job.
//!
//! [`Workflow::run`] suspends at every network call and between polls, and
//! every suspension point races the job's [`CancellationToken`].

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use ks_core::VideoModel;
use ks_core::request::GenerationRequest;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::artifact::LocalArtifact;
use crate::error::GenError;
use crate::service::{GenerateVideosPayload, GenerationService, Operation};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Milestones reported while a job runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Submitted { operation: String },
    Polled { polls: u32 },
    Downloading { uri: String },
}

pub struct Workflow {
    service: Arc<dyn GenerationService>,
    model: VideoModel,
    poll_interval: Duration,
    artifact_dir: PathBuf,
}

impl Workflow {
    pub fn new(service: Arc<dyn GenerationService>, model: VideoModel, artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            service,
            model,
            poll_interval: DEFAULT_POLL_INTERVAL,
            artifact_dir: artifact_dir.into(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn model(&self) -> VideoModel {
        self.model
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Runs one job to completion, failure or cancellation.
    pub async fn run<F>(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        on_progress: F,
    ) -> Result<LocalArtifact, GenError>
    where
        F: Fn(Progress) + Send + Sync,
    {
        let result = self.execute(request, cancel, &on_progress).await.map_err(GenError::classify);
        if let Err(e) = &result {
            if e.is_user_visible() {
                warn!(error = %e, "generation job failed");
            }
        }
        result
    }

    async fn execute<F>(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
        on_progress: &F,
    ) -> Result<LocalArtifact, GenError>
    where
        F: Fn(Progress) + Send + Sync,
    {
        let image = request.source_image.clone().ok_or_else(GenError::missing_image)?;

        let payload = GenerateVideosPayload {
            model: self.model.id().to_string(),
            prompt: request.prompt.clone(),
            image: Some(image),
            number_of_videos: 1,
            resolution: request.resolution,
            aspect_ratio: request.aspect_ratio,
        };

        let mut operation = cancellable(cancel, self.service.generate_videos(&payload)).await?;
        let handle = operation.handle();
        info!(operation = %handle, model = self.model.id(), "submitted generation");
        on_progress(Progress::Submitted { operation: handle.0.clone() });

        let mut polls = 0u32;
        while !operation.done {
            cancellable(cancel, async {
                tokio::time::sleep(self.poll_interval).await;
                Ok(())
            })
            .await?;

            operation = cancellable(cancel, self.service.get_operation(&handle)).await?;
            polls += 1;
            debug!(operation = %handle, polls, done = operation.done, "polled operation");
            on_progress(Progress::Polled { polls });
        }

        let uri = artifact_uri(operation)?;
        on_progress(Progress::Downloading { uri: uri.clone() });

        let bytes = cancellable(cancel, self.service.download(&uri)).await?;
        let artifact = LocalArtifact::write(&self.artifact_dir, uri, &bytes).await?;
        info!(polls, len = artifact.len(), "generation complete");

        Ok(artifact)
    }
}

fn artifact_uri(operation: Operation) -> Result<String, GenError> {
    if let Some(error) = operation.error {
        return Err(GenError::Generation(error.message));
    }

    operation
        .artifacts
        .into_iter()
        .next()
        .map(|a| a.uri)
        .ok_or_else(GenError::no_artifact)
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, GenError>>,
) -> Result<T, GenError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GenError::Cancelled),
        result = fut => result,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    use ks_core::request::SourceImage;
    use tokio::time::Instant;
    use super::*;
    use crate::service::{ArtifactRef, OperationError, OperationHandle};

    /// Scripted service: `generate_videos` returns `submitted`, each poll pops
    /// the next snapshot, downloads return `video` or fail with `download_status`.
    pub(crate) struct FakeService {
        pub submitted: Result<Operation, String>,
        pub polls: Mutex<VecDeque<Operation>>,
        pub video: Vec<u8>,
        pub download_status: Option<u16>,
        pub submit_calls: AtomicUsize,
        pub poll_calls: AtomicUsize,
        pub downloaded: Mutex<Vec<String>>,
    }

    impl FakeService {
        pub fn new(submitted: Operation, polls: Vec<Operation>) -> Self {
            Self {
                submitted: Ok(submitted),
                polls: Mutex::new(polls.into()),
                video: b"\x00\x00\x00\x18ftypmp42".to_vec(),
                download_status: None,
                submit_calls: AtomicUsize::new(0),
                poll_calls: AtomicUsize::new(0),
                downloaded: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.submit_calls.load(Ordering::SeqCst) + self.poll_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationService for FakeService {
        async fn generate_videos(&self, _payload: &GenerateVideosPayload) -> Result<Operation, GenError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            self.submitted.clone().map_err(|message| GenError::Service { status: Some(404), message })
        }

        async fn get_operation(&self, handle: &OperationHandle) -> Result<Operation, GenError> {
            self.poll_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(handle.0, "operations/op-1");
            Ok(self.polls.lock().unwrap().pop_front().unwrap_or_else(|| pending()))
        }

        async fn download(&self, uri: &str) -> Result<Vec<u8>, GenError> {
            self.downloaded.lock().unwrap().push(uri.to_string());
            match self.download_status {
                Some(status) => Err(GenError::Download { status, body: "forbidden".into() }),
                None => Ok(self.video.clone()),
            }
        }
    }

    pub(crate) fn pending() -> Operation {
        Operation {
            name: "operations/op-1".into(),
            done: false,
            error: None,
            artifacts: vec![],
        }
    }

    pub(crate) fn finished(uri: &str) -> Operation {
        Operation {
            done: true,
            artifacts: vec![ArtifactRef { uri: uri.into() }],
            ..pending()
        }
    }

    pub(crate) fn failed(message: &str) -> Operation {
        Operation {
            done: true,
            error: Some(OperationError { code: Some(5), message: message.into() }),
            ..pending()
        }
    }

    pub(crate) fn request() -> GenerationRequest {
        GenerationRequest::new("a kite over the dunes").with_image(SourceImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime_type: "image/png".into(),
        })
    }

    fn workflow(service: Arc<FakeService>, dir: &std::path::Path) -> Workflow {
        Workflow::new(service, VideoModel::default(), dir)
    }

    #[tokio::test(start_paused = true)]
    async fn missing_image_fails_without_network_calls() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(pending(), vec![]));
        let wf = workflow(service.clone(), dir.path());

        let err = wf
            .run(&GenerationRequest::new("no image"), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, GenError::Validation(_)));
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn polls_until_done_then_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(pending(), vec![pending(), pending(), finished("X")]));
        let wf = workflow(service.clone(), dir.path());
        let progress = Mutex::new(Vec::new());

        let start = Instant::now();
        let artifact = wf
            .run(&request(), &CancellationToken::new(), |p| progress.lock().unwrap().push(p))
            .await
            .unwrap();

        assert_eq!(service.poll_calls.load(Ordering::SeqCst), 3);
        assert_eq!(service.submit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), DEFAULT_POLL_INTERVAL * 3);
        assert_eq!(*service.downloaded.lock().unwrap(), vec!["X".to_string()]);
        assert_eq!(artifact.source_uri(), "X");
        assert_eq!(std::fs::read(artifact.path()).unwrap(), service.video);

        let progress = progress.into_inner().unwrap();
        assert_eq!(progress.first(), Some(&Progress::Submitted { operation: "operations/op-1".into() }));
        assert_eq!(progress.last(), Some(&Progress::Downloading { uri: "X".into() }));
    }

    #[tokio::test(start_paused = true)]
    async fn already_done_operation_is_not_polled() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(finished("Y"), vec![]));
        let wf = workflow(service.clone(), dir.path());

        let artifact = wf.run(&request(), &CancellationToken::new(), |_| {}).await.unwrap();

        assert_eq!(service.poll_calls.load(Ordering::SeqCst), 0);
        assert_eq!(artifact.source_uri(), "Y");
    }

    #[tokio::test(start_paused = true)]
    async fn service_error_becomes_generation_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(pending(), vec![failed("prompt was blocked")]));
        let wf = workflow(service.clone(), dir.path());

        let err = wf.run(&request(), &CancellationToken::new(), |_| {}).await.unwrap_err();

        assert!(matches!(err, GenError::Generation(ref m) if m == "prompt was blocked"));
        assert!(service.downloaded.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn done_without_artifact_fails() {
        let dir = tempfile::tempdir().unwrap();
        let done = Operation { done: true, ..pending() };
        let service = Arc::new(FakeService::new(pending(), vec![done]));
        let wf = workflow(service, dir.path());

        let err = wf.run(&request(), &CancellationToken::new(), |_| {}).await.unwrap_err();
        assert!(matches!(err, GenError::Generation(ref m) if m == "no artifact returned"));
    }

    #[tokio::test(start_paused = true)]
    async fn download_failure_carries_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = FakeService::new(pending(), vec![finished("X")]);
        service.download_status = Some(403);
        let wf = workflow(Arc::new(service), dir.path());

        let err = wf.run(&request(), &CancellationToken::new(), |_| {}).await.unwrap_err();
        assert!(matches!(err, GenError::Download { status: 403, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_credential_is_classified() {
        let dir = tempfile::tempdir().unwrap();

        let service = Arc::new(FakeService::new(pending(), vec![failed("Requested entity was not found.")]));
        let err = workflow(service, dir.path())
            .run(&request(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(err.is_credential_invalid());

        let mut service = FakeService::new(pending(), vec![]);
        service.submitted = Err("Requested entity was not found.".into());
        let err = workflow(Arc::new(service), dir.path())
            .run(&request(), &CancellationToken::new(), |_| {})
            .await
            .unwrap_err();
        assert!(err.is_credential_invalid());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_polling() {
        let dir = tempfile::tempdir().unwrap();
        let service = Arc::new(FakeService::new(pending(), vec![]));
        let wf = Arc::new(workflow(service.clone(), dir.path()));
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let wf = wf.clone();
            let cancel = cancel.clone();
            async move { wf.run(&request(), &cancel, |_| {}).await }
        });

        tokio::time::sleep(Duration::from_secs(7)).await;
        cancel.cancel();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, GenError::Cancelled));

        let polled = service.poll_calls.load(Ordering::SeqCst);
        assert_eq!(polled, 1);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.poll_calls.load(Ordering::SeqCst), polled);
    }
}
