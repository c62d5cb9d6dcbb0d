use std::path::{Path, PathBuf};
use std::sync::Arc;
use ks_core::job::{GenerationJob, JobId};
use ks_core::error::SourceImageError;
use ks_core::request::{GenerationRequest, SourceImage};
use ks_genai::{CredentialHost, GeminiClient, GenError, GenerationSession, Workflow};
use log::{info, warn};
use tokio::runtime::Handle;
use crate::config::AppConfig;
use crate::events::{EventSink, GenEvent, KsEvent};

const PREVIEW_MAX_SIDE: u32 = 480;

/// Downscaled RGBA8 copy of the picked image for the form.
#[derive(Debug, PartialEq, Eq)]
pub struct Preview {
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

/// Image the user picked for the next request
#[derive(Debug, Clone)]
pub struct PickedImage {
    pub name: String,
    pub image: SourceImage,
    pub preview: Option<Arc<Preview>>,
}

impl PickedImage {
    /// Checks the format and decodes a thumbnail. An image the service
    /// accepts but we cannot decode is still usable, just without preview.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, SourceImageError> {
        let name = name.into();
        let source = SourceImage::from_bytes(bytes)?;

        let preview = match image::load_from_memory(&source.bytes) {
            Ok(decoded) => {
                let thumb = decoded.thumbnail(PREVIEW_MAX_SIDE, PREVIEW_MAX_SIDE).to_rgba8();
                Some(Arc::new(Preview {
                    size: [thumb.width() as usize, thumb.height() as usize],
                    rgba: thumb.into_raw(),
                }))
            }
            Err(e) => {
                warn!("No preview for {}: {}", name, e);
                None
            }
        };

        Ok(Self { name, image: source, preview })
    }
}

/// Read-only view of the generator for the UI.
#[derive(Debug, Clone, Default)]
pub struct GenerationView {
    pub credential_available: bool,
    pub busy: bool,
    pub job: Option<GenerationJob>,
    pub image_name: Option<String>,
    pub image_preview: Option<Arc<Preview>>,
    pub artifact_path: Option<PathBuf>,
    pub artifact_len: usize,
    pub error: Option<String>,
}

/// Drives generation jobs on the runtime and folds their events back into
/// the session on the event loop thread.
pub struct Generator {
    session: GenerationSession,
    workflow: Arc<Workflow>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
    image: Option<PickedImage>,
}

impl Generator {
    pub fn new(config: &AppConfig, credentials: Arc<dyn CredentialHost>, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        let client = GeminiClient::new(config.api_base.clone(), credentials.clone());
        let workflow = Workflow::new(Arc::new(client), config.model, config.artifact_dir.clone())
            .with_poll_interval(config.poll_interval);

        Self::with_workflow(GenerationSession::new(credentials), workflow, sink, runtime)
    }

    pub fn with_workflow(session: GenerationSession, workflow: Workflow, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self {
            session,
            workflow: Arc::new(workflow),
            sink,
            runtime,
            image: None,
        }
    }

    pub async fn refresh_credentials(&mut self) -> bool {
        self.session.refresh_credentials().await
    }

    /// Prompts for a key regardless of the current one.
    pub async fn select_key(&mut self) -> bool {
        self.session.clear_error();
        self.session.select_key().await
    }

    pub fn set_image(&mut self, image: Option<PickedImage>) {
        self.image = image;
    }

    pub fn report(&mut self, error: &GenError) {
        self.session.report(error);
    }

    pub fn dismiss_error(&mut self) {
        self.session.clear_error();
    }

    /// Starts a job from the form values and the picked image.
    pub async fn submit(&mut self, mut request: GenerationRequest) -> Result<JobId, GenError> {
        self.session.clear_error();
        if let Err(e) = self.session.ensure_credentials().await {
            self.session.report(&e);
            return Err(e);
        }

        request.source_image = self.image.as_ref().map(|p| p.image.clone());
        let ticket = self.session.begin(request)?;
        let id = ticket.id;
        info!("Submitting generation job {}", id);

        let workflow = self.workflow.clone();
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let progress_sink = sink.clone();
            let result = workflow
                .run(&ticket.request, &ticket.cancel, move |progress| {
                    progress_sink.send(KsEvent::Gen(GenEvent::Progress { id, progress }));
                })
                .await;
            sink.send(KsEvent::Gen(GenEvent::Finished { id, result }));
        });

        Ok(id)
    }

    pub fn on_gen_event(&mut self, event: GenEvent) -> Option<String> {
        match event {
            GenEvent::Progress { id, progress } => {
                self.session.on_progress(id, progress);
                None
            }
            GenEvent::Finished { id, result } => self.session.finish(id, result).map(str::to_string),
        }
    }

    pub async fn save_artifact(&self, dest: &Path) -> anyhow::Result<()> {
        let Some(artifact) = self.session.artifact() else {
            anyhow::bail!("No video to save");
        };
        let written = artifact.save_as(dest).await?;
        info!("Saved {} bytes to {}", written, dest.display());
        Ok(())
    }

    /// Generator view is going away: cancel the job and release the video.
    pub fn teardown(&mut self) {
        if self.session.is_busy() {
            warn!("Cancelling in-flight generation job");
        }
        self.session.teardown();
        self.image = None;
    }

    pub fn view(&self) -> GenerationView {
        let artifact = self.session.artifact();
        GenerationView {
            credential_available: self.session.credential_available(),
            busy: self.session.is_busy(),
            job: self.session.job().cloned(),
            image_name: self.image.as_ref().map(|p| p.name.clone()),
            image_preview: self.image.as_ref().and_then(|p| p.preview.clone()),
            artifact_path: artifact.map(|a| a.path().to_path_buf()),
            artifact_len: artifact.map(|a| a.len()).unwrap_or_default(),
            error: self.session.last_error().map(str::to_string),
        }
    }
}
