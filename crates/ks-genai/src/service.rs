use async_trait::async_trait;
use ks_core::request::SourceImage;
use ks_core::{AspectRatio, Resolution};
use crate::error::GenError;

/// Server-assigned name of a long-running generation operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub uri: String,
}

/// Snapshot of an operation as last reported by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: String,
    pub done: bool,
    pub error: Option<OperationError>,
    pub artifacts: Vec<ArtifactRef>,
}

impl Operation {
    pub fn handle(&self) -> OperationHandle {
        OperationHandle(self.name.clone())
    }
}

/// Everything the service needs to start one video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateVideosPayload {
    pub model: String,
    pub prompt: String,
    pub image: Option<SourceImage>,
    pub number_of_videos: u32,
    pub resolution: Resolution,
    pub aspect_ratio: AspectRatio,
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Starts a generation; the only call that creates anything remotely.
    async fn generate_videos(&self, payload: &GenerateVideosPayload) -> Result<Operation, GenError>;

    async fn get_operation(&self, handle: &OperationHandle) -> Result<Operation, GenError>;

    /// Authenticated fetch of a finished artifact.
    async fn download(&self, uri: &str) -> Result<Vec<u8>, GenError>;
}
