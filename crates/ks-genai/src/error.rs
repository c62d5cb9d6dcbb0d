use thiserror::Error;

/// Marker the generation service puts in its message when the API key it
/// was given no longer maps to a project.
pub const CREDENTIAL_REJECTED: &str = "entity was not found";

#[derive(Error, Debug)]
pub enum GenError {
    #[error("{0}")]
    Validation(String),

    #[error("No API key selected. Select a key to continue.")]
    CredentialMissing,

    #[error("The API key was rejected ({0}). Please select a key again.")]
    CredentialInvalid(String),

    #[error("Video generation failed: {0}")]
    Generation(String),

    #[error("Failed to download video (HTTP {status}): {body}")]
    Download { status: u16, body: String },

    #[error("Generation service error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Service { status: Option<u16>, message: String },

    #[error("Failed to store video: {0}")]
    Io(#[from] std::io::Error),

    #[error("Job cancelled")]
    Cancelled,
}

impl GenError {
    pub fn missing_image() -> Self {
        Self::Validation("Please upload an image to use as the first frame.".to_string())
    }

    pub fn no_artifact() -> Self {
        Self::Generation("no artifact returned".to_string())
    }

    /// Service-provided text carried by this error, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Generation(msg) | Self::Service { message: msg, .. } => Some(msg.as_str()),
            Self::Download { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }

    /// Reclassifies errors whose message says the credential was rejected.
    pub fn classify(self) -> Self {
        match self.service_message() {
            Some(msg) if msg.contains(CREDENTIAL_REJECTED) => Self::CredentialInvalid(msg.to_string()),
            _ => self,
        }
    }

    pub fn is_credential_invalid(&self) -> bool {
        matches!(self, Self::CredentialInvalid(_))
    }

    /// Cancellation is how a superseded job ends; nobody needs to see it.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for GenError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}
