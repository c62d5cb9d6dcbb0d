pub mod artifact;
pub mod credential;
pub mod error;
pub mod gemini;
pub mod service;
pub mod session;
pub mod workflow;

pub use artifact::LocalArtifact;
pub use credential::{CredentialHost, StaticCredentials};
pub use error::GenError;
pub use gemini::GeminiClient;
pub use session::{GenerationSession, JobTicket};
pub use workflow::{Progress, Workflow};
