use async_trait::async_trait;
use ks_genai::{CredentialHost, StaticCredentials};
use log::{info, warn};

/// Desktop key store: seeded from `GEMINI_API_KEY`, and "select a key"
/// means picking a file that contains one.
pub struct DesktopCredentials {
    key: StaticCredentials,
}

impl DesktopCredentials {
    pub fn new(initial: Option<String>) -> Self {
        Self {
            key: StaticCredentials::new(initial),
        }
    }
}

#[async_trait]
impl CredentialHost for DesktopCredentials {
    async fn has_selected_api_key(&self) -> bool {
        self.key.has_selected_api_key().await
    }

    async fn open_select_key(&self) {
        // Modal dialogs must run on the event loop thread, which is where
        // the app drives this future.
        let Some(path) = rfd::FileDialog::new()
            .set_title("Select API key file")
            .add_filter("Key file", &["txt", "key"])
            .pick_file()
        else {
            return;
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(text) if !text.trim().is_empty() => {
                self.key.set(Some(text.trim().to_string()));
                info!("API key loaded from {}", path.display());
            }
            Ok(_) => warn!("{} does not contain an API key", path.display()),
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    fn api_key(&self) -> Option<String> {
        self.key.api_key()
    }

    fn invalidate(&self) {
        self.key.invalidate();
    }
}
