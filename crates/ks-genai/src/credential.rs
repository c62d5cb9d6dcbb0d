use std::sync::RwLock;
use async_trait::async_trait;

/// Host capability that owns the user's API key.
///
/// The generator never reads keys from ambient state; it is handed one of
/// these at construction.
#[async_trait]
pub trait CredentialHost: Send + Sync {
    async fn has_selected_api_key(&self) -> bool;

    /// Asks the user to pick a key. Callers re-check afterwards.
    async fn open_select_key(&self);

    fn api_key(&self) -> Option<String>;

    /// The service rejected the current key; forget it if the host can.
    fn invalidate(&self) {}
}

/// Key held in memory, optionally seeded from configuration.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    key: RwLock<Option<String>>,
}

impl StaticCredentials {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key: RwLock::new(key.filter(|k| !k.trim().is_empty())),
        }
    }

    pub fn set(&self, key: Option<String>) {
        if let Ok(mut slot) = self.key.write() {
            *slot = key.filter(|k| !k.trim().is_empty());
        }
    }
}

#[async_trait]
impl CredentialHost for StaticCredentials {
    async fn has_selected_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    async fn open_select_key(&self) {}

    fn api_key(&self) -> Option<String> {
        self.key.read().ok().and_then(|k| k.clone())
    }

    fn invalidate(&self) {
        self.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blank_keys_count_as_missing() {
        let creds = StaticCredentials::new(Some("   ".into()));
        assert!(!creds.has_selected_api_key().await);

        creds.set(Some("abc".into()));
        assert!(creds.has_selected_api_key().await);
        assert_eq!(creds.api_key().as_deref(), Some("abc"));

        creds.invalidate();
        assert!(!creds.has_selected_api_key().await);
    }
}
