use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::error::GenError;

/// Downloaded video held in a local file for playback.
///
/// The file belongs to this handle: [`LocalArtifact::revoke`] or dropping
/// the handle deletes it.
#[derive(Debug)]
pub struct LocalArtifact {
    path: PathBuf,
    source_uri: String,
    len: usize,
}

impl LocalArtifact {
    pub async fn write(dir: &Path, source_uri: impl Into<String>, bytes: &[u8]) -> Result<Self, GenError> {
        tokio::fs::create_dir_all(dir).await?;

        // The handle owns the path before the first byte lands, so a failed
        // write drops it and removes whatever was written.
        let artifact = Self::reserve(dir, source_uri, bytes.len());
        tokio::fs::write(&artifact.path, bytes).await?;
        debug!(path = %artifact.path.display(), len = bytes.len(), "stored artifact");

        Ok(artifact)
    }

    fn reserve(dir: &Path, source_uri: impl Into<String>, len: usize) -> Self {
        Self {
            path: dir.join(format!("kinoscope-{}.mp4", Uuid::new_v4())),
            source_uri: source_uri.into(),
            len,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source_uri(&self) -> &str {
        &self.source_uri
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies the video somewhere the user chose; the handle keeps its file.
    pub async fn save_as(&self, dest: &Path) -> std::io::Result<u64> {
        tokio::fs::copy(&self.path, dest).await
    }

    pub fn revoke(self) {}
}

impl Drop for LocalArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "revoked artifact"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to revoke artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn revoke_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LocalArtifact::write(dir.path(), "https://example.test/v.mp4", b"mp4").await.unwrap();
        let path = artifact.path().to_path_buf();

        assert_eq!(std::fs::read(&path).unwrap(), b"mp4");
        assert_eq!(artifact.source_uri(), "https://example.test/v.mp4");

        artifact.revoke();
        assert!(!path.exists());
    }

    #[test]
    fn unfinished_write_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LocalArtifact::reserve(dir.path(), "x", 1024);
        let path = artifact.path().to_path_buf();

        // Half of the payload made it to disk before the write failed.
        std::fs::write(&path, [0u8; 512]).unwrap();
        drop(artifact);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn write_into_unusable_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let err = LocalArtifact::write(&blocker, "x", b"mp4").await.unwrap_err();
        assert!(matches!(err, GenError::Io(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn save_as_copies_without_releasing() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = LocalArtifact::write(dir.path(), "x", b"frames").await.unwrap();
        let dest = dir.path().join("saved.mp4");

        assert_eq!(artifact.save_as(&dest).await.unwrap(), 6);
        assert!(artifact.path().exists());
        assert_eq!(std::fs::read(dest).unwrap(), b"frames");
    }
}
