//! File access to a builder's directory on the worker.

use async_trait::async_trait;
use ironbot_core::Result;
use ironbot_core::ports::ManifestSource;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads files that earlier steps left in the build directory.
#[derive(Debug, Clone)]
pub struct WorkerFiles {
    builddir: PathBuf,
}

impl WorkerFiles {
    pub fn new(builddir: impl Into<PathBuf>) -> Self {
        Self {
            builddir: builddir.into(),
        }
    }

    pub fn builddir(&self) -> &Path {
        &self.builddir
    }
}

#[async_trait]
impl ManifestSource for WorkerFiles {
    async fn fetch(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        let path = self.builddir.join(path);
        match tokio::fs::read(&path).await {
            Ok(content) => {
                debug!(path = %path.display(), bytes = content.len(), "Read worker file");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("channels.json"), b"{}").unwrap();

        let files = WorkerFiles::new(dir.path());
        assert_eq!(files.fetch(Path::new("channels.json")).await.unwrap(), Some(b"{}".to_vec()));
    }

    #[tokio::test]
    async fn test_fetch_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("build")).unwrap();
        std::fs::write(dir.path().join("build/channels.json"), b"{}").unwrap();

        let files = WorkerFiles::new(dir.path());
        assert_eq!(
            files.fetch(Path::new("build/channels.json")).await.unwrap(),
            Some(b"{}".to_vec())
        );
        assert_eq!(files.fetch(Path::new("channels.json")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let files = WorkerFiles::new(dir.path());
        assert_eq!(files.fetch(Path::new("channels.json")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("channels.json")).unwrap();

        let files = WorkerFiles::new(dir.path());
        assert!(files.fetch(Path::new("channels.json")).await.is_err());
    }
}
