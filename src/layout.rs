use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, ScrapeError};

/// Suffix of the human-readable name files written next to each artifact.
pub const SIDECAR_SUFFIX: &str = ".name.txt";

/// The four working directories under the base download directory. The
/// scratch directory receives at most one in-flight browser download;
/// the other three are the durable classification buckets.
#[derive(Debug)]
pub struct DownloadDirs {
    scratch: PathBuf,
    server: PathBuf,
    shared: PathBuf,
    client: PathBuf,
}

impl DownloadDirs {
    /// Wipes and recreates all four directories under `base`.
    pub async fn prepare(base: &Path) -> Result<Self> {
        let dirs = Self {
            scratch: base.join("temp"),
            server: base.join("server"),
            shared: base.join("both"),
            client: base.join("client"),
        };
        for dir in [&dirs.scratch, &dirs.server, &dirs.shared, &dirs.client] {
            debug!("Recreating {}", dir.display());
            match tokio::fs::remove_dir_all(dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(dirs)
    }

    pub fn scratch(&self) -> &Path {
        &self.scratch
    }

    pub fn server(&self) -> &Path {
        &self.server
    }

    pub fn shared(&self) -> &Path {
        &self.shared
    }

    pub fn client(&self) -> &Path {
        &self.client
    }

    /// Returns the file name of the single file currently sitting in the
    /// scratch directory. Anything other than exactly one file means the
    /// single-download invariant was broken.
    pub async fn scratch_file_name(&self) -> Result<String> {
        let mut entries = tokio::fs::read_dir(&self.scratch).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name());
        }
        match names.as_slice() {
            [name] => Ok(name.to_string_lossy().into_owned()),
            _ => Err(ScrapeError::ScratchState {
                dir: self.scratch.clone(),
                found: names.len(),
            }),
        }
    }

    /// Removes the (empty) scratch directory once the last download has
    /// been handed off.
    pub async fn remove_scratch(&self) -> Result<()> {
        debug!("Removing {}", self.scratch.display());
        tokio::fs::remove_dir(&self.scratch).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepare_creates_all_four_directories() {
        let base = tempfile::tempdir().unwrap();
        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        for dir in [dirs.scratch(), dirs.server(), dirs.shared(), dirs.client()] {
            assert!(dir.is_dir(), "{} missing", dir.display());
        }
    }

    #[tokio::test]
    async fn prepare_wipes_leftovers_from_a_previous_run() {
        let base = tempfile::tempdir().unwrap();
        let stale = base.path().join("server").join("old.jar");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, b"stale").unwrap();

        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        assert!(!stale.exists());
        assert!(dirs.server().is_dir());
    }

    #[tokio::test]
    async fn scratch_file_name_returns_the_single_download() {
        let base = tempfile::tempdir().unwrap();
        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        std::fs::write(dirs.scratch().join("sodium-0.5.8.jar"), b"jar").unwrap();
        assert_eq!(
            dirs.scratch_file_name().await.unwrap(),
            "sodium-0.5.8.jar"
        );
    }

    #[tokio::test]
    async fn scratch_file_name_rejects_an_empty_scratch() {
        let base = tempfile::tempdir().unwrap();
        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        assert!(matches!(
            dirs.scratch_file_name().await,
            Err(ScrapeError::ScratchState { found: 0, .. })
        ));
    }

    #[tokio::test]
    async fn scratch_file_name_rejects_two_files() {
        let base = tempfile::tempdir().unwrap();
        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        std::fs::write(dirs.scratch().join("a.jar"), b"a").unwrap();
        std::fs::write(dirs.scratch().join("b.jar"), b"b").unwrap();
        assert!(matches!(
            dirs.scratch_file_name().await,
            Err(ScrapeError::ScratchState { found: 2, .. })
        ));
    }

    #[tokio::test]
    async fn remove_scratch_leaves_the_buckets_alone() {
        let base = tempfile::tempdir().unwrap();
        let dirs = DownloadDirs::prepare(base.path()).await.unwrap();
        dirs.remove_scratch().await.unwrap();
        assert!(!dirs.scratch().exists());
        assert!(dirs.server().is_dir());
        assert!(dirs.shared().is_dir());
        assert!(dirs.client().is_dir());
    }
}
