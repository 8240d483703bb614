use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, info};

use crate::error::Result;

/// Scratch directory for one pipeline run. Everything in it is removed on drop,
/// on the error path as well.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("subrelay-").tempdir()?;
        debug!("Staging area created at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a named artifact inside the staging area
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Copy a staged artifact to its final, caller-visible location
    pub async fn persist(&self, name: &str, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(self.path(name), destination).await?;
        info!("Wrote {}", destination.display());
        Ok(())
    }

    /// Copy every staged file into `target_dir`, returning the new paths
    pub async fn export_to(&self, target_dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(target_dir).await?;

        let mut exported = Vec::new();
        let mut entries = fs::read_dir(self.root()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                let destination = target_dir.join(entry.file_name());
                fs::copy(entry.path(), &destination).await?;
                exported.push(destination);
            }
        }
        exported.sort();

        info!("Kept {} intermediate files in {}", exported.len(), target_dir.display());
        Ok(exported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropping_removes_artifacts() {
        let staging = StagingArea::new().unwrap();
        let root = staging.root().to_path_buf();
        fs::write(staging.path("audio.wav"), b"RIFF").await.unwrap();
        assert!(root.join("audio.wav").exists());

        drop(staging);
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn test_persist_and_export() {
        let staging = StagingArea::new().unwrap();
        fs::write(staging.path("a.srt"), "1\n").await.unwrap();
        fs::write(staging.path("b.wav"), "x").await.unwrap();

        let out = assert_fs::TempDir::new().unwrap();
        let final_path = out.path().join("nested").join("final.srt");
        staging.persist("a.srt", &final_path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&final_path).unwrap(), "1\n");

        let exported = staging.export_to(&out.path().join("keep")).await.unwrap();
        let names: Vec<_> = exported
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.srt", "b.wav"]);
    }
}
