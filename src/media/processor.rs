use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, SubrelayError};
use super::{MediaCommandBuilder, MediaProcessorTrait};

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    binary_path: String,
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        Self {
            binary_path: config.binary_path.clone(),
            command_builder: MediaCommandBuilder::new(config),
        }
    }
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!("Burning subtitles from {} into {} -> {}",
              subtitle_path.display(), video_path.display(), output_path.display());

        self.command_builder
            .burn_subtitles(video_path, subtitle_path, output_path)
            .execute()
            .await?;

        info!("Subtitle burn-in completed successfully");
        Ok(())
    }

    async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
    ) -> Result<()> {
        info!("Extracting audio from {} to {}", video_path.display(), audio_path.display());

        self.command_builder
            .extract_audio(video_path, audio_path)
            .execute()
            .await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn check_availability(&self) -> Result<()> {
        self.command_builder.version_check().execute().await?;
        info!("Media processor is available");
        Ok(())
    }

    async fn get_version_info(&self) -> Result<String> {
        debug!("Getting media processor version information");

        let output = Command::new(&self.binary_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| SubrelayError::ToolNotFound(format!("{}: {}", self.binary_path, e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            // The first line carries the version
            let first_line = version_info.lines().next().unwrap_or("Unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SubrelayError::Media(format!("Media processor version check failed: {}", stderr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_binary() {
        let processor = MediaProcessorImpl::new(MediaConfig {
            binary_path: "/nonexistent/ffmpeg".to_string(),
            ..MediaConfig::default()
        });

        assert!(matches!(processor.check_availability().await, Err(SubrelayError::ToolNotFound(_))));
        assert!(matches!(processor.get_version_info().await, Err(SubrelayError::ToolNotFound(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_extract_audio_propagates_tool_failure() {
        // `false` ignores its arguments and exits 1
        let processor = MediaProcessorImpl::new(MediaConfig {
            binary_path: "false".to_string(),
            ..MediaConfig::default()
        });

        let err = processor
            .extract_audio(Path::new("in.mp4"), Path::new("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubrelayError::Media(msg) if msg.starts_with("Audio extraction failed")));
    }
}
