use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::{Result, SubrelayError};

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    /// Wall-clock limit; the child is killed when it is exceeded
    pub timeout: Option<Duration>,
}

impl MediaCommand {
    /// Create a new media processing command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            timeout: None,
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Copy audio stream
    pub fn copy_audio(self) -> Self {
        self.arg("-c:a").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add video filter
    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    /// Execute the command, attaching stderr to the error on failure
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| SubrelayError::Timeout(self.description.clone(), limit.as_secs()))?,
            None => child.await,
        }
        .map_err(|e| SubrelayError::ToolNotFound(format!("{}: {}", self.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubrelayError::Media(format!(
                "{} failed ({}): {}",
                self.description,
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Escape a path for use inside an ffmpeg filter argument
pub fn escape_filter_path(path: &Path) -> String {
    let mut escaped = String::new();
    for c in path.to_string_lossy().chars() {
        match c {
            '\\' => escaped.push('/'),
            ':' | '\'' | ',' | '[' | ']' | ';' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builder for the media operations of the pipeline
pub struct MediaCommandBuilder {
    config: MediaConfig,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Caption overlay filter with the configured style
    pub fn subtitle_filter<P: AsRef<Path>>(&self, subtitle_path: P) -> String {
        format!(
            "subtitles={}:force_style='Fontsize={},PrimaryColour={}'",
            escape_filter_path(subtitle_path.as_ref()),
            self.config.font_size,
            self.config.primary_colour
        )
    }

    /// Build caption burn-in command (audio passes through untouched)
    pub fn burn_subtitles<P: AsRef<Path>>(
        &self,
        video_path: P,
        subtitle_path: P,
        output_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Subtitle burn-in")
            .input(&video_path)
            .video_filter(self.subtitle_filter(&subtitle_path))
            .copy_audio()
            .args(self.config.subtitle_options.iter().cloned())
            .overwrite()
            .output(output_path)
            .with_timeout(self.config.burn_timeout())
    }

    /// Build audio extraction command: mono, 16 kHz, signed 16-bit PCM WAV
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
    ) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Audio extraction")
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .overwrite()
            .output(audio_path)
    }

    /// Build version check command
    pub fn version_check(&self) -> MediaCommand {
        MediaCommand::new(&self.config.binary_path, "Version check")
            .arg("-version")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_audio_arguments() {
        let builder = MediaCommandBuilder::new(MediaConfig::default());
        let cmd = builder.extract_audio("in.mp4", "out.wav");

        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(
            cmd.args,
            vec!["-i", "in.mp4", "-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y", "out.wav"]
        );
        assert!(cmd.timeout.is_none());
    }

    #[test]
    fn test_burn_subtitles_arguments() {
        let config = MediaConfig {
            subtitle_options: vec!["-preset".into(), "fast".into()],
            ..MediaConfig::default()
        };
        let builder = MediaCommandBuilder::new(config);
        let cmd = builder.burn_subtitles("in.mp4", "/tmp/subs.srt", "out.mp4");

        assert_eq!(
            cmd.args,
            vec![
                "-i",
                "in.mp4",
                "-vf",
                "subtitles=/tmp/subs.srt:force_style='Fontsize=24,PrimaryColour=&Hffffff&'",
                "-c:a",
                "copy",
                "-preset",
                "fast",
                "-y",
                "out.mp4",
            ]
        );
        assert_eq!(cmd.timeout, Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_escape_filter_path() {
        assert_eq!(escape_filter_path(Path::new("/tmp/a.srt")), "/tmp/a.srt");
        assert_eq!(escape_filter_path(Path::new("C:\\subs\\it's.srt")), "C\\:/subs/it\\'s.srt");
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let err = MediaCommand::new("/nonexistent/ffmpeg", "Version check")
            .arg("-version")
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, SubrelayError::ToolNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_attaches_stderr() {
        let err = MediaCommand::new("sh", "Failing tool")
            .args(["-c", "echo boom >&2; exit 3"])
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, SubrelayError::Media(msg) if msg.contains("boom") && msg.contains("Failing tool")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_slow_tool() {
        let err = MediaCommand::new("sleep", "Slow tool")
            .arg("5")
            .with_timeout(Duration::from_millis(100))
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, SubrelayError::Timeout(what, _) if what == "Slow tool"));
    }
}
