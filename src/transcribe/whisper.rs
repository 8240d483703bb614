use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::TranscriberConfig;
use crate::error::{Result, SubrelayError};
use crate::subtitle::Segment;
use super::Transcriber;

/// OpenAI Whisper JSON output (`--output_format json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperOutput {
    #[serde(default)]
    pub text: String,
    pub segments: Vec<WhisperSegment>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhisperSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl From<WhisperOutput> for Vec<Segment> {
    fn from(output: WhisperOutput) -> Self {
        output
            .segments
            .into_iter()
            .map(|seg| Segment {
                start: seg.start,
                end: seg.end,
                text: seg.text.trim().to_string(),
            })
            .collect()
    }
}

/// Runs the `whisper` command-line tool and reads its JSON output
pub struct WhisperCliTranscriber {
    config: TranscriberConfig,
}

impl WhisperCliTranscriber {
    pub fn new(config: TranscriberConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, audio_path: &Path, output_dir: &Path, language: &str) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model").arg(&self.config.model)
            .arg("--language").arg(language)
            .arg("--task").arg("transcribe")
            .arg("--fp16").arg("False")
            .arg("--verbose").arg("False")
            .arg("--output_format").arg("json")
            .arg("--output_dir").arg(output_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

pub fn parse_whisper_json(content: &str) -> Result<Vec<Segment>> {
    let output: WhisperOutput = serde_json::from_str(content)
        .map_err(|e| SubrelayError::Transcriber(format!("Failed to parse whisper JSON: {}", e)))?;
    Ok(output.into())
}

#[async_trait]
impl Transcriber for WhisperCliTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Vec<Segment>> {
        let language = language.unwrap_or(&self.config.language);
        info!("Transcribing {} (model {}, language {})", audio_path.display(), self.config.model, language);

        let temp_dir = tempfile::tempdir()
            .map_err(|e| SubrelayError::Transcriber(format!("Failed to create temp directory: {}", e)))?;

        let mut cmd = self.build_command(audio_path, temp_dir.path(), language);
        debug!("Executing whisper command: {:?}", cmd);

        let output = cmd.output().await.map_err(|e| {
            SubrelayError::ToolNotFound(format!("{}: {}", self.config.binary_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SubrelayError::Transcriber(format!("Whisper failed: {}", stderr)));
        }

        let audio_stem = audio_path.file_stem()
            .ok_or_else(|| SubrelayError::Transcriber("Invalid audio filename".to_string()))?;
        let json_file = temp_dir.path().join(format!("{}.json", audio_stem.to_string_lossy()));

        let json_content = tokio::fs::read_to_string(&json_file).await
            .map_err(|e| SubrelayError::Transcriber(format!("Failed to read output: {}", e)))?;

        let segments = parse_whisper_json(&json_content)?;
        info!("Transcription produced {} segments", segments.len());
        Ok(segments)
    }

    async fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.binary_path)
            .arg("--help")
            .output()
            .await
            .map_err(|e| SubrelayError::ToolNotFound(format!("{}: {}", self.config.binary_path, e)))?;

        if output.status.success() {
            info!("Whisper command-line tool is available");
            Ok(())
        } else {
            Err(SubrelayError::Transcriber(format!(
                "Whisper not usable: {}",
                String::from_utf8_lossy(&output.stderr)
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_json() {
        let json = r#"{
            "text": " Hello world. Bye.",
            "segments": [
                {"id": 0, "seek": 0, "start": 0.0, "end": 2.5, "text": " Hello world.", "tokens": [1, 2], "avg_logprob": -0.2},
                {"id": 1, "seek": 0, "start": 2.5, "end": 3.0, "text": " Bye."}
            ],
            "language": "en"
        }"#;

        let segments = parse_whisper_json(json).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "Hello world.");
        assert_eq!(segments[1].start, 2.5);
    }

    #[test]
    fn test_parse_whisper_json_rejects_garbage() {
        let err = parse_whisper_json("not json").unwrap_err();
        assert!(matches!(err, SubrelayError::Transcriber(_)));
    }

    #[test]
    fn test_build_command_arguments() {
        let transcriber = WhisperCliTranscriber::new(TranscriberConfig::default());
        let cmd = transcriber.build_command(Path::new("audio.wav"), Path::new("/tmp/out"), "en");
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert_eq!(args[0], "audio.wav");
        assert!(args.windows(2).any(|w| w == ["--model", "base"]));
        assert!(args.windows(2).any(|w| w == ["--fp16", "False"]));
        assert!(args.windows(2).any(|w| w == ["--output_format", "json"]));
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let transcriber = WhisperCliTranscriber::new(TranscriberConfig {
            binary_path: "/nonexistent/whisper".to_string(),
            ..TranscriberConfig::default()
        });
        let err = transcriber.transcribe(Path::new("a.wav"), None).await.unwrap_err();
        assert!(matches!(err, SubrelayError::ToolNotFound(_)));
    }
}
