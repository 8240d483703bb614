use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::error::{Result, SubrelayError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translate: TranslateConfig,
    pub transcriber: TranscriberConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Asset root containing `tokenizer/` and `model/`
    pub model_dir: PathBuf,
    /// Translation server base URL
    pub endpoint: String,
    /// Model id used when `model/config.json` does not name one
    pub model: String,
    pub source_language: String,
    pub target_language: String,
    /// Maximum generated length per line
    pub max_length: usize,
    /// Per-line HTTP timeout
    pub request_timeout_secs: u64,
    /// Upper bound for engine construction and for waiting on it
    pub init_timeout_secs: u64,
    /// Payload lines translated in parallel per document
    pub concurrency: usize,
    /// Translate a probe sentence right after the engine is built
    pub smoke_test: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the whisper CLI
    pub binary_path: String,
    /// Whisper model size (tiny, base, small, medium, large)
    pub model: String,
    /// Spoken language of the source audio
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Wall-clock limit for burning captions into a video
    pub burn_timeout_secs: u64,
    pub font_size: u32,
    /// ASS colour literal, e.g. `&Hffffff&`
    pub primary_colour: String,
    /// Additional encoding options for subtitle burn-in
    /// Common options: ["-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p"]
    pub subtitle_options: Vec<String>,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("saved_model"),
            endpoint: "http://localhost:8080".to_string(),
            model: "Helsinki-NLP/opus-mt-en-ru".to_string(),
            source_language: "en".to_string(),
            target_language: "ru".to_string(),
            max_length: 200,
            request_timeout_secs: 120,
            init_timeout_secs: 300,
            concurrency: 4,
            smoke_test: true,
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "base".to_string(),
            language: "en".to_string(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            burn_timeout_secs: 300,
            font_size: 24,
            primary_colour: "&Hffffff&".to_string(),
            subtitle_options: vec![],
        }
    }
}

impl TranslateConfig {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl MediaConfig {
    pub fn burn_timeout(&self) -> Duration {
        Duration::from_secs(self.burn_timeout_secs)
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubrelayError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubrelayError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubrelayError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubrelayError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}
