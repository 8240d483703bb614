// Transcription stage
//
// Speech recognition is an external black box: audio file in, timed segments out.
// - whisper: OpenAI Whisper command-line implementation

pub mod whisper;

use async_trait::async_trait;
use std::path::Path;

pub use whisper::WhisperCliTranscriber;

use crate::config::TranscriberConfig;
use crate::error::Result;
use crate::subtitle::Segment;

/// Main trait for transcription operations
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into timed segments
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Vec<Segment>>;

    /// Check if the recognizer can be invoked
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating transcriber instances
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create_default(config: TranscriberConfig) -> Box<dyn Transcriber> {
        Box::new(WhisperCliTranscriber::new(config))
    }
}
