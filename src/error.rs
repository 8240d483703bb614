use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubrelayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Required resource not found: {0}")]
    ResourceMissing(String),

    #[error("Translation engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Transcriber error: {0}")]
    Transcriber(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("{0} timed out after {1} seconds")]
    Timeout(String, u64),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse failure classes used to decide how far an error travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client-fixable, reported before any side effect.
    Input,
    /// Assets or tools absent.
    Resource,
    /// A single item failed; recovered by the caller.
    Transient,
    /// Non-zero exit or timeout of ffmpeg/whisper.
    ExternalTool,
    /// Malformed timestamp or caption document.
    Format,
    Internal,
}

impl SubrelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput(_) => ErrorKind::Input,
            Self::ResourceMissing(_) | Self::EngineUnavailable(_) | Self::ToolNotFound(_) => {
                ErrorKind::Resource
            }
            Self::Translation(_) => ErrorKind::Transient,
            Self::Media(_) | Self::Transcriber(_) | Self::Timeout(..) => ErrorKind::ExternalTool,
            Self::Format(_) => ErrorKind::Format,
            Self::Io(_) | Self::Json(_) | Self::Toml(_) | Self::Http(_) | Self::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// JSON error body handed back to callers, `{"error": "<message>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&SubrelayError> for ErrorBody {
    fn from(err: &SubrelayError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SubrelayError>;
