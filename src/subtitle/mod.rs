// Caption document handling
//
// - timestamp: `HH:MM:SS,mmm` clock codec
// - line: shape-based classification of serialized lines
// - document: cue model, lenient parser and canonical renderer

pub mod document;
pub mod line;
pub mod timestamp;

use std::path::Path;
use tokio::fs;
use tracing::info;

pub use document::{CaptionDocument, Cue, Segment};
pub use line::{classify_line, is_structural, LineKind, TIMING_MARKER};
pub use timestamp::{decode, encode, Timestamp};

use crate::error::{Result, SubrelayError};

/// Read and parse a caption file (UTF-8)
pub async fn read_captions<P: AsRef<Path>>(path: P) -> Result<CaptionDocument> {
    let path = path.as_ref();
    let bytes = fs::read(path).await?;
    let content = String::from_utf8(bytes).map_err(|e| {
        SubrelayError::Format(format!("{} is not valid UTF-8: {}", path.display(), e))
    })?;

    CaptionDocument::parse(&content)
}

/// Render a caption document to disk
pub async fn write_captions<P: AsRef<Path>>(document: &CaptionDocument, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing {} cues to {}", document.len(), output_path.display());

    fs::write(output_path, document.render()).await?;
    Ok(())
}
