use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SubrelayError};
use super::line::{classify_line, LineKind, TIMING_MARKER};
use super::timestamp::Timestamp;

/// One timed segment as produced by a speech recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// One caption entry. `text` may span several lines joined by `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub text: String,
}

impl Cue {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Same index and timing, new payload.
    pub fn with_text(&self, text: String) -> Cue {
        Cue {
            index: self.index,
            start: self.start,
            end: self.end,
            text,
        }
    }
}

/// An ordered sequence of cues. Transformations build a new document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptionDocument {
    cues: Vec<Cue>,
}

impl CaptionDocument {
    pub fn new(cues: Vec<Cue>) -> Self {
        Self { cues }
    }

    /// Build a document from recognizer output, numbering cues from 1.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let cues = segments
            .iter()
            .enumerate()
            .map(|(i, segment)| Cue {
                index: i + 1,
                start: Timestamp::from_seconds(segment.start),
                end: Timestamp::from_seconds(segment.end),
                text: segment.text.trim().to_string(),
            })
            .collect();

        Self { cues }
    }

    /// Lenient parse: blocks are split on blank lines and only line shape is inspected.
    ///
    /// Within a block the first line carrying `-->` is the timing line; a bare
    /// integer before it is the index (otherwise the cue's position is used), and
    /// every line after it is payload. A block without a timing line is rejected.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut cues = Vec::new();

        for (block_no, block) in split_blocks(text).into_iter().enumerate() {
            let timing_pos = block
                .iter()
                .position(|line| classify_line(line) == LineKind::Timing)
                .ok_or_else(|| {
                    SubrelayError::Format(format!(
                        "caption block {} has no timing line: {:?}",
                        block_no + 1,
                        block.first().copied().unwrap_or_default()
                    ))
                })?;

            let mut index = None;
            for line in &block[..timing_pos] {
                match (classify_line(line), index) {
                    (LineKind::Index, None) => index = line.trim().parse::<usize>().ok(),
                    _ => warn!("Skipping stray line before timing in block {}: {:?}", block_no + 1, line),
                }
            }

            let (start, end) = parse_timing(block[timing_pos]).map_err(|e| {
                SubrelayError::Format(format!("caption block {}: {}", block_no + 1, e))
            })?;

            let text = block[timing_pos + 1..]
                .iter()
                .map(|line| line.trim_end())
                .collect::<Vec<_>>()
                .join("\n");

            cues.push(Cue {
                index: index.unwrap_or(cues.len() + 1),
                start,
                end,
                text,
            });
        }

        Ok(Self { cues })
    }

    /// Serialize as `<index>\n<start> --> <end>\n<text>\n\n` per cue.
    pub fn render(&self) -> String {
        let mut srt_content = String::new();

        for cue in &self.cues {
            srt_content.push_str(&format!(
                "{}\n{} {} {}\n{}\n\n",
                cue.index, cue.start, TIMING_MARKER, cue.end, cue.text
            ));
        }

        srt_content
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        if classify_line(line) == LineKind::Blank {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn parse_timing(line: &str) -> Result<(Timestamp, Timestamp)> {
    let (start, rest) = line
        .split_once(TIMING_MARKER)
        .ok_or_else(|| SubrelayError::Format(format!("not a timing line: {:?}", line)))?;

    // Anything after the end clock (position hints) is ignored
    let end = rest
        .split_whitespace()
        .next()
        .ok_or_else(|| SubrelayError::Format(format!("missing end clock: {:?}", line)))?;

    Ok((start.parse()?, end.parse()?))
}
