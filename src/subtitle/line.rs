/// Separator between the start and end clocks of a timing line.
pub const TIMING_MARKER: &str = "-->";

/// Shape of one physical line of a caption document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Index,
    Timing,
    Payload,
}

impl LineKind {
    pub fn is_structural(&self) -> bool {
        !matches!(self, LineKind::Payload)
    }
}

/// Classify a line by shape only, after trimming surrounding whitespace.
pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        LineKind::Blank
    } else if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        LineKind::Index
    } else if trimmed.contains(TIMING_MARKER) {
        LineKind::Timing
    } else {
        LineKind::Payload
    }
}

/// Structural lines are never sent to a translation engine.
pub fn is_structural(line: &str) -> bool {
    classify_line(line).is_structural()
}
