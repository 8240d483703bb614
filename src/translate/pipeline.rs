use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::subtitle::{is_structural, CaptionDocument, Cue};
use super::{EngineGateway, TranslationEngine};

/// What happened while translating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    /// Payload lines replaced by a translation
    pub translated: usize,
    /// Payload lines kept in the source language after a per-line failure
    pub fallbacks: usize,
    /// Set when the engine was unavailable and the document passed through untouched
    pub passthrough: Option<String>,
}

impl TranslationReport {
    pub fn is_degraded(&self) -> bool {
        self.fallbacks > 0 || self.passthrough.is_some()
    }
}

/// One physical line of one cue; `payload` is false for structural lines.
struct LineSlot {
    cue: usize,
    text: String,
    payload: bool,
}

/// Translates caption documents line by line through the shared engine.
pub struct CaptionTranslator {
    gateway: Arc<EngineGateway>,
    concurrency: usize,
}

impl CaptionTranslator {
    pub fn new(gateway: Arc<EngineGateway>, concurrency: usize) -> Self {
        Self {
            gateway,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn translate_document(&self, document: &CaptionDocument) -> CaptionDocument {
        self.translate_document_with_report(document).await.0
    }

    /// Structure (cue count, order, indices, timing) is always preserved; only payload text changes.
    pub async fn translate_document_with_report(
        &self,
        document: &CaptionDocument,
    ) -> (CaptionDocument, TranslationReport) {
        let engine = match self.gateway.get_or_init().await {
            Ok(engine) => engine,
            Err(e) => {
                warn!("Translation engine unavailable, passing {} cues through untranslated: {}", document.len(), e);
                let report = TranslationReport {
                    passthrough: Some(e.to_string()),
                    ..TranslationReport::default()
                };
                return (document.clone(), report);
            }
        };

        let slots: Vec<LineSlot> = document
            .cues()
            .iter()
            .enumerate()
            .flat_map(|(cue, c)| {
                c.lines().map(move |line| LineSlot {
                    cue,
                    text: line.to_string(),
                    payload: !is_structural(line),
                })
            })
            .collect();

        let payload_lines = slots.iter().filter(|s| s.payload).count();
        info!("Translating {} payload lines across {} cues", payload_lines, document.len());

        // `buffered` yields in input order regardless of completion order
        let results: Vec<(usize, String, Option<bool>)> = stream::iter(slots)
            .map(|slot| {
                let engine = engine.clone();
                async move {
                    if !slot.payload {
                        return (slot.cue, slot.text, None);
                    }
                    let (text, ok) = translate_line(&*engine, &slot.text).await;
                    (slot.cue, text, Some(ok))
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = TranslationReport::default();
        let mut texts: Vec<Vec<String>> = vec![Vec::new(); document.len()];
        for (cue, text, outcome) in results {
            match outcome {
                Some(true) => report.translated += 1,
                Some(false) => report.fallbacks += 1,
                None => {}
            }
            texts[cue].push(text);
        }

        let cues: Vec<Cue> = document
            .cues()
            .iter()
            .zip(texts)
            .map(|(cue, lines)| cue.with_text(lines.join("\n")))
            .collect();

        if report.fallbacks > 0 {
            warn!("{} of {} payload lines kept untranslated", report.fallbacks, payload_lines);
        }

        (CaptionDocument::new(cues), report)
    }
}

/// Returns the translation, or the original line when the engine fails for it.
async fn translate_line(engine: &dyn TranslationEngine, line: &str) -> (String, bool) {
    match engine.translate(line.trim()).await {
        Ok(translation) => match single_line(&translation) {
            Some(translation) => {
                debug!("'{}' -> '{}'", line, translation);
                (translation, true)
            }
            None => {
                warn!("Engine returned a blank translation, keeping original '{}'", line);
                (line.to_string(), false)
            }
        },
        Err(e) => {
            warn!("Line translation failed, keeping original '{}': {}", line, e);
            (line.to_string(), false)
        }
    }
}

/// Collapses line breaks and whitespace runs so a translation stays one payload line.
fn single_line(translation: &str) -> Option<String> {
    let collapsed = translation.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}
