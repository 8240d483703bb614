// Translation stage
//
// - engine: HTTP-backed translation engine and the model-directory loader
// - gateway: lazily built, process-shared engine with single-flight construction
// - pipeline: line-by-line caption translation with graceful degradation

pub mod engine;
pub mod gateway;
pub mod pipeline;

use async_trait::async_trait;
use std::sync::Arc;

pub use engine::{HttpTranslationEngine, ModelDirLoader};
pub use gateway::{EngineGateway, GatewayState};
pub use pipeline::{CaptionTranslator, TranslationReport};

use crate::error::Result;

/// A ready-to-use translator for single strings. Shared read-only across requests.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate one line of text.
    async fn translate(&self, text: &str) -> Result<String>;
}

/// Builds the (expensive) translation engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TranslationEngine>>;
}
