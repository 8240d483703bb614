use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, SubrelayError};
use super::{EngineLoader, TranslationEngine};

pub const TOKENIZER_DIR: &str = "tokenizer";
pub const MODEL_DIR: &str = "model";

const SMOKE_TEST_TEXT: &str = "Hello world";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub model: String,
    pub inputs: String,
    pub parameters: TranslationParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationParameters {
    pub src_lang: String,
    pub tgt_lang: String,
    pub max_length: usize,
    pub truncation: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationOutput {
    pub translation_text: String,
}

/// Servers answer either with a batch list or a single object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum TranslationResponse {
    Batch(Vec<TranslationOutput>),
    Single(TranslationOutput),
}

impl TranslationResponse {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Batch(outputs) => outputs.into_iter().next().map(|o| o.translation_text),
            Self::Single(output) => Some(output.translation_text),
        }
    }
}

/// Subset of a saved model's `config.json` we care about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelManifest {
    #[serde(rename = "_name_or_path")]
    pub name_or_path: Option<String>,
    pub max_length: Option<usize>,
}

/// Translation engine talking to an inference server that serves the saved model.
pub struct HttpTranslationEngine {
    client: Client,
    url: String,
    model: String,
    source_language: String,
    target_language: String,
    max_length: usize,
}

impl HttpTranslationEngine {
    pub fn new(config: &TranslateConfig, model: String, max_length: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/translate", config.endpoint.trim_end_matches('/')),
            model,
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            max_length,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TranslationEngine for HttpTranslationEngine {
    async fn translate(&self, text: &str) -> Result<String> {
        let request = TranslationRequest {
            model: self.model.clone(),
            inputs: text.to_string(),
            parameters: TranslationParameters {
                src_lang: self.source_language.clone(),
                tgt_lang: self.target_language.clone(),
                max_length: self.max_length,
                truncation: true,
            },
        };

        debug!("Sending translation request to: {}", self.url);

        let response = self.client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SubrelayError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SubrelayError::Translation(format!(
                "Translation server error {}: {}", status, error_text
            )));
        }

        let parsed: TranslationResponse = response.json().await
            .map_err(|e| SubrelayError::Translation(format!("Failed to parse response: {}", e)))?;

        let translation = parsed.into_text().unwrap_or_default().trim().to_string();
        if translation.is_empty() {
            return Err(SubrelayError::Translation("Empty translation received".to_string()));
        }

        Ok(translation)
    }
}

/// Loads the engine from a saved model directory with `tokenizer/` and `model/` inside.
pub struct ModelDirLoader {
    config: TranslateConfig,
}

impl ModelDirLoader {
    pub fn new(config: TranslateConfig) -> Self {
        Self { config }
    }

    /// Fail fast if the asset layout is incomplete.
    pub fn check_assets(&self) -> Result<()> {
        let root = &self.config.model_dir;
        for path in [root.clone(), root.join(TOKENIZER_DIR), root.join(MODEL_DIR)] {
            if !path.is_dir() {
                return Err(SubrelayError::ResourceMissing(format!(
                    "{} (expected {}/{{{},{}}})",
                    path.display(),
                    root.display(),
                    TOKENIZER_DIR,
                    MODEL_DIR
                )));
            }
        }

        info!("Saved model found in: {}", root.display());
        Ok(())
    }

    async fn read_manifest(&self) -> Result<ModelManifest> {
        let path: PathBuf = self.config.model_dir.join(MODEL_DIR).join("config.json");
        load_manifest(&path).await
    }
}

async fn load_manifest(path: &Path) -> Result<ModelManifest> {
    if !path.exists() {
        warn!("No model manifest at {}, using configured model id", path.display());
        return Ok(ModelManifest::default());
    }

    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[async_trait]
impl EngineLoader for ModelDirLoader {
    async fn load(&self) -> Result<Arc<dyn TranslationEngine>> {
        self.check_assets()?;

        info!("Loading translation engine...");
        let started = Instant::now();

        info!("Tokenizer from: {}", self.config.model_dir.join(TOKENIZER_DIR).display());
        info!("Model from: {}", self.config.model_dir.join(MODEL_DIR).display());

        let manifest = self.read_manifest().await?;
        let model = manifest.name_or_path
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| self.config.model.clone());
        let max_length = manifest.max_length
            .map(|limit| limit.min(self.config.max_length))
            .unwrap_or(self.config.max_length);

        let engine = HttpTranslationEngine::new(&self.config, model, max_length)?;
        info!("Translation engine for {} ready in {:.1}s", engine.model(), started.elapsed().as_secs_f64());

        if self.config.smoke_test {
            match engine.translate(SMOKE_TEST_TEXT).await {
                Ok(result) => info!("Smoke test: '{}' -> '{}'", SMOKE_TEST_TEXT, result),
                Err(e) => warn!("Smoke test translation failed: {}", e),
            }
        }

        Ok(Arc::new(engine))
    }
}
