use std::path::Path;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Result, SubrelayError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::staging::StagingArea;
use crate::subtitle::{read_captions, write_captions, CaptionDocument};
use crate::transcribe::{Transcriber, TranscriberFactory};
use crate::translate::{CaptionTranslator, EngineGateway, ModelDirLoader, TranslationReport};

/// Sequences the four stages: audio extraction, transcription, translation, burn-in.
pub struct Workflow {
    config: Config,
    transcriber: Box<dyn Transcriber>,
    media: Box<dyn MediaProcessorTrait>,
    gateway: Arc<EngineGateway>,
    translator: CaptionTranslator,
}

fn stage_span(stage: &'static str) -> Span {
    info_span!("stage", stage = stage, request_id = %Uuid::new_v4())
}

fn require_input(path: &Path, what: &str) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SubrelayError::MissingInput(format!("No {} file provided: {}", what, path.display())))
    }
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        let loader = Arc::new(ModelDirLoader::new(config.translate.clone()));
        let gateway = Arc::new(EngineGateway::new(loader, config.translate.init_timeout()));
        let transcriber = TranscriberFactory::create_default(config.transcriber.clone());
        let media = MediaProcessorFactory::create_processor(config.media.clone());

        Self::with_components(config, transcriber, media, gateway)
    }

    pub fn with_components(
        config: Config,
        transcriber: Box<dyn Transcriber>,
        media: Box<dyn MediaProcessorTrait>,
        gateway: Arc<EngineGateway>,
    ) -> Self {
        let translator = CaptionTranslator::new(gateway.clone(), config.translate.concurrency);

        Self {
            config,
            transcriber,
            media,
            gateway,
            translator,
        }
    }

    pub fn gateway(&self) -> &Arc<EngineGateway> {
        &self.gateway
    }

    /// Extract audio from video file
    pub async fn extract_audio(&self, video_path: &Path, audio_path: &Path) -> Result<()> {
        async {
            require_input(video_path, "video")?;
            self.media.extract_audio(video_path, audio_path).await
        }
        .instrument(stage_span("extract_audio"))
        .await
    }

    /// Transcribe audio file into a caption document
    pub async fn generate_captions(
        &self,
        audio_path: &Path,
        output_path: &Path,
        language: Option<&str>,
    ) -> Result<CaptionDocument> {
        async {
            require_input(audio_path, "audio")?;
            let segments = self.transcriber.transcribe(audio_path, language).await?;
            let document = CaptionDocument::from_segments(&segments);
            write_captions(&document, output_path).await?;
            Ok::<_, SubrelayError>(document)
        }
        .instrument(stage_span("generate_captions"))
        .await
    }

    /// Translate a caption file; engine trouble degrades to pass-through rather than failing
    pub async fn translate_captions(&self, input_path: &Path, output_path: &Path) -> Result<TranslationReport> {
        async {
            require_input(input_path, "subtitles")?;
            let document = read_captions(input_path).await?;

            let (translated, report) = self.translator.translate_document_with_report(&document).await;
            if let Some(reason) = &report.passthrough {
                warn!("Captions written untranslated (degraded mode): {}", reason);
            } else {
                info!(
                    "Translated {} lines to {} ({} kept in source language)",
                    report.translated, self.config.translate.target_language, report.fallbacks
                );
            }

            write_captions(&translated, output_path).await?;
            Ok::<_, SubrelayError>(report)
        }
        .instrument(stage_span("translate_captions"))
        .await
    }

    /// Render captions into the video frames
    pub async fn burn_captions(&self, video_path: &Path, subtitles_path: &Path, output_path: &Path) -> Result<()> {
        async {
            require_input(video_path, "video")?;
            require_input(subtitles_path, "subtitles")?;
            self.media.burn_subtitles(video_path, subtitles_path, output_path).await
        }
        .instrument(stage_span("burn_captions"))
        .await
    }

    /// Run every stage on one video. Intermediates live in a staging area that is
    /// removed afterwards; `keep_dir` receives copies of them, even on failure.
    pub async fn process(
        &self,
        video_path: &Path,
        output_path: &Path,
        keep_dir: Option<&Path>,
    ) -> Result<TranslationReport> {
        require_input(video_path, "video")?;
        info!("Processing video file: {}", video_path.display());

        let staging = StagingArea::new()?;
        let result = self.run_stages(&staging, video_path, output_path).await;

        if let Some(dir) = keep_dir {
            if let Err(e) = staging.export_to(dir).await {
                warn!("Failed to keep intermediates in {}: {}", dir.display(), e);
            }
        }

        result
    }

    async fn run_stages(
        &self,
        staging: &StagingArea,
        video_path: &Path,
        output_path: &Path,
    ) -> Result<TranslationReport> {
        let source_language = self.config.transcriber.language.as_str();
        let audio = staging.path("audio.wav");
        let captions = staging.path(&format!("subtitles_{}.srt", source_language));
        let translated = staging.path(&format!("subtitles_{}.srt", self.config.translate.target_language));
        let burned_name = "video_with_subtitles.mp4";

        self.extract_audio(video_path, &audio).await?;
        self.generate_captions(&audio, &captions, Some(source_language)).await?;
        let report = self.translate_captions(&captions, &translated).await?;
        self.burn_captions(video_path, &translated, &staging.path(burned_name)).await?;
        staging.persist(burned_name, output_path).await?;

        Ok(report)
    }

    /// Probe every external collaborator; one entry per component
    pub async fn check(&self) -> Vec<(&'static str, Result<String>)> {
        let media = self.media.get_version_info().await;
        let transcriber = self.transcriber.check_availability().await.map(|_| "available".to_string());
        let assets = ModelDirLoader::new(self.config.translate.clone())
            .check_assets()
            .map(|_| self.config.translate.model_dir.display().to_string());

        vec![("ffmpeg", media), ("whisper", transcriber), ("translation model", assets)]
    }
}
