//! Clip summary pipeline.
//!
//! resolve -> gate -> extract -> describe -> summarize -> assemble.
//! Each stage runs only after the previous one succeeded; the first error
//! ends the run and is returned as is.

use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use clipsum_analysis::{ReasoningModel, Summarizer, VisionAnalyzer, VisionModel};
use clipsum_media::{
    build_provider, enforce_max_duration, FrameExtractor, FrameStore, StreamResolve,
    YtDlpResolver,
};
use clipsum_models::{ClipResult, ProcessedClip, SampleOffsets};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::ClipLogger;
use crate::metrics::{record_frame_count, record_outcome, record_stage, Stage};

/// Collaborators of a [`ClipPipeline`].
pub struct PipelineParts {
    pub resolver: Arc<dyn StreamResolve>,
    pub extractor: FrameExtractor,
    pub analyzer: VisionAnalyzer,
    pub summarizer: Summarizer,
    pub offsets: SampleOffsets,
    pub max_clip_duration: f64,
}

/// Turns a video URL into a [`ClipResult`].
#[derive(Clone)]
pub struct ClipPipeline {
    resolver: Arc<dyn StreamResolve>,
    extractor: FrameExtractor,
    analyzer: VisionAnalyzer,
    summarizer: Summarizer,
    offsets: SampleOffsets,
    max_clip_duration: f64,
}

impl ClipPipeline {
    pub fn new(parts: PipelineParts) -> Self {
        Self {
            resolver: parts.resolver,
            extractor: parts.extractor,
            analyzer: parts.analyzer,
            summarizer: parts.summarizer,
            offsets: parts.offsets,
            max_clip_duration: parts.max_clip_duration,
        }
    }

    /// Build the production pipeline: yt-dlp resolution, the configured
    /// capture backend, and the given model handles.
    pub fn from_config(
        config: &PipelineConfig,
        vision: Arc<dyn VisionModel>,
        reasoning: Arc<dyn ReasoningModel>,
    ) -> PipelineResult<Self> {
        let provider = build_provider(config.capture_backend, config.capture_timeout.as_secs())
            .map_err(|e| PipelineError::config(e.to_string()))?;

        Ok(Self::new(PipelineParts {
            resolver: Arc::new(YtDlpResolver::new(config.ytdlp.clone())),
            extractor: FrameExtractor::new(provider, FrameStore::new(&config.frames_dir)),
            analyzer: VisionAnalyzer::new(vision).with_prompt(config.vision_prompt.clone()),
            summarizer: Summarizer::new(reasoning).with_max_new_tokens(config.summary_max_tokens),
            offsets: config.offsets.clone(),
            max_clip_duration: config.max_clip_duration,
        }))
    }

    pub fn frame_store(&self) -> &FrameStore {
        self.extractor.store()
    }

    /// Run the whole pipeline for `url`.
    pub async fn process(&self, url: &str) -> PipelineResult<ClipResult> {
        let mut logger = ClipLogger::new(url);
        let span = logger.span();

        let result = self.run(url, &mut logger).instrument(span).await;

        match &result {
            Ok(clip) => {
                record_outcome("success");
                record_frame_count(clip.frames.len());
            }
            Err(e) => {
                record_outcome(e.kind());
                if e.is_client_error() {
                    logger.log_warning(&e.to_string());
                } else {
                    logger.log_error(&e.to_string());
                }
            }
        }

        result
    }

    async fn run(&self, url: &str, logger: &mut ClipLogger) -> PipelineResult<ClipResult> {
        logger.log_start("resolving stream");
        let clip = self.acquire(url, logger).await?;

        let start = Instant::now();
        let descriptions = self.analyzer.describe_all(&clip.frame_paths).await?;
        record_stage(Stage::Analyze, start.elapsed());
        debug_assert_eq!(descriptions.len(), clip.frame_paths.len());
        logger.log_progress(&format!("described {} frames", descriptions.len()));

        let start = Instant::now();
        let summary = self.summarizer.summarize(&descriptions).await?;
        record_stage(Stage::Summarize, start.elapsed());

        let result = ClipResult::assemble(clip, descriptions, summary);
        logger.log_completion(&format!("{} frames summarized", result.frames.len()));
        Ok(result)
    }

    /// Resolve, gate and sample `url`. Nothing is captured for a clip the
    /// gate rejects.
    async fn acquire(&self, url: &str, logger: &mut ClipLogger) -> PipelineResult<ProcessedClip> {
        let start = Instant::now();
        let info = self.resolver.resolve(url).await?;
        record_stage(Stage::Resolve, start.elapsed());
        logger.set_clip_id(&info.id);

        enforce_max_duration(info.duration_seconds, self.max_clip_duration)?;

        let start = Instant::now();
        let frames = self
            .extractor
            .extract(&info.id, info.duration_seconds, &info.media_url, &self.offsets)
            .await?;
        record_stage(Stage::Extract, start.elapsed());

        if frames.len() < self.offsets.len() {
            logger.log_warning(&format!(
                "captured {} of {} frames",
                frames.len(),
                self.offsets.len()
            ));
        } else {
            logger.log_progress(&format!("captured {} frames", frames.len()));
        }

        Ok(ProcessedClip::new(&info, &frames))
    }
}
