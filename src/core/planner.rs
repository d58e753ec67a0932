//! Request → schedules orchestration.
//!
//! Phases run strictly in order: resolve text, extract codes, fetch and
//! filter the catalog, optionally persist, synthesize. Input and extraction
//! problems halt the run before any timetable request; fetch problems are
//! absorbed per department; a synthesis problem still returns the echoed
//! request with no schedules.

use crate::domain::model::{
    GenerationLimits, PlannerInput, PlannerOutcome, RequestedCourseSet, ScheduleResponse,
    SynthesisRequest,
};
use crate::domain::ports::{CodeExtractor, Pipeline, ScheduleSynthesizer, Transcriber};
use crate::utils::error::{PlannerError, Result};
use crate::utils::monitor::PhaseMonitor;
use std::sync::Arc;

pub const EXTRACTION_FAILED: &str = "Error extracting course codes";
pub const NO_ALLOWED_CODES: &str = "No allowed course codes available.";
const NO_INPUT: &str = "No input provided (neither audio nor raw text).";
const EMPTY_INPUT: &str = "Input text was empty.";
const AUDIO_TOO_LARGE: &str =
    "Audio file is too large. Please provide a smaller file or use raw text input.";

pub struct SchedulePlanner<P: Pipeline> {
    pipeline: P,
    extractor: Arc<dyn CodeExtractor>,
    synthesizer: Arc<dyn ScheduleSynthesizer>,
    transcriber: Option<Arc<dyn Transcriber>>,
    allowed_codes: Vec<String>,
    limits: GenerationLimits,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> SchedulePlanner<P> {
    pub fn new(
        pipeline: P,
        extractor: Arc<dyn CodeExtractor>,
        synthesizer: Arc<dyn ScheduleSynthesizer>,
        allowed_codes: Vec<String>,
    ) -> Self {
        Self {
            pipeline,
            extractor,
            synthesizer,
            transcriber: None,
            allowed_codes,
            limits: GenerationLimits::default(),
            monitor: PhaseMonitor::new(false),
        }
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_limits(mut self, limits: GenerationLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_monitoring(mut self, enabled: bool) -> Self {
        self.monitor = PhaseMonitor::new(enabled);
        self
    }

    /// Runs one request end to end. Never fails: every problem becomes either
    /// a `{ error, details }` failure or an error-status schedule response.
    pub async fn plan(&self, input: PlannerInput) -> PlannerOutcome {
        tracing::info!("🚀 Starting schedule planning");
        self.monitor.log_phase("start");

        if self.allowed_codes.is_empty() {
            tracing::error!("❌ Allowed course code list is empty");
            return PlannerOutcome::failure(
                NO_ALLOWED_CODES,
                "Configure courses.allowed_codes or courses.allowed_codes_file",
            );
        }

        let text = match self.resolve_text(input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("❌ Input rejected: {}", e);
                return PlannerOutcome::failure(EXTRACTION_FAILED, input_details(&e));
            }
        };
        self.monitor.log_phase("input");

        let requested = match self.extract_request(&text).await {
            Ok(requested) => requested,
            Err(e) => {
                tracing::warn!("❌ {}", e);
                return PlannerOutcome::failure(EXTRACTION_FAILED, extraction_details(e));
            }
        };
        tracing::info!(
            "📋 Requested {} mandatory and {} elective course(s)",
            requested.mandatory.len(),
            requested.electives.len()
        );
        self.monitor.log_phase("extraction");

        let document = match self.build_catalog(&requested).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("❌ Catalog build failed: {}", e);
                return PlannerOutcome::Schedules(ScheduleResponse::failed(&requested));
            }
        };

        let request = SynthesisRequest {
            document,
            mandatory: requested.mandatory.clone(),
            electives: requested.electives.clone(),
            special_request: requested.special_request.clone(),
            limits: self.limits,
        };

        let response = match self.synthesizer.synthesize(request).await {
            Ok(response) => {
                tracing::info!("✅ {} schedule(s) generated", response.schedules.len());
                response.with_echo(&requested)
            }
            Err(e) => {
                tracing::error!("❌ {}", e);
                tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                ScheduleResponse::failed(&requested)
            }
        };
        self.monitor.log_phase("synthesis");

        PlannerOutcome::Schedules(response)
    }

    /// Non-blank raw text wins; otherwise audio is transcribed.
    async fn resolve_text(&self, input: PlannerInput) -> Result<String> {
        if let Some(text) = input.raw_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return Ok(text.to_string());
            }
        }

        let text = match (input.audio, &self.transcriber) {
            (Some(audio), Some(transcriber)) => {
                tracing::info!(
                    "🎙️ Transcribing {} ({} bytes)",
                    audio.file_name,
                    audio.bytes.len()
                );
                transcriber.transcribe(&audio).await?
            }
            (Some(_), None) => {
                return Err(PlannerError::input(
                    "Audio input is not supported without a transcription service.",
                ))
            }
            (None, _) if input.raw_text.is_some() => return Err(PlannerError::input(EMPTY_INPUT)),
            (None, _) => return Err(PlannerError::input(NO_INPUT)),
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(PlannerError::input(EMPTY_INPUT));
        }
        Ok(text.to_string())
    }

    async fn extract_request(&self, text: &str) -> Result<RequestedCourseSet> {
        let response = self
            .extractor
            .extract_codes(text, &self.allowed_codes)
            .await?;

        if !response.is_success() {
            let details = if response.requested_input.trim().is_empty() {
                format!("extraction status '{}'", response.status)
            } else {
                response.requested_input
            };
            return Err(PlannerError::extraction(details));
        }

        Ok(response.into_requested(&self.allowed_codes))
    }

    /// Extract, transform and load. A failed load is logged and otherwise ignored.
    async fn build_catalog(&self, requested: &RequestedCourseSet) -> Result<String> {
        let departments: Vec<String> = requested.departments().into_iter().collect();

        let sections = self.pipeline.extract(&departments).await?;
        self.monitor.log_phase("extract");

        let excerpt = self.pipeline.transform(sections, requested).await?;
        self.monitor.log_phase("transform");

        match self.pipeline.load(&excerpt).await {
            Ok(Some(path)) => tracing::info!("📁 Output saved to: {}", path),
            Ok(None) => {}
            Err(e) => tracing::warn!("⚠️ Could not persist run artifacts: {}", e),
        }

        Ok(excerpt.document.into_string())
    }
}

fn input_details(error: &PlannerError) -> String {
    match error {
        PlannerError::InputError { message } => message.clone(),
        PlannerError::PayloadTooLarge { .. } => AUDIO_TOO_LARGE.to_string(),
        other => other.to_string(),
    }
}

fn extraction_details(error: PlannerError) -> String {
    match error {
        PlannerError::ExtractionError { message } => message,
        other => other.to_string(),
    }
}
