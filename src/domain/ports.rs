use crate::core::markup::RawRow;
use crate::domain::model::{
    AudioInput, CatalogExcerpt, ExtractionResponse, RequestedCourseSet, ScheduleResponse, Section,
    SynthesisRequest,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Write-only sink for run archives.
pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Timetable access, one department per call.
///
/// Implementations fail open: any transport problem, timeout or non-success
/// status is logged and reported as an empty row list, so that one
/// department's outage never blocks the others.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_department(&self, department: &str, term_code: &str) -> Vec<RawRow>;
}

/// Natural-language request → course codes and special request.
#[async_trait]
pub trait CodeExtractor: Send + Sync {
    async fn extract_codes(&self, text: &str, allowed_codes: &[String])
        -> Result<ExtractionResponse>;
}

/// Catalog excerpt → candidate schedules.
#[async_trait]
pub trait ScheduleSynthesizer: Send + Sync {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<ScheduleResponse>;
}

/// Audio → text. Oversized payloads surface as `PlannerError::PayloadTooLarge`.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &AudioInput) -> Result<String>;
}

/// Extract / transform / load over the timetable for one request.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self, departments: &[String]) -> Result<Vec<Section>>;
    async fn transform(
        &self,
        sections: Vec<Section>,
        requested: &RequestedCourseSet,
    ) -> Result<CatalogExcerpt>;
    async fn load(&self, excerpt: &CatalogExcerpt) -> Result<Option<String>>;
}
