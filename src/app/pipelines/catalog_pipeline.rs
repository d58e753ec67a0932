use crate::config::toml_config::TomlConfig;
use crate::core::document::build_document;
use crate::core::filter::filter_sections;
use crate::core::parser::parse_sections;
use crate::domain::model::{CatalogExcerpt, RequestedCourseSet, Section};
use crate::domain::ports::{CatalogSource, Pipeline, Storage};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use zip::write::{FileOptions, ZipWriter};

/// Summary written next to the catalog in the run archive.
#[derive(Debug, Serialize)]
struct RunManifest<'a> {
    term_code: &'a str,
    departments: &'a [String],
    fetched_sections: usize,
    matched_sections: usize,
    document_blocks: usize,
    generated_at: String,
}

/// Timetable pipeline: fetch departments, keep requested sections, render the catalog.
pub struct CatalogPipeline<S: Storage> {
    pub(crate) source: Arc<dyn CatalogSource>,
    pub(crate) storage: S,
    pub(crate) config: TomlConfig,
}

impl<S: Storage> CatalogPipeline<S> {
    pub fn new(source: Arc<dyn CatalogSource>, storage: S, config: TomlConfig) -> Self {
        Self {
            source,
            storage,
            config,
        }
    }

    fn archive(&self, excerpt: &CatalogExcerpt) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("catalog.md", FileOptions::default())?;
        zip.write_all(excerpt.document.as_str().as_bytes())?;

        // 篩選後的課程段落
        let mut csv_writer = csv::Writer::from_writer(Vec::new());
        for section in &excerpt.sections {
            csv_writer.serialize(section)?;
        }
        let csv_data = csv_writer.into_inner().map_err(|e| e.into_error())?;
        zip.start_file::<_, ()>("sections.csv", FileOptions::default())?;
        zip.write_all(&csv_data)?;

        zip.start_file::<_, ()>("sections.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&excerpt.sections)?.as_bytes())?;

        let manifest = RunManifest {
            term_code: &excerpt.term_code,
            departments: &excerpt.departments,
            fetched_sections: excerpt.fetched_count,
            matched_sections: excerpt.sections.len(),
            document_blocks: excerpt.document.block_count(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        };
        zip.start_file::<_, ()>("manifest.json", FileOptions::default())?;
        zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for CatalogPipeline<S> {
    /// Fetches and parses every department concurrently, bounded by
    /// `timetable.concurrent_requests`. Output is grouped by department in
    /// the order given; a failed department contributes nothing.
    async fn extract(&self, departments: &[String]) -> Result<Vec<Section>> {
        let term_code = self.config.timetable.term_code.clone();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrent_requests().max(1)));
        let mut join_set = JoinSet::new();

        tracing::info!(
            "🌐 Fetching {} department(s) for term {}",
            departments.len(),
            term_code
        );

        for (index, department) in departments.iter().enumerate() {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&semaphore);
            let department = department.clone();
            let term_code = term_code.clone();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let rows = source.fetch_department(&department, &term_code).await;
                let sections = parse_sections(&rows);
                tracing::debug!("{}: {} section(s) parsed", department, sections.len());
                (index, sections)
            });
        }

        let mut per_department: Vec<(usize, Vec<Section>)> = Vec::with_capacity(departments.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => per_department.push(result),
                Err(e) => tracing::warn!("⚠️ Department task aborted: {}", e),
            }
        }
        per_department.sort_by_key(|(index, _)| *index);

        let sections: Vec<Section> = per_department
            .into_iter()
            .flat_map(|(_, sections)| sections)
            .collect();
        tracing::info!("📥 Extracted {} section(s)", sections.len());
        Ok(sections)
    }

    async fn transform(
        &self,
        sections: Vec<Section>,
        requested: &RequestedCourseSet,
    ) -> Result<CatalogExcerpt> {
        let fetched_count = sections.len();
        let matched = filter_sections(sections, &requested.all_codes());
        let document = build_document(&matched);

        tracing::info!(
            "🔄 Kept {} of {} section(s), {} catalog block(s)",
            matched.len(),
            fetched_count,
            document.block_count()
        );

        Ok(CatalogExcerpt {
            term_code: self.config.timetable.term_code.clone(),
            departments: requested.departments().into_iter().collect(),
            fetched_count,
            sections: matched,
            document,
        })
    }

    async fn load(&self, excerpt: &CatalogExcerpt) -> Result<Option<String>> {
        if !self.config.output.persist {
            tracing::debug!("Persistence disabled, skipping run archive");
            return Ok(None);
        }

        let archive_name = &self.config.output.archive_name;
        let zip_data = self.archive(excerpt)?;

        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        self.storage.write_file(archive_name, &zip_data).await?;

        let output_path = format!("{}/{}", self.config.output_path(), archive_name);
        tracing::info!("💾 Run archive saved to {}", output_path);
        Ok(Some(output_path))
    }
}
