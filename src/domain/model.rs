use crate::core::normalize::{department_of, normalize};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// One scheduled offering of a course, as listed in the timetable.
///
/// Built by the section parser from a primary row plus its continuation rows,
/// or deserialized from a collaborator's Section-shaped record. Both paths
/// apply the same lenient rules: `credits` is never negative or non-numeric
/// and `also_register_in` is never `Some("")`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Section {
    pub status: String,
    #[serde(deserialize_with = "text_or_number")]
    pub crn: String,
    pub course_code: String,
    pub section: String,
    #[serde(rename = "course_title")]
    pub title: String,
    #[serde(deserialize_with = "lenient_credits")]
    pub credits: f64,
    pub schedule_type: String,
    pub instructor: String,
    /// Raw day token, e.g. "MWF". Never split or validated here.
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(deserialize_with = "non_empty_text")]
    pub also_register_in: Option<String>,
}

/// Leading-number credit parsing: "0.5" and "0.5 cr" give 0.5, anything else 0.0.
pub fn parse_credits(text: &str) -> f64 {
    let trimmed = text.trim();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (idx, ch) in trimmed.char_indices() {
        match ch {
            '+' | '-' if idx == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = idx + ch.len_utf8();
    }
    if !seen_digit {
        return 0.0;
    }
    match trimmed[..end].parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_credits<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n
            .as_f64()
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0),
        serde_json::Value::String(s) => parse_credits(&s),
        _ => 0.0,
    })
}

fn non_empty_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseCode {
    pub course_code: String,
}

impl CourseCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            course_code: code.into(),
        }
    }
}

/// Mandatory/elective codes and the optional scheduling preference for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestedCourseSet {
    pub mandatory: Vec<String>,
    pub electives: Vec<String>,
    pub special_request: Option<String>,
}

impl RequestedCourseSet {
    /// Mandatory codes followed by electives, as returned (not deduplicated).
    pub fn all_codes(&self) -> Vec<String> {
        self.mandatory
            .iter()
            .chain(self.electives.iter())
            .cloned()
            .collect()
    }

    /// Sorted set of department prefixes across all requested codes.
    pub fn departments(&self) -> BTreeSet<String> {
        self.mandatory
            .iter()
            .chain(self.electives.iter())
            .filter_map(|code| department_of(code))
            .collect()
    }

    pub fn echo(&self) -> RequestedCourses {
        RequestedCourses {
            mandatory: self.mandatory.iter().map(CourseCode::new).collect(),
            electives: self.electives.iter().map(CourseCode::new).collect(),
        }
    }
}

/// Extraction collaborator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub status: String,
    #[serde(default)]
    pub requested_input: String,
    #[serde(default, deserialize_with = "non_empty_text")]
    pub special_request: Option<String>,
    #[serde(default)]
    pub mandatory: Vec<CourseCode>,
    #[serde(default)]
    pub electives: Vec<CourseCode>,
}

impl ExtractionResponse {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }

    /// Drops codes outside `allowed` (compared normalized) and returns the
    /// allowed list's spelling of each kept code.
    pub fn into_requested(self, allowed: &[String]) -> RequestedCourseSet {
        let allowed: Vec<(String, &String)> =
            allowed.iter().map(|code| (normalize(code), code)).collect();
        let keep = |codes: Vec<CourseCode>| -> Vec<String> {
            codes
                .into_iter()
                .filter_map(|c| {
                    let wanted = normalize(&c.course_code);
                    allowed
                        .iter()
                        .find(|(normalized, _)| *normalized == wanted)
                        .map(|(_, original)| (*original).clone())
                })
                .collect()
        };

        RequestedCourseSet {
            mandatory: keep(self.mandatory),
            electives: keep(self.electives),
            special_request: self.special_request,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestedCourses {
    #[serde(default)]
    pub mandatory: Vec<CourseCode>,
    #[serde(default)]
    pub electives: Vec<CourseCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub schedule_id: u32,
    #[serde(default)]
    pub courses: Vec<Section>,
}

/// Synthesis collaborator output, and the planner's final success shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub requested_courses: RequestedCourses,
    #[serde(default)]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

impl ScheduleResponse {
    /// The synthesis-failure result: no schedules, the request echoed back.
    pub fn failed(requested: &RequestedCourseSet) -> Self {
        Self {
            status: "error".to_string(),
            requested_courses: requested.echo(),
            special_requests: requested.special_request.clone(),
            schedules: Vec::new(),
        }
    }

    /// Overwrites status and the echoed request with what was actually asked.
    pub fn with_echo(self, requested: &RequestedCourseSet) -> Self {
        Self {
            status: "success".to_string(),
            requested_courses: requested.echo(),
            special_requests: requested.special_request.clone(),
            schedules: self.schedules,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Rendered catalog text fed to the synthesis collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocument {
    text: String,
    block_count: usize,
}

impl CatalogDocument {
    pub(crate) fn new(text: String, block_count: usize) -> Self {
        Self { text, block_count }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of rendered Section blocks.
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CatalogDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Filtered sections plus their rendering; the transform step's output.
#[derive(Debug, Clone)]
pub struct CatalogExcerpt {
    pub term_code: String,
    pub departments: Vec<String>,
    pub fetched_count: usize,
    pub sections: Vec<Section>,
    pub document: CatalogDocument,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationLimits {
    pub max_credits: f64,
    pub min_schedules: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_credits: 2.5,
            min_schedules: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub document: String,
    pub mandatory: Vec<String>,
    pub electives: Vec<String>,
    pub special_request: Option<String>,
    pub limits: GenerationLimits,
}

#[derive(Debug, Clone)]
pub struct AudioInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl AudioInput {
    pub async fn from_path(path: &str) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        Ok(Self { file_name, bytes })
    }
}

/// Entry-point input. Non-blank raw text takes precedence over audio.
#[derive(Debug, Clone, Default)]
pub struct PlannerInput {
    pub raw_text: Option<String>,
    pub audio: Option<AudioInput>,
}

impl PlannerInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(text.into()),
            audio: None,
        }
    }

    pub fn audio(audio: AudioInput) -> Self {
        Self {
            raw_text: None,
            audio: Some(audio),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerFailure {
    pub error: String,
    pub details: String,
}

/// Final JSON-shaped result of a planner run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlannerOutcome {
    Schedules(ScheduleResponse),
    Failure(PlannerFailure),
}

impl PlannerOutcome {
    pub fn failure(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Failure(PlannerFailure {
            error: error.into(),
            details: details.into(),
        })
    }
}

/// Lookup set used by the relevance filter.
pub(crate) fn normalized_set(codes: &[String]) -> HashSet<String> {
    codes.iter().map(|code| normalize(code)).collect()
}
