//! Section parser: groups marked timetable rows into [`Section`] records.
//!
//! A section is listed as one primary row (11+ cells) followed by zero or
//! more continuation rows carrying the meeting time and cross-registration
//! notes. The scan is an explicit two-state machine over the row slice:
//!
//! | state          | row                               | action                      | advance | next          |
//! |----------------|-----------------------------------|-----------------------------|---------|---------------|
//! | `SeekPrimary`  | fewer than 11 cells               | skip                        | 1       | `SeekPrimary` |
//! | `SeekPrimary`  | 11+ cells                         | open a draft                | 1       | `Continuation`|
//! | `Continuation` | end of input                      | finalize                    | 0       | done          |
//! | `Continuation` | contains `meeting date:`          | merge days / times          | 1       | `Continuation`|
//! | `Continuation` | contains `also register in:`      | set cross-registration      | 1       | `Continuation`|
//! | `Continuation` | contains `section information:`   | finalize                    | 1       | `SeekPrimary` |
//! | `Continuation` | anything else                     | finalize, leave row         | 0       | `SeekPrimary` |
//!
//! Matching is case-insensitive on whitespace-collapsed row text, in the
//! order listed. A row left in place by the last rule is looked at exactly
//! once more, as a primary candidate.

use crate::core::markup::{extract_rows, RawRow};
use crate::core::normalize::normalize;
use crate::domain::model::{parse_credits, Section};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum cell count of a primary row.
pub const PRIMARY_MIN_CELLS: usize = 11;

const MEETING_MARKER: &str = "meeting date:";
const ALSO_REGISTER_MARKER: &str = "also register in:";
const SECTION_INFO_MARKER: &str = "section information:";

static DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Days:\s*(.+?)\s*Time:").expect("static days regex"));
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Time:\s*(\d{1,2}:\d{2})\s*-\s*(\d{1,2}:\d{2})").expect("static time regex")
});
static ALSO_REGISTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)also register in:").expect("static marker regex"));

/// Primary-row fields plus whatever continuation rows have contributed so far.
#[derive(Debug, Clone, Default)]
struct SectionDraft {
    status: String,
    crn: String,
    course_code: String,
    section: String,
    title: String,
    credits: f64,
    schedule_type: String,
    instructor: String,
    day: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    also_register_in: Option<String>,
}

impl SectionDraft {
    fn from_primary(row: &RawRow) -> Self {
        Self {
            status: row.cell(1).to_string(),
            crn: row.cell(2).to_string(),
            course_code: row.cell(3).to_string(),
            section: row.cell(4).to_string(),
            title: row.cell(5).to_string(),
            credits: parse_credits(row.cell(6)),
            schedule_type: row.cell(7).to_string(),
            instructor: row.cell(10).to_string(),
            ..Self::default()
        }
    }

    fn merge_meeting(&mut self, text: &str) {
        if let Some(day) = DAYS_RE
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|day| !day.is_empty())
        {
            self.day = Some(day.to_string());
        }
        if let Some(caps) = TIME_RE.captures(text) {
            self.start_time = Some(caps[1].to_string());
            self.end_time = Some(caps[2].to_string());
        }
    }

    fn merge_also_register(&mut self, text: &str) {
        let note = ALSO_REGISTER_RE
            .splitn(text, 3)
            .nth(1)
            .map(str::trim)
            .unwrap_or("");
        if !note.is_empty() {
            self.also_register_in = Some(note.to_string());
        }
    }

    fn finalize(self) -> Section {
        Section {
            status: self.status,
            crn: self.crn,
            course_code: self.course_code,
            section: self.section,
            title: self.title,
            credits: self.credits,
            schedule_type: self.schedule_type,
            instructor: self.instructor,
            day: self.day.unwrap_or_default(),
            start_time: self.start_time.unwrap_or_default(),
            end_time: self.end_time.unwrap_or_default(),
            also_register_in: self.also_register_in,
        }
    }
}

enum ScanState {
    SeekPrimary,
    Continuation(SectionDraft),
}

/// What a continuation row means for the open draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowClass {
    Meeting,
    AlsoRegister,
    SectionInfo,
    Unrelated,
}

fn classify(text: &str) -> RowClass {
    let lowered = text.to_lowercase();
    if lowered.contains(MEETING_MARKER) {
        RowClass::Meeting
    } else if lowered.contains(ALSO_REGISTER_MARKER) {
        RowClass::AlsoRegister
    } else if lowered.contains(SECTION_INFO_MARKER) {
        RowClass::SectionInfo
    } else {
        RowClass::Unrelated
    }
}

/// Groups marked rows into sections, in first-primary-row order. Never fails:
/// short or stray rows are skipped.
pub fn parse_sections(rows: &[RawRow]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut state = ScanState::SeekPrimary;
    let mut index = 0;

    loop {
        state = match state {
            ScanState::SeekPrimary => {
                let Some(row) = rows.get(index) else { break };
                index += 1;
                if row.cells.len() < PRIMARY_MIN_CELLS {
                    ScanState::SeekPrimary
                } else {
                    ScanState::Continuation(SectionDraft::from_primary(row))
                }
            }
            ScanState::Continuation(mut draft) => {
                let Some(row) = rows.get(index) else {
                    sections.push(draft.finalize());
                    break;
                };
                let text = row.collapsed_text();
                match classify(&text) {
                    RowClass::Meeting => {
                        draft.merge_meeting(&text);
                        index += 1;
                        ScanState::Continuation(draft)
                    }
                    RowClass::AlsoRegister => {
                        draft.merge_also_register(&text);
                        index += 1;
                        ScanState::Continuation(draft)
                    }
                    RowClass::SectionInfo => {
                        index += 1;
                        sections.push(draft.finalize());
                        ScanState::SeekPrimary
                    }
                    RowClass::Unrelated => {
                        sections.push(draft.finalize());
                        ScanState::SeekPrimary
                    }
                }
            }
        };
    }

    sections
}

/// Markup straight to sections.
pub fn parse_html(html: &str) -> Vec<Section> {
    parse_sections(&extract_rows(html))
}

/// Normalized course codes of every primary row, in row order (duplicates kept).
pub fn primary_course_codes(rows: &[RawRow]) -> Vec<String> {
    rows.iter()
        .filter(|row| row.cells.len() >= PRIMARY_MIN_CELLS)
        .map(|row| normalize(row.cell(3)))
        .filter(|code| !code.is_empty())
        .collect()
}
