//! Catalog document rendering.
//!
//! The output is pasted verbatim into the synthesis prompt, so it must be a
//! pure function of the section slice: no timestamps, no map iteration order.

use crate::domain::model::{CatalogDocument, Section};
use std::fmt::Write;

pub const DOCUMENT_HEADING: &str = "# Course List";

fn render_block(out: &mut String, section: &Section) {
    // String 的 fmt::Write 不會失敗
    let _ = write!(
        out,
        "## {} (Section {})\n\n\
         - **CRN**: {}\n\
         - **Title**: {}\n\
         - **Status**: {}\n\
         - **Credits**: {}\n\
         - **Schedule Type**: {}\n\
         - **Instructor**: {}\n\
         - **Days**: {}\n\
         - **Time**: {} - {}\n",
        section.course_code,
        section.section,
        section.crn,
        section.title,
        section.status,
        section.credits,
        section.schedule_type,
        section.instructor,
        section.day,
        section.start_time,
        section.end_time,
    );
    if let Some(also) = &section.also_register_in {
        let _ = writeln!(out, "- **Also Register in**: {}", also);
    }
    out.push_str("\n---\n\n");
}

pub fn build_document(sections: &[Section]) -> CatalogDocument {
    let mut text = format!("{}\n\n", DOCUMENT_HEADING);
    for section in sections {
        render_block(&mut text, section);
    }
    CatalogDocument::new(text, sections.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Section {
        Section {
            status: "Open".to_string(),
            crn: "31245".to_string(),
            course_code: "COMP 1405".to_string(),
            section: "A".to_string(),
            title: "Intro to Computer Science I".to_string(),
            credits: 0.5,
            schedule_type: "Lecture".to_string(),
            instructor: "Jane Smith".to_string(),
            day: "MWF".to_string(),
            start_time: "10:00".to_string(),
            end_time: "11:00".to_string(),
            also_register_in: None,
        }
    }

    #[test]
    fn test_block_layout() {
        let document = build_document(&[sample()]);
        let expected = "# Course List\n\n\
                        ## COMP 1405 (Section A)\n\n\
                        - **CRN**: 31245\n\
                        - **Title**: Intro to Computer Science I\n\
                        - **Status**: Open\n\
                        - **Credits**: 0.5\n\
                        - **Schedule Type**: Lecture\n\
                        - **Instructor**: Jane Smith\n\
                        - **Days**: MWF\n\
                        - **Time**: 10:00 - 11:00\n\
                        \n---\n\n";
        assert_eq!(document.as_str(), expected);
        assert_eq!(document.block_count(), 1);
    }

    #[test]
    fn test_also_register_line_only_when_present() {
        let mut with_note = sample();
        with_note.also_register_in = Some("COMP 1405 A1".to_string());

        let without = build_document(&[sample()]);
        let with = build_document(&[with_note]);
        assert!(!without.as_str().contains("Also Register in"));
        assert!(with
            .as_str()
            .contains("- **Time**: 10:00 - 11:00\n- **Also Register in**: COMP 1405 A1\n\n---"));
    }

    #[test]
    fn test_whole_credits_render_without_fraction() {
        let mut full = sample();
        full.credits = 1.0;
        assert!(build_document(&[full]).as_str().contains("- **Credits**: 1\n"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let sections = vec![sample(), Section::default(), sample()];
        let first = build_document(&sections);
        let second = build_document(&sections);
        assert_eq!(first, second);
        assert_eq!(first.block_count(), 3);
    }

    #[test]
    fn test_empty_document_is_heading_only() {
        assert_eq!(build_document(&[]).as_str(), "# Course List\n\n");
    }
}
