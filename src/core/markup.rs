//! Timetable markup → raw rows.
//!
//! The search results page lays every section out as a run of `<tr>` rows
//! painted with one of two background colours. Only those rows matter; the
//! rest of the page (navigation, legend, footers) is ignored.

use crate::utils::error::{PlannerError, Result};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Background colours marking section rows in the results table.
pub const ROW_MARKERS: [&str; 2] = ["#C0C0C0", "#DCDCDC"];

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr[bgcolor]").expect("static row selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static cell selector"));
static SUBJECT_OPTION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("select[name='sel_subj'] option").expect("static option selector")
});
static SUBJECT_SELECT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("select[name='sel_subj']").expect("static select selector"));

/// One marked table row: trimmed cell texts plus the row's full text content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRow {
    pub cells: Vec<String>,
    pub text: String,
}

impl RawRow {
    pub fn new(cells: Vec<String>, text: impl Into<String>) -> Self {
        Self {
            cells,
            text: text.into(),
        }
    }

    /// A row that is only text, as continuation rows usually are.
    pub fn text_only(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            cells: vec![String::new(), text.clone()],
            text,
        }
    }

    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map(String::as_str).unwrap_or("")
    }

    /// Row text with whitespace runs collapsed to single spaces, trimmed.
    pub fn collapsed_text(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn is_marked(row: &ElementRef<'_>) -> bool {
    row.value()
        .attr("bgcolor")
        .map(|color| {
            ROW_MARKERS
                .iter()
                .any(|marker| marker.eq_ignore_ascii_case(color.trim()))
        })
        .unwrap_or(false)
}

fn text_of(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Marked rows in document order. Never fails; unrecognized markup yields no rows.
pub fn extract_rows(html: &str) -> Vec<RawRow> {
    let document = Html::parse_document(html);

    document
        .select(&ROW_SELECTOR)
        .filter(is_marked)
        .map(|row| {
            let cells = row
                .select(&CELL_SELECTOR)
                .map(|cell| text_of(&cell).trim().to_string())
                .collect();
            RawRow {
                cells,
                text: text_of(&row),
            }
        })
        .collect()
}

/// Department codes offered by the search form's subject dropdown.
///
/// Blank option values ("All Subjects") are skipped. A page without the
/// dropdown is an error: the caller asked for a subject list and got
/// something else.
pub fn subject_codes(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    if document.select(&SUBJECT_SELECT_SELECTOR).next().is_none() {
        return Err(PlannerError::ParseError {
            message: "Unable to locate the 'sel_subj' dropdown in provided HTML".to_string(),
        });
    }

    Ok(document
        .select(&SUBJECT_OPTION_SELECTOR)
        .filter_map(|option| option.value().attr("value"))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
<html><body>
<table>
  <tr><td>Legend</td></tr>
  <tr bgcolor="#C0C0C0">
    <td></td><td>Open</td><td>31245</td><td>COMP 1405</td><td>A</td>
    <td>Intro to Computer Science I</td><td>0.5</td><td>Lecture</td>
    <td></td><td></td><td>Jane   Smith</td>
  </tr>
  <tr bgcolor="#C0C0C0">
    <td></td><td>Meeting Date: Sep 04, 2024 to Dec 06, 2024
      Days: Tue Thu  Time: 10:05 - 11:25</td>
  </tr>
  <tr bgcolor="#ffffff"><td>ignored</td></tr>
  <tr bgcolor="#dcdcdc"><td></td><td>Section Information: lecture</td></tr>
</table>
</body></html>"##;

    #[test]
    fn test_extract_rows_keeps_only_marked_rows() {
        let rows = extract_rows(PAGE);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cells.len(), 11);
        assert_eq!(rows[0].cell(3), "COMP 1405");
        assert_eq!(rows[0].cell(10), "Jane   Smith");
        assert_eq!(rows[0].cell(42), "");
    }

    #[test]
    fn test_collapsed_text() {
        let rows = extract_rows(PAGE);
        assert_eq!(
            rows[1].collapsed_text(),
            "Meeting Date: Sep 04, 2024 to Dec 06, 2024 Days: Tue Thu Time: 10:05 - 11:25"
        );
    }

    #[test]
    fn test_extract_rows_from_garbage() {
        assert!(extract_rows("not html at all <<<").is_empty());
        assert!(extract_rows("").is_empty());
    }

    #[test]
    fn test_subject_codes() {
        let html = r#"<select name="sel_subj" id="subj_id" multiple="">
<option value="" selected="">All Subjects</option>
<option value="AERO">Aerospace Engineering (AERO)</option>
<option value=" COMP ">Computer Science (COMP)</option>
</select>"#;
        assert_eq!(subject_codes(html).unwrap(), vec!["AERO", "COMP"]);
        assert!(subject_codes("<p>no form</p>").is_err());
    }
}
