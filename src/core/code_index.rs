//! Refreshes the allowed-course-code list from the live timetable.

use crate::core::parser::primary_course_codes;
use crate::domain::ports::CatalogSource;
use std::collections::BTreeSet;

/// Every distinct course code offered by `departments`, normalized and sorted.
///
/// Departments are fetched one after another; a department that fails to
/// load is simply missing from the result.
pub async fn refresh_code_index(
    source: &dyn CatalogSource,
    departments: &[String],
    term_code: &str,
) -> Vec<String> {
    let mut codes = BTreeSet::new();

    for department in departments {
        tracing::info!("Fetching courses for department: {}", department);
        let rows = source.fetch_department(department, term_code).await;
        let found = primary_course_codes(&rows);
        tracing::debug!("{}: {} primary row(s)", department, found.len());
        codes.extend(found);
    }

    codes.into_iter().collect()
}

/// The allowed-codes file format: codes joined by ", ".
pub fn render_code_list(codes: &[String]) -> String {
    codes.join(", ")
}
