//! Relevance filter: keep only the sections that were asked for.

use crate::core::normalize::normalize;
use crate::domain::model::{normalized_set, Section};

/// Retains sections whose normalized course code is among `requested_codes`,
/// in their original order. Empty `requested_codes` keeps nothing.
pub fn filter_sections(sections: Vec<Section>, requested_codes: &[String]) -> Vec<Section> {
    let wanted = normalized_set(requested_codes);
    if wanted.is_empty() {
        return Vec::new();
    }

    sections
        .into_iter()
        .filter(|section| wanted.contains(&normalize(&section.course_code)))
        .collect()
}
