//! Course-code canonicalization.

/// Trims, strips all internal whitespace and uppercases: `" comp 1405 "` → `"COMP1405"`.
///
/// Idempotent and total.
pub fn normalize(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Leading alphabetic prefix of the normalized code (the subject / department).
pub fn department_of(code: &str) -> Option<String> {
    let dept: String = normalize(code)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if dept.is_empty() {
        None
    } else {
        Some(dept)
    }
}
