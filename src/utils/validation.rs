use crate::core::normalize::{department_of, normalize};
use crate::utils::error::{PlannerError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl Into<String>, reason: impl Into<String>) -> PlannerError {
    PlannerError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.into(),
        reason: reason.into(),
    }
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(invalid(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(invalid(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }

    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(invalid(
            field_name,
            value.to_string(),
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

/// A usable course code normalizes to a department prefix followed by something else.
pub fn validate_course_codes(field_name: &str, codes: &[String]) -> Result<()> {
    for code in codes {
        let normalized = normalize(code);
        match department_of(&normalized) {
            Some(dept) if dept.len() < normalized.len() => {}
            _ => {
                return Err(invalid(
                    field_name,
                    code.clone(),
                    "Course code must start with a department prefix followed by a number",
                ))
            }
        }
    }
    Ok(())
}

/// Term codes are six digits, year then term (e.g. 202510).
pub fn validate_term_code(field_name: &str, term_code: &str) -> Result<()> {
    if term_code.len() != 6 || !term_code.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(
            field_name,
            term_code,
            "Term code must be six digits, e.g. 202510",
        ));
    }
    Ok(())
}
