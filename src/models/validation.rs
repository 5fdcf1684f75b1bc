//! Save-time field validation shared by all content inputs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::\d{1,5})?(?:[/?#]\S*)?$")
        .expect("url pattern is valid")
});

/// Reject a blank required field.
pub fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Reject a value longer than `max` characters.
pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters (got {})",
            field, max, len
        )));
    }
    Ok(())
}

/// Blank is allowed; anything else must look like an address.
pub fn optional_email(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Ok(());
    }
    max_len(field, value, 254)?;
    if !EMAIL_RE.is_match(value) {
        return Err(AppError::Validation(format!(
            "{} is not a valid email address",
            field
        )));
    }
    Ok(())
}

/// Blank is allowed; anything else must be an absolute http(s) URL.
pub fn optional_url(field: &str, value: &str) -> Result<(), AppError> {
    if value.is_empty() {
        return Ok(());
    }
    max_len(field, value, 200)?;
    if !URL_RE.is_match(value) {
        return Err(AppError::Validation(format!("{} is not a valid URL", field)));
    }
    Ok(())
}

pub fn url(field: &str, value: &str) -> Result<(), AppError> {
    required(field, value)?;
    optional_url(field, value)
}

/// Lowercase, ASCII, hyphen-separated slug.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c == '_' {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push('_');
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_and_max_len() {
        assert!(required("Name", "  ").is_err());
        assert!(required("Name", "Ada").is_ok());
        assert!(max_len("Intro", &"x".repeat(250), 250).is_ok());
        assert!(max_len("Intro", &"x".repeat(251), 250).is_err());
    }

    #[test]
    fn test_email() {
        assert!(optional_email("Email", "").is_ok());
        assert!(optional_email("Email", "john@example.com").is_ok());
        assert!(optional_email("Email", "john@").is_err());
        assert!(optional_email("Email", "not an email").is_err());
    }

    #[test]
    fn test_url() {
        assert!(optional_url("Url", "").is_ok());
        assert!(optional_url("Url", "https://github.com/jsmith").is_ok());
        assert!(optional_url("Url", "http://localhost:8000/about/").is_ok());
        assert!(optional_url("Url", "ftp://example.com").is_err());
        assert!(optional_url("Url", "example.com").is_err());
        assert!(url("Url", "").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Our Services"), "our-services");
        assert_eq!(slugify("  FAQ & Help!  "), "faq-help");
        assert_eq!(slugify("Café 2026"), "caf-2026");
        assert_eq!(slugify("snake_case title"), "snake_case-title");
    }
}
