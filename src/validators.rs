use std::fmt;
use url::Url;

pub const MAX_TEXT_LENGTH: usize = 10_000;

/// Input rejected before it reaches the scoring engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyUrl,
    InvalidUrl,
    EmptyText,
    TextTooLong,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyUrl => write!(f, "URL cannot be empty"),
            ValidationError::InvalidUrl => write!(f, "Invalid URL format"),
            ValidationError::EmptyText => write!(f, "Text cannot be empty"),
            ValidationError::TextTooLong => {
                write!(f, "Text too long (max {MAX_TEXT_LENGTH} characters)")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate and normalize a URL before scanning. A missing scheme defaults
/// to http://; the result must parse to something with a host.
pub fn validate_url(url: &str) -> Result<String, ValidationError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }

    let candidate = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };

    let parsed = Url::parse(&candidate).map_err(|_| ValidationError::InvalidUrl)?;
    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl);
    }

    Ok(candidate)
}

/// Validate text content before scanning: non-empty after trimming, at most
/// MAX_TEXT_LENGTH characters.
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyText);
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TextTooLong);
    }
    Ok(trimmed.to_string())
}
