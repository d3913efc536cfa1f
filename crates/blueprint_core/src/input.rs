use thiserror::Error;
use url::Url;

/// Rejections raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{0}")]
    Missing(&'static str),
    #[error("Please enter a valid URL")]
    InvalidUrl,
}

/// Validates a hackathon page URL.
pub fn validate_hackathon_url(raw: &str) -> Result<String, InputError> {
    let url = parse_web_url(raw, "Please enter a hackathon URL")?;
    Ok(url.to_string())
}

/// Validates a Devpost project URL and strips its query string and fragment.
pub fn clean_devpost_url(raw: &str) -> Result<String, InputError> {
    let mut url = parse_web_url(raw, "Please enter a Devpost URL")?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

fn parse_web_url(raw: &str, missing: &'static str) -> Result<Url, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::Missing(missing));
    }
    let url = Url::parse(trimmed).map_err(|_| InputError::InvalidUrl)?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(InputError::InvalidUrl),
    }
}
