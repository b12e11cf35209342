use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("navigation to {url} timed out after {timeout_secs}s")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("required content \"{selector}\" not found on {url}")]
    ContentNotFound { url: String, selector: String },

    #[error("no candidate records extracted from {url}")]
    ExtractionEmpty { url: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("scrape run cancelled")]
    Cancelled,
}

impl ScraperError {
    /// Short machine-readable label, used in run reports and log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ScraperError::NavigationTimeout { .. } => "navigation_timeout",
            ScraperError::ContentNotFound { .. } => "content_not_found",
            ScraperError::ExtractionEmpty { .. } => "extraction_empty",
            ScraperError::Navigation { .. } => "navigation",
            ScraperError::Browser(_) => "browser",
            ScraperError::InvalidSelector { .. } => "invalid_selector",
            ScraperError::Cancelled => "cancelled",
        }
    }
}
