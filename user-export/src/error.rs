use thiserror::Error;

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Rate limited on {endpoint} page {page}: gave up after {attempts} retries")]
    RateLimitExceeded {
        endpoint: String,
        page: u32,
        attempts: u32,
        retry_after_seconds: u64
    },

    #[error("Fetching {endpoint} page {page} failed: {status} - {message}")]
    FetchError {
        endpoint: String,
        page: u32,
        status: u16,
        message: String
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to write export: {0}")]
    WriteError(String)
}

impl ExportError {
    /// Transport failures and 5xx answers are transient and retried with
    /// backoff. Everything else fails the page request at once.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) => true,
            Self::FetchError { status, .. } => *status >= 500,
            _ => false
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        Self::WriteError(e.to_string())
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        Self::WriteError(format!("CSV write error: {}", e))
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::WriteError(format!("XLSX write error: {}", e))
    }
}
