use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// What kind of identifier a failed lookup was searching by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Ticker,
    Cik,
    Name,
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKind::Ticker => write!(f, "ticker"),
            LookupKind::Cik => write!(f, "CIK"),
            LookupKind::Name => write!(f, "name"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EdgarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Rate limit exceeded (HTTP 429) for {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Authentication failed (HTTP 401) for {url}")]
    Authentication { url: String },

    #[error("Resource not found (HTTP 404): {url}")]
    NotFound { url: String },

    #[error("Request to {url} failed with status {status}: {body}")]
    Request {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ownership form parse error{}: {message}", .position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    OwnershipParse {
        message: String,
        position: Option<u64>,
    },

    #[error("Unsupported form type '{form_type}'. Supported form types: {supported}")]
    UnsupportedFormType { form_type: String, supported: String },

    #[error("Company not found by {kind}: {key}")]
    CompanyNotFound { kind: LookupKind, key: String },

    #[error("Filing {accession} not found for CIK {cik}")]
    FilingNotFound { cik: String, accession: String },

    #[error("Concept {taxonomy}/{tag} not found for CIK {cik}")]
    ConceptNotFound {
        cik: u64,
        taxonomy: String,
        tag: String,
    },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
}

impl EdgarError {
    /// Whether the HTTP layer should try the request again.
    ///
    /// Transport failures, timeouts and 429s are always retried. Generic
    /// request errors are retried only for 5xx and 408.
    pub fn is_retryable(&self) -> bool {
        match self {
            EdgarError::Timeout { .. }
            | EdgarError::Network { .. }
            | EdgarError::RateLimited { .. } => true,
            EdgarError::Request { status, .. } => *status >= 500 || *status == 408,
            _ => false,
        }
    }

    /// HTTP status carried by this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            EdgarError::Authentication { .. } => Some(401),
            EdgarError::NotFound { .. } => Some(404),
            EdgarError::RateLimited { .. } => Some(429),
            EdgarError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, EdgarError>;
