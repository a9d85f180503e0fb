//! Error types shared by the report pipeline and the HTTP layer.

use thiserror::Error;

/// Result alias using `ReportError`.
pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Malformed date input.
    #[error("Invalid date '{input}': expected YYYY-MM-DD")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Any other malformed request parameter.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Token acquisition against the bookkeeping service failed.
    #[error("Authentication with the bookkeeping service failed: {0}")]
    Authentication(String),

    /// A referenced document does not exist upstream.
    #[error("Document {0} not found")]
    NotFound(String),

    /// Upstream list or lookup call failed.
    #[error("Bookkeeping service error: {0}")]
    Source(String),

    /// Upstream answered with a body of an unexpected shape.
    #[error("Unexpected response from the bookkeeping service: {0}")]
    Decode(String),

    /// Missing or wrong access code.
    #[error("Access denied")]
    Unauthorized,

    /// PDF merge or archive failure.
    #[error("Packaging failed: {0}")]
    Package(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl ReportError {
    /// HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Parse { .. } | Self::InvalidInput(_) => 400,
            Self::Unauthorized => 401,
            Self::NotFound(_) => 404,
            Self::Authentication(_) | Self::Source(_) | Self::Decode(_) => 502,
            Self::Package(_) | Self::Config(_) => 500,
        }
    }

    /// Stable error code for API responses.
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Authentication(_) => "AUTHENTICATION_ERROR",
            Self::Source(_) => "SOURCE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Package(_) => "PACKAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl From<lopdf::Error> for ReportError {
    fn from(e: lopdf::Error) -> Self {
        ReportError::Package(e.to_string())
    }
}

impl From<zip::result::ZipError> for ReportError {
    fn from(e: zip::result::ZipError) -> Self {
        ReportError::Package(e.to_string())
    }
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        ReportError::Package(e.to_string())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Package(e.to_string())
    }
}
