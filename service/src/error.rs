//! Error types for the reporting service.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors surfaced by the HTTP layer.
///
/// The report pipeline itself never errors (degraded conditions are
/// embedded in the artifact); these cover invocation-level failures only.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The requested report type is not registered.
    #[error("Invalid report type '{0}'")]
    InvalidReportType(String),

    /// The knowledge store has no configured collaborators.
    #[error("Knowledge base not available")]
    KnowledgeUnavailable,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Server startup error.
    #[error("Server error: {0}")]
    Server(String),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error response body for HTTP endpoints.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code, available_types, suggestions) = match &self {
            Self::InvalidReportType(requested) => {
                tracing::warn!(requested, "Rejected unknown report type");
                (
                    StatusCode::BAD_REQUEST,
                    "INVALID_REPORT_TYPE",
                    Some(vec!["quality_control".to_string()]),
                    Some(vec![
                        "Use 'quality_control' for comprehensive quality reports".to_string(),
                        "Use 'quality' or 'qc' as shorthand for quality_control".to_string(),
                        "Use 'manufacturing_report' or 'pharma_report' for general reports"
                            .to_string(),
                    ]),
                )
            }
            Self::KnowledgeUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "KNOWLEDGE_UNAVAILABLE", None, None)
            }
            Self::Configuration(msg) => {
                tracing::error!(message = %msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR", None, None)
            }
            Self::Server(msg) => {
                tracing::error!(message = %msg, "Server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", None, None)
            }
            Self::Serialization(e) => {
                tracing::error!(error = %e, "Serialization error");
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR", None, None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            available_types,
            suggestions,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ServiceError::InvalidReportType("mystery".to_string());
        assert_eq!(err.to_string(), "Invalid report type 'mystery'");

        let err = ServiceError::Configuration("bad port".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad port");
    }

    #[test]
    fn test_error_response_serialization() {
        let resp = ErrorResponse {
            error: "test error".to_string(),
            code: "TEST_ERROR".to_string(),
            available_types: Some(vec!["quality_control".to_string()]),
            suggestions: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("TEST_ERROR"));
        assert!(json.contains("quality_control"));
        assert!(!json.contains("suggestions"));
    }
}
