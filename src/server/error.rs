//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::AnalyticsError;

#[derive(Error, Debug)]
pub enum ServerError {
    /// A library operation failed; `context` names what the endpoint was doing
    #[error("{context}: {source}")]
    Analytics {
        context: &'static str,
        #[source]
        source: AnalyticsError,
    },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl ServerError {
    pub fn analytics(context: &'static str) -> impl FnOnce(AnalyticsError) -> Self {
        move |source| ServerError::Analytics { context, source }
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Task(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match &self {
            ServerError::Analytics { source, .. } => {
                tracing::error!(detail = %source, "Request failed");
            }
            ServerError::Task(detail) => {
                tracing::error!(detail = %detail, "Blocking task panicked or was cancelled");
            }
        }

        let body = Json(json!({
            "status": "error",
            "message": message,
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_includes_context() {
        let err = ServerError::analytics("Model training failed")(AnalyticsError::DataUnavailable(
            "no warehouse and no CSV".into(),
        ));
        assert_eq!(
            err.to_string(),
            "Model training failed: Data unavailable: no warehouse and no CSV"
        );
    }

    #[test]
    fn test_status_is_internal_error() {
        let response = ServerError::Task("boom".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
