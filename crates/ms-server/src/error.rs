//! Error-to-HTTP response conversion.
//!
//! Failures are rendered in the same envelope as successes:
//! `{"is_success": false, "data": {}, "errors": [{"code", "msg"}], "request_id"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use ms_core::IngestError;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: ms_core::Error,
    request_id: Option<String>,
}

impl AppError {
    pub fn new(inner: ms_core::Error) -> Self {
        Self {
            inner,
            request_id: None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ms_core::Error::Validation(msg.into()))
    }

    pub fn with_request_id(mut self, id: String) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Message returned to the caller; tool output and paths stay in the logs.
    fn public_message(&self) -> String {
        match &self.inner {
            ms_core::Error::Validation(msg) => msg.clone(),
            ms_core::Error::Ingest(e) => e.public_message(),
            ms_core::Error::Tool { tool, .. } => format!("{tool} is unavailable"),
            ms_core::Error::Io { .. } | ms_core::Error::Internal(_) => {
                "internal server error".into()
            }
        }
    }
}

impl From<ms_core::Error> for AppError {
    fn from(e: ms_core::Error) -> Self {
        Self::new(e)
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        Self::new(e.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.inner,
                "Server error in API handler"
            );
        } else {
            tracing::warn!(status = %status, error = %self.inner, "Request rejected");
        }

        let body = json!({
            "is_success": false,
            "data": {},
            "errors": [{
                "code": self.inner.code(),
                "msg": self.public_message(),
            }],
            "request_id": self.request_id,
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ms_core::{PlanError, ProbeError, SegmentError};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn probe_failure_is_422_without_tool_output() {
        let err = AppError::from(IngestError::Probe(ProbeError::Tool(
            "ffprobe: /srv/media/x_input.mp4: moov atom not found".into(),
        )))
        .with_request_id("req-1".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["is_success"], false);
        assert_eq!(body["data"], json!({}));
        assert_eq!(body["errors"][0]["code"], "PROBE_ERROR");
        assert_eq!(body["request_id"], "req-1");
        assert!(!body["errors"][0]["msg"]
            .as_str()
            .unwrap()
            .contains("moov"));
    }

    #[tokio::test]
    async fn plan_failure_is_400() {
        let response = AppError::from(IngestError::Plan(PlanError::NonPositiveTarget(0)))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["code"], "PLAN_ERROR");
        assert!(body["request_id"].is_null());
    }

    #[tokio::test]
    async fn segment_failure_is_502() {
        let response =
            AppError::from(IngestError::Segment(SegmentError::Tool("boom".into()))).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn validation_message_is_passed_through() {
        let response = AppError::validation("missing multipart field 'file'").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["msg"], "missing multipart field 'file'");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden() {
        let response =
            AppError::new(ms_core::Error::Internal("secret path /etc".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["msg"], "internal server error");
    }
}
