// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps [`NilEasyError`] onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nileasy_core::NilEasyError;
use serde::Serialize;

/// JSON error body: `{error, code, details?}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A handler error rendered as JSON with a mapped status code.
#[derive(Debug)]
pub struct ApiError(pub NilEasyError);

impl From<NilEasyError> for ApiError {
    fn from(err: NilEasyError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            NilEasyError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            NilEasyError::NotFound { .. } => StatusCode::NOT_FOUND,
            NilEasyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            NilEasyError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            NilEasyError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let code = self.0.code();
        let (error, details) = match &self.0 {
            NilEasyError::Validation { message } | NilEasyError::RateLimited { message } => {
                (message.clone(), None)
            }
            NilEasyError::NotFound { .. } | NilEasyError::Unauthorized(_) => {
                (self.0.to_string(), None)
            }
            NilEasyError::ExternalService { service, kind, .. } => (
                format!("{service} is unavailable"),
                Some(kind.to_string()),
            ),
            _ => ("internal server error".to_string(), None),
        };
        ErrorResponse {
            error,
            code,
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nileasy_core::{ExternalErrorKind, ExternalService};

    #[test]
    fn status_mapping() {
        let cases = [
            (NilEasyError::validation("bad gstin"), 422),
            (NilEasyError::not_found("captcha session", "abc"), 404),
            (NilEasyError::Unauthorized("nope".into()), 401),
            (
                NilEasyError::external(
                    ExternalService::TaxPortal,
                    ExternalErrorKind::Unavailable,
                    "503",
                ),
                502,
            ),
            (
                NilEasyError::RateLimited {
                    message: "slow down".into(),
                },
                429,
            ),
            (NilEasyError::Internal("boom".into()), 500),
            (
                NilEasyError::Conflict {
                    resource: "user".into(),
                    id: "x".into(),
                },
                500,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status().as_u16(), status);
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let body = ApiError(NilEasyError::Internal("db path /var/x".into())).body();
        assert_eq!(body.error, "internal server error");
        assert_eq!(body.code, "INTERNAL_ERROR");
        assert!(body.details.is_none());
    }

    #[test]
    fn external_errors_carry_kind() {
        let body = ApiError(NilEasyError::external(
            ExternalService::TaxPortal,
            ExternalErrorKind::Unavailable,
            "connect refused",
        ))
        .body();
        assert_eq!(body.code, "EXTERNAL_SERVICE_ERROR");
        assert_eq!(body.details.as_deref(), Some("unavailable"));
        assert!(!body.error.contains("refused"));
    }
}
