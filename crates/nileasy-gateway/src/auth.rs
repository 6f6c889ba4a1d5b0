// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bearer-token middleware for the `/api/v1` routes.
//!
//! When no token is configured the API is open. The chat webhook and the
//! OTP page never go through this middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use nileasy_core::NilEasyError;

use crate::error::ApiError;

/// Authentication configuration for the filing API.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Expected bearer token. `None` leaves the API open.
    pub api_token: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Rejects requests without `Authorization: Bearer <api_token>`.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = auth.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::debug!(path = %request.uri().path(), "api token mismatch");
            Err(NilEasyError::Unauthorized("invalid API token".into()).into())
        }
        None => Err(NilEasyError::Unauthorized("missing bearer token".into()).into()),
    }
}
