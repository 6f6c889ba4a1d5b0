// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use nileasy_core::NilEasyError;
use nileasy_flow::{Dispatcher, FilingApi, FlowContext};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// State for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }
}

/// Twilio signature check for `POST /webhook`.
#[derive(Clone, Default)]
pub struct WebhookAuth {
    /// Twilio auth token. `None` skips the check.
    pub twilio_auth_token: Option<String>,
    /// The webhook URL exactly as configured in Twilio; it is part of the
    /// signed payload.
    pub webhook_url: String,
}

impl std::fmt::Debug for WebhookAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookAuth")
            .field(
                "twilio_auth_token",
                &self.twilio_auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("webhook_url", &self.webhook_url)
            .finish()
    }
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Runs chat turns and delivers the replies.
    pub dispatcher: Arc<Dispatcher>,
    /// Backs the stateless `/api/v1` endpoints.
    pub api: Arc<FilingApi>,
    pub webhook: WebhookAuth,
    pub auth: AuthConfig,
    pub health: HealthState,
}

impl GatewayState {
    pub fn context(&self) -> &FlowContext {
        self.dispatcher.context()
    }
}

/// Address the gateway binds to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router with every gateway route.
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/webhook", post(handlers::post_webhook))
        .route("/otp-callback", get(handlers::get_otp_callback))
        .route("/api/v1/captcha/{id}", get(handlers::get_captcha_image))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/v1/validate-gstin", post(handlers::post_validate_gstin))
        .route("/api/v1/verify-captcha", post(handlers::post_verify_captcha))
        .route(
            "/api/v1/generate-sms-link",
            post(handlers::post_generate_sms_link),
        )
        .route(
            "/api/v1/track-completion",
            post(handlers::post_track_completion),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
}

/// Serves the gateway until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), NilEasyError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| NilEasyError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| NilEasyError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_auth_debug_redacts_token() {
        let auth = WebhookAuth {
            twilio_auth_token: Some("twilio-secret".into()),
            webhook_url: "https://bot.example.in/webhook".into(),
        };
        let debug = format!("{auth:?}");
        assert!(!debug.contains("twilio-secret"));
        assert!(debug.contains("https://bot.example.in/webhook"));
    }
}
