// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for NilEasy.

use nileasy_gst::GstError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// External collaborators NilEasy talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExternalService {
    TaxPortal,
    LinkShortener,
    MessagingGateway,
}

/// Why an external call failed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExternalErrorKind {
    /// The captcha text was wrong. A fresh captcha allows another try.
    BadCaptcha,
    /// The portal has no taxpayer with this GSTIN.
    GstinNotFound,
    /// The portal session or captcha session is gone; restart from captcha fetch.
    SessionExpired,
    /// Network error, timeout or 5xx.
    Unavailable,
    /// The service answered with something we could not interpret.
    InvalidResponse,
}

/// The primary error type used across all NilEasy crates.
#[derive(Debug, Error)]
pub enum NilEasyError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// User input failed validation. The user is re-prompted.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Messaging channel errors (delivery failure, bad credentials).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An external service failed.
    #[error("{service} error ({kind}): {message}")]
    ExternalService {
        service: ExternalService,
        kind: ExternalErrorKind,
        message: String,
    },

    /// A session, user or other resource does not exist (or has expired).
    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    /// An optimistic-concurrency check failed: someone else saved first.
    #[error("concurrent update to {resource} {id}")]
    Conflict { resource: String, id: String },

    /// Too many attempts inside the rate-limit window.
    #[error("rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Missing or wrong credentials on an inbound request.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Adapter health check failed.
    #[error("health check failed for {name}: {source}")]
    HealthCheckFailed {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NilEasyError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        NilEasyError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for an external service error.
    pub fn external(
        service: ExternalService,
        kind: ExternalErrorKind,
        message: impl Into<String>,
    ) -> Self {
        NilEasyError::ExternalService {
            service,
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a missing resource.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        NilEasyError::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            NilEasyError::Validation { .. } => "VALIDATION_ERROR",
            NilEasyError::ExternalService { .. } | NilEasyError::Channel { .. } => {
                "EXTERNAL_SERVICE_ERROR"
            }
            NilEasyError::NotFound { .. } => "NOT_FOUND",
            NilEasyError::Conflict { .. } => "CONFLICT",
            NilEasyError::RateLimited { .. } => "RATE_LIMITED",
            NilEasyError::Unauthorized(_) => "AUTHENTICATION_FAILED",
            NilEasyError::Timeout { .. } => "TIMEOUT",
            NilEasyError::Config(_)
            | NilEasyError::Storage { .. }
            | NilEasyError::HealthCheckFailed { .. }
            | NilEasyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            NilEasyError::ExternalService { kind, .. } => matches!(
                kind,
                ExternalErrorKind::BadCaptcha
                    | ExternalErrorKind::Unavailable
                    | ExternalErrorKind::SessionExpired
            ),
            NilEasyError::Timeout { .. } | NilEasyError::Conflict { .. } => true,
            _ => false,
        }
    }

    /// The external failure kind, if this is an external service error.
    pub fn external_kind(&self) -> Option<ExternalErrorKind> {
        match self {
            NilEasyError::ExternalService { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<GstError> for NilEasyError {
    fn from(err: GstError) -> Self {
        NilEasyError::Validation {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for NilEasyError {
    fn from(err: serde_json::Error) -> Self {
        NilEasyError::Internal(format!("serialization failed: {err}"))
    }
}
