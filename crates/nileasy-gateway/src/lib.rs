// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for NilEasy.
//!
//! Public routes:
//! - `GET /health`
//! - `POST /webhook` (WhatsApp inbound, optional Twilio signature check)
//! - `GET /api/v1/captcha/{id}` (captcha images, fetched by WhatsApp as media)
//! - `GET /otp-callback` (HTML page showing the OTP and confirmation SMS)
//!
//! Stateless filing API, behind a bearer token when one is configured:
//! - `POST /api/v1/validate-gstin`
//! - `POST /api/v1/verify-captcha`
//! - `POST /api/v1/generate-sms-link`
//! - `POST /api/v1/track-completion`

pub mod auth;
pub mod error;
pub mod handlers;
pub mod otp_page;
pub mod server;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{GatewayState, HealthState, ServerConfig, WebhookAuth, router, start_server};
