// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete NilEasy pipeline.
//!
//! Each test wires an isolated TestHarness (temp SQLite, mock portal,
//! shortener and channel) into the real gateway router and talks to it
//! over HTTP only, the way WhatsApp providers and the web client do.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use nileasy_core::types::OutboundMessage;
use nileasy_core::user::FilingStatus;
use nileasy_core::{ConversationState, StorageAdapter};
use nileasy_flow::{Dispatcher, FilingApi, FlowContext, FlowSettings};
use nileasy_gateway::{AuthConfig, GatewayState, HealthState, WebhookAuth, router};
use nileasy_portal::{CaptchaService, RateLimiter};
use nileasy_shortlink::SmsLinkService;
use nileasy_test_utils::{MockTaxPortal, TEST_BUSINESS, TEST_GSTIN, TEST_PHONE, TestHarness};
use serde_json::{Value, json};
use tower::ServiceExt;

const PUBLIC_URL: &str = "https://nileasy.test";

async fn setup() -> (TestHarness, Router) {
    let h = TestHarness::builder().build().await.unwrap();
    let captcha = Arc::new(CaptchaService::new(
        h.portal.clone(),
        h.storage.clone(),
        h.clock.clone(),
        h.config.portal.captcha_ttl_minutes,
        PUBLIC_URL,
    ));
    let sms_links = SmsLinkService::new(Some(h.shortener.clone()), &h.config.filing.sms_number);
    let ctx = Arc::new(FlowContext::new(
        h.storage.clone(),
        captcha,
        sms_links,
        h.clock.clone(),
        FlowSettings::from_config(&h.config),
    ));
    let lookups = RateLimiter::new(
        h.storage.clone(),
        h.clock.clone(),
        "gstin_lookup",
        h.config.limits.gstin_lookups_per_hour,
        chrono::Duration::hours(1),
    );
    let app = router(GatewayState {
        dispatcher: Arc::new(Dispatcher::new(ctx.clone(), h.channel.clone())),
        api: Arc::new(FilingApi::new(ctx, lookups)),
        webhook: WebhookAuth::default(),
        auth: AuthConfig::default(),
        health: HealthState::default(),
    });
    (h, app)
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

/// Posts a Twilio form webhook and returns the messages it produced.
async fn twilio(
    h: &TestHarness,
    app: &Router,
    body: &str,
    button: Option<&str>,
) -> Vec<OutboundMessage> {
    let mut fields = vec![
        ("From", format!("whatsapp:{TEST_PHONE}")),
        ("Body", body.to_string()),
        ("ProfileName", "Asha".to_string()),
    ];
    if let Some(id) = button {
        fields.push(("ButtonPayload", id.to_string()));
    }
    let form = serde_urlencoded::to_string(&fields).unwrap();
    let req = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    deliver(h, app, req).await
}

/// Posts a JSON gateway event and returns the messages it produced.
async fn gateway_event(
    h: &TestHarness,
    app: &Router,
    text: &str,
    button: Option<&str>,
) -> Vec<OutboundMessage> {
    let mut message = json!({ "text": text });
    if let Some(id) = button {
        message["button"] = json!({ "id": id, "text": text });
    }
    let event = json!({
        "event": "message.received",
        "data": {
            "contact": { "phone": "919876543210", "name": "Asha" },
            "message": message,
        }
    });
    let req = Request::post("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(event.to_string()))
        .unwrap();
    deliver(h, app, req).await
}

async fn deliver(h: &TestHarness, app: &Router, req: Request<Body>) -> Vec<OutboundMessage> {
    h.channel.clear_sent().await;
    let (status, body) = call(app, req).await;
    assert_eq!(status, StatusCode::OK);
    let ack: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ack["status"], "ok");
    h.channel.sent_messages().await
}

fn joined(messages: &[OutboundMessage]) -> String {
    messages
        .iter()
        .map(|m| m.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n")
}

async fn state(h: &TestHarness) -> ConversationState {
    h.storage
        .get_user(TEST_PHONE)
        .await
        .unwrap()
        .unwrap()
        .current_state
}

/// Fetches the captcha image a chat message points at.
async fn fetch_captcha(app: &Router, message: &OutboundMessage) -> Vec<u8> {
    let url = message.media_url.as_deref().unwrap();
    let path = url.strip_prefix(PUBLIC_URL).unwrap();
    let (status, image) = call(app, Request::get(path).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    image
}

// ---- Whole filing over the Twilio webhook ----

#[tokio::test]
async fn twilio_chat_files_a_nil_return() {
    let (h, app) = setup().await;

    let sent = twilio(&h, &app, "hi", None).await;
    assert_eq!(sent[0].to, TEST_PHONE);
    assert!(sent[0].text.contains("Welcome to *NilEasy*"));

    twilio(&h, &app, "Start Filing", Some("start_filing")).await;
    assert_eq!(state(&h).await, ConversationState::AwaitingGstin);

    let sent = twilio(&h, &app, TEST_GSTIN, None).await;
    assert_eq!(fetch_captcha(&app, &sent[0]).await, MockTaxPortal::CAPTCHA_IMAGE);

    let sent = twilio(&h, &app, MockTaxPortal::CAPTCHA_ANSWER, None).await;
    assert!(sent[0].text.contains(TEST_BUSINESS));

    twilio(&h, &app, "Yes", Some("confirm_yes")).await;
    twilio(&h, &app, "3B", None).await;
    assert_eq!(state(&h).await, ConversationState::AwaitingDuration);

    let sent = twilio(&h, &app, "022026", None).await;
    let text = joined(&sent);
    assert!(text.contains("NIL 3B 29AABCU9603R1ZX 022026"));
    assert!(text.contains("https://sho.rt/s1"));
    assert_eq!(state(&h).await, ConversationState::AwaitingOtp);

    twilio(&h, &app, "Sent", Some("sms_sent")).await;
    let sent = twilio(&h, &app, "107543 is your OTP for NIL filing", None).await;
    assert!(joined(&sent).contains("CNF 3B 107543"));

    twilio(&h, &app, "Sent", Some("cnf_sent")).await;
    let sent = twilio(&h, &app, "GSTR-3B filed. ARN AA2902260123456", None).await;
    assert!(joined(&sent).contains("AA2902260123456"));

    let user = h.storage.get_user(TEST_PHONE).await.unwrap().unwrap();
    assert_eq!(user.current_state, ConversationState::Completed);
    assert_eq!(user.name.as_deref(), Some("Asha"));
    assert_eq!(user.filings[0].status, FilingStatus::Completed);
    assert_eq!(user.filings[0].arn.as_deref(), Some("AA2902260123456"));
}

// ---- JSON gateway events with button taps ----

#[tokio::test]
async fn gateway_events_reach_business_confirmation() {
    let (h, app) = setup().await;

    let sent = gateway_event(&h, &app, "hello", None).await;
    assert_eq!(sent[0].to, TEST_PHONE);

    gateway_event(&h, &app, "", Some("start_filing")).await;
    let sent = gateway_event(&h, &app, TEST_GSTIN, None).await;
    assert!(sent[0].media_url.is_some());
    assert_eq!(state(&h).await, ConversationState::AwaitingCaptcha);

    gateway_event(&h, &app, MockTaxPortal::CAPTCHA_ANSWER, None).await;
    assert_eq!(state(&h).await, ConversationState::AwaitingConfirmation);

    let sent = gateway_event(&h, &app, "Yes", Some("confirm_yes")).await;
    assert!(sent[0].text.contains("Which return"));
    assert_eq!(state(&h).await, ConversationState::AwaitingGstType);
}

// ---- Chat and web API share filing history ----

#[tokio::test]
async fn api_warns_about_a_return_filed_over_chat() {
    let (h, app) = setup().await;

    for (body, button) in [
        ("hi", None),
        ("Start Filing", Some("start_filing")),
        (TEST_GSTIN, None),
        (MockTaxPortal::CAPTCHA_ANSWER, None),
        ("Yes", Some("confirm_yes")),
        ("3B", None),
        ("022026", None),
        ("Sent", Some("sms_sent")),
        ("107543 is your OTP", None),
        ("Sent", Some("cnf_sent")),
        ("ARN AA2902260123456", None),
    ] {
        twilio(&h, &app, body, button).await;
    }
    assert_eq!(state(&h).await, ConversationState::Completed);

    let req = Request::post("/api/v1/generate-sms-link")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"gstin": TEST_GSTIN, "gst_type": "3B", "period": "022026"}).to_string(),
        ))
        .unwrap();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], true);
    assert!(body["warning"].as_str().unwrap().contains("already filed"));
}

#[tokio::test]
async fn health_is_served_alongside_the_webhook() {
    let (_h, app) = setup().await;
    let (status, body) = call(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
}
