// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-conversation tests against temp SQLite storage and mock adapters.

use std::sync::Arc;

use chrono::Duration;
use nileasy_core::types::OutboundMessage;
use nileasy_core::user::{FilingStatus, LinkKind, OtpStage, UserRecord};
use nileasy_core::{Clock, ConversationState, ExternalErrorKind, StorageAdapter};
use nileasy_flow::{Dispatcher, FlowContext, FlowSettings};
use nileasy_portal::CaptchaService;
use nileasy_shortlink::SmsLinkService;
use nileasy_test_utils::{
    MockTaxPortal, RacingStorage, TEST_BUSINESS, TEST_GSTIN, TEST_PHONE, TestHarness,
    inbound_button, inbound_text,
};

fn dispatcher(h: &TestHarness) -> Dispatcher {
    dispatcher_over(h, h.storage.clone())
}

fn dispatcher_over(h: &TestHarness, storage: Arc<dyn StorageAdapter>) -> Dispatcher {
    let captcha = Arc::new(CaptchaService::new(
        h.portal.clone(),
        h.storage.clone(),
        h.clock.clone(),
        h.config.portal.captcha_ttl_minutes,
        "https://nileasy.test",
    ));
    let sms_links = SmsLinkService::new(Some(h.shortener.clone()), &h.config.filing.sms_number);
    let ctx = Arc::new(FlowContext::new(
        storage,
        captcha,
        sms_links,
        h.clock.clone(),
        FlowSettings::from_config(&h.config),
    ));
    Dispatcher::new(ctx, h.channel.clone())
}

async fn setup() -> (TestHarness, Dispatcher) {
    let harness = TestHarness::builder().build().await.unwrap();
    let dispatcher = dispatcher(&harness);
    (harness, dispatcher)
}

async fn say(d: &Dispatcher, text: &str) -> Vec<OutboundMessage> {
    d.handle(&inbound_text(TEST_PHONE, text)).await
}

async fn tap(d: &Dispatcher, button: &str) -> Vec<OutboundMessage> {
    d.handle(&inbound_button(TEST_PHONE, button)).await
}

async fn user(h: &TestHarness) -> UserRecord {
    h.storage.get_user(TEST_PHONE).await.unwrap().unwrap()
}

fn all_text(replies: &[OutboundMessage]) -> String {
    replies
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Walks a fresh user up to the return type menu.
async fn verify_business(h: &TestHarness, d: &Dispatcher) {
    say(d, "hi").await;
    tap(d, "start_filing").await;
    say(d, TEST_GSTIN).await;
    say(d, MockTaxPortal::CAPTCHA_ANSWER).await;
    tap(d, "confirm_yes").await;
    assert_eq!(user(h).await.current_state, ConversationState::AwaitingGstType);
}

#[tokio::test]
async fn full_filing_conversation() {
    let (h, d) = setup().await;

    let replies = say(&d, "hi").await;
    assert!(replies[0].text.contains("Welcome to *NilEasy*"));
    assert_eq!(replies[0].buttons[0].id, "start_filing");

    let replies = tap(&d, "start_filing").await;
    assert!(replies[0].text.contains("15-character GSTIN"));
    assert!(replies[0].text.ends_with("_Step 1 of 7_"));

    let replies = say(&d, "29aabcu9603r1zx").await;
    assert!(replies[0].text.contains("GSTIN Format Valid"));
    let image = replies[0].media_url.as_deref().unwrap();
    assert!(image.starts_with("https://nileasy.test/api/v1/captcha/"));
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingCaptcha);

    let replies = say(&d, "Xy7Q2").await;
    assert!(replies[0].text.contains(TEST_BUSINESS));
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingConfirmation);

    let replies = tap(&d, "confirm_yes").await;
    assert!(replies[0].text.contains("Which return"));

    let replies = say(&d, "3B").await;
    let periods: Vec<_> = replies[0].buttons.iter().map(|b| b.id.as_str()).collect();
    assert_eq!(periods, ["022026", "012026", "122025", "112025"]);

    let replies = say(&d, "022026").await;
    let text = all_text(&replies);
    assert!(text.contains("```NIL 3B 29AABCU9603R1ZX 022026```"), "{text}");
    assert!(text.contains("https://sho.rt/s1"));
    assert_eq!(
        h.shortener.requests(),
        vec![("14409".to_string(), "NIL 3B 29AABCU9603R1ZX 022026".to_string())]
    );

    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingOtp);
    assert_eq!(stored.session_data.otp_stage, Some(OtpStage::SmsPending));
    assert_eq!(stored.filings.len(), 1);
    assert_eq!(stored.filings[0].status, FilingStatus::SmsLinkGenerated);
    assert_eq!(stored.generated_links[0].kind, LinkKind::Filing);

    tap(&d, "sms_sent").await;
    let replies = say(&d, "107543 is your OTP for NIL filing").await;
    assert!(all_text(&replies).contains("CNF 3B 107543"));
    let stored = user(&h).await;
    assert_eq!(stored.session_data.otp_stage, Some(OtpStage::SendingConfirmation));
    assert_eq!(stored.filings[0].status, FilingStatus::OtpReceived);

    tap(&d, "cnf_sent").await;
    let replies = say(&d, "Your GSTR-3B is filed. ARN is AA2902260123456").await;
    let text = all_text(&replies);
    assert!(text.contains("Nil return filed"));
    assert!(text.contains("AA2902260123456"));

    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::Completed);
    assert_eq!(stored.filings[0].status, FilingStatus::Completed);
    assert_eq!(stored.filings[0].arn.as_deref(), Some("AA2902260123456"));
    assert_eq!(stored.completed_filings(), 1);
}

#[tokio::test]
async fn invalid_gstin_counts_retries_then_returns_to_welcome() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    tap(&d, "start_filing").await;

    let replies = say(&d, "27AABCU9603R1Z").await;
    assert!(replies[0].text.contains("Invalid GSTIN Format"));
    assert!(replies[0].text.contains("(2 attempts remaining)"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingGstin);
    assert_eq!(stored.session_data.retry_count, 1);

    say(&d, "99AABCU9603R1ZM").await;
    assert_eq!(user(&h).await.session_data.retry_count, 2);

    let replies = say(&d, "not a gstin").await;
    assert!(replies[0].text.contains("Too many invalid attempts"));
    assert!(replies[1].text.contains("Welcome to *NilEasy*"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::Welcome);
    assert_eq!(stored.session_data.retry_count, 0);
}

#[tokio::test]
async fn inactivity_expires_the_session() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    tap(&d, "start_filing").await;

    h.clock.advance(Duration::minutes(31));
    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].text.contains("session expired"));
    assert_eq!(user(&h).await.current_state, ConversationState::SessionExpired);

    let replies = say(&d, "ok").await;
    assert!(replies[0].text.contains("Welcome to *NilEasy*"));
    assert_eq!(user(&h).await.current_state, ConversationState::Welcome);
}

#[tokio::test]
async fn restart_keyword_resets_mid_flow() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;

    let replies = say(&d, "RESTART").await;
    assert!(replies[0].text.contains("Welcome to *NilEasy*"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::Welcome);
    assert!(stored.session_data.return_type.is_none());
}

#[tokio::test]
async fn wrong_captcha_issues_a_new_one_until_budget_runs_out() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    tap(&d, "start_filing").await;
    say(&d, TEST_GSTIN).await;

    let replies = say(&d, "wrong").await;
    assert!(replies[0].text.contains("didn't match"));
    assert!(replies[0].media_url.is_some());
    assert_eq!(h.portal.fetch_calls(), 2);

    say(&d, "wrong").await;
    let replies = say(&d, "wrong").await;
    assert!(replies[0].text.contains("Too many invalid attempts"));
    assert!(replies[1].text.contains("15-character GSTIN"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingGstin);
    assert!(stored.session_data.pending_gstin.is_none());
}

#[tokio::test]
async fn portal_outage_keeps_user_on_gstin_step() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    tap(&d, "start_filing").await;

    h.portal.fail_next_fetch(ExternalErrorKind::Unavailable);
    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].text.contains("not responding"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingGstin);
    assert_eq!(stored.session_data.retry_count, 1);

    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].media_url.is_some());
}

#[tokio::test]
async fn cached_profile_skips_captcha_and_duplicate_is_flagged() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;
    say(&d, "022026").await;
    say(&d, "107543").await;
    say(&d, "ARN: AA2902260123456").await;
    assert_eq!(user(&h).await.current_state, ConversationState::Completed);

    tap(&d, "file_another").await;
    tap(&d, "start_filing").await;
    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].text.contains("found in our records"));
    assert!(replies[0].media_url.is_none());
    assert_eq!(h.portal.fetch_calls(), 1);

    tap(&d, "confirm_yes").await;
    say(&d, "gstr3b").await;
    let replies = say(&d, "1").await;
    assert!(replies[0].text.contains("You already filed *GSTR-3B* for *February 2026*"));
    assert!(replies[0].text.contains("AA2902260123456"));
    assert!(all_text(&replies).contains("NIL 3B 29AABCU9603R1ZX 022026"));
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingOtp);
}

#[tokio::test]
async fn shortener_failure_falls_back_to_sms_uri() {
    let (h, d) = setup().await;
    h.shortener.set_failing(true);
    verify_business(&h, &d).await;
    say(&d, "GSTR-1").await;

    let replies = say(&d, "Jan 2026").await;
    let text = all_text(&replies);
    assert!(text.contains("sms:14409?body=NIL%20R1%2029AABCU9603R1ZX%20012026"), "{text}");
    let stored = user(&h).await;
    assert!(stored.generated_links[0].short_code.is_none());
}

#[tokio::test]
async fn current_month_is_rejected() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;

    let replies = say(&d, "March 2026").await;
    assert!(replies[0].text.contains("hasn't ended yet"));
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingDuration);
}

#[tokio::test]
async fn back_returns_to_return_type_menu() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;

    let replies = say(&d, "back").await;
    assert!(replies[0].text.contains("Which return"));
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingGstType);
}

#[tokio::test]
async fn retry_regenerates_the_filing_link() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;
    say(&d, "022026").await;

    let replies = say(&d, "retry").await;
    assert!(all_text(&replies).contains("https://sho.rt/s2"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingOtp);
    assert_eq!(stored.filings.len(), 1);
    assert_eq!(stored.generated_links.len(), 2);
}

#[tokio::test]
async fn text_only_channel_gets_captcha_link_inline() {
    let h = TestHarness::builder()
        .with_text_only_channel()
        .build()
        .await
        .unwrap();
    let d = dispatcher(&h);
    say(&d, "hi").await;
    tap(&d, "start_filing").await;

    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].media_url.is_none());
    assert!(replies[0].text.contains("https://nileasy.test/api/v1/captcha/"));
}

#[tokio::test]
async fn dispatch_sends_through_channel() {
    let (h, d) = setup().await;
    let ids = d.dispatch(&inbound_text(TEST_PHONE, "hello")).await.unwrap();
    assert_eq!(ids.len(), 1);
    let sent = h.channel.sent_messages().await;
    assert_eq!(sent[0].to, TEST_PHONE);
    assert!(sent[0].text.contains("Welcome"));
}

#[tokio::test]
async fn profile_name_is_recorded() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    assert_eq!(user(&h).await.name.as_deref(), Some("Test User"));
}

#[tokio::test]
async fn arn_is_only_taken_after_the_confirmation_sms() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;
    say(&d, "3B").await;
    say(&d, "022026").await;

    say(&d, "I have not got the ARN confirmation yet").await;
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::AwaitingOtp);
    assert_eq!(stored.session_data.otp_stage, Some(OtpStage::SmsPending));
    assert_eq!(stored.filings[0].status, FilingStatus::SmsLinkGenerated);
    assert!(stored.filings[0].arn.is_none());

    // A real-looking ARN is still ignored before the OTP step.
    say(&d, "ARN AA2902260123456").await;
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingOtp);

    say(&d, "107543").await;
    tap(&d, "cnf_sent").await;
    say(&d, "still waiting for the ARN information").await;
    let stored = user(&h).await;
    assert_eq!(stored.session_data.otp_stage, Some(OtpStage::WaitingArn));
    assert_eq!(stored.filings[0].status, FilingStatus::OtpReceived);

    say(&d, "ARN AA2902260123456").await;
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::Completed);
    assert_eq!(stored.filings[0].arn.as_deref(), Some("AA2902260123456"));
}

#[tokio::test]
async fn soft_expired_user_starts_over() {
    let (h, d) = setup().await;
    verify_business(&h, &d).await;

    let now = h.clock.now();
    let expired = h
        .storage
        .expire_inactive_users(now + Duration::minutes(1), now)
        .await
        .unwrap();
    assert_eq!(expired, 1);

    let replies = say(&d, "3B").await;
    assert!(replies[0].text.contains("Welcome to *NilEasy*"));
    let stored = user(&h).await;
    assert_eq!(stored.current_state, ConversationState::Welcome);
    assert!(stored.expired_at.is_none());
    assert!(stored.session_data.return_type.is_none());
}

#[tokio::test]
async fn lost_save_asks_the_user_to_resend() {
    let (h, d) = setup().await;
    say(&d, "hi").await;
    tap(&d, "start_filing").await;
    let before = user(&h).await;
    assert_eq!(before.current_state, ConversationState::AwaitingGstin);

    let racing = Arc::new(RacingStorage::new(h.storage.clone()));
    let raced = dispatcher_over(&h, racing.clone());
    let replies = say(&raced, TEST_GSTIN).await;

    assert_eq!(replies.len(), 1);
    assert!(replies[0].text.contains("Please send your last message again"));
    assert_eq!(racing.races(), 1);
    let after = user(&h).await;
    assert_eq!(after.current_state, ConversationState::AwaitingGstin);
    assert_eq!(after.version, before.version + 1);

    let replies = say(&d, TEST_GSTIN).await;
    assert!(replies[0].media_url.is_some());
    assert_eq!(user(&h).await.current_state, ConversationState::AwaitingCaptcha);
}
