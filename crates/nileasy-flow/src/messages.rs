// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply texts, in WhatsApp markdown.

use nileasy_core::ConversationState;
use nileasy_core::state::TOTAL_STEPS;
use nileasy_core::types::BusinessDetails;
use nileasy_core::user::FilingAttempt;
use nileasy_gst::{Period, ReturnType};

use crate::outcome::Reply;

pub const BTN_START: &str = "start_filing";
pub const BTN_HELP: &str = "help";
pub const BTN_CONFIRM_YES: &str = "confirm_yes";
pub const BTN_CONFIRM_NO: &str = "confirm_no";
pub const BTN_GSTR1: &str = "gstr1";
pub const BTN_GSTR3B: &str = "gstr3b";
pub const BTN_SMS_SENT: &str = "sms_sent";
pub const BTN_SMS_HELP: &str = "sms_help";
pub const BTN_OTP_RECEIVED: &str = "otp_received";
pub const BTN_OTP_MISSING: &str = "otp_missing";
pub const BTN_CNF_SENT: &str = "cnf_sent";
pub const BTN_CNF_HELP: &str = "cnf_help";
pub const BTN_ARN_RECEIVED: &str = "arn_received";
pub const BTN_ARN_MISSING: &str = "arn_missing";
pub const BTN_ASPIRE: &str = "aspire";
pub const BTN_FILE_ANOTHER: &str = "file_another";
pub const BTN_DONE: &str = "done";

/// `_Step 3 of 7_`, for states on the happy path.
pub fn progress(state: ConversationState) -> Option<String> {
    let step = state.metadata().step;
    (1..TOTAL_STEPS)
        .contains(&step)
        .then(|| format!("_Step {step} of {TOTAL_STEPS}_"))
}

fn attempts(left: u32) -> String {
    match left {
        1 => "(1 attempt remaining)".to_string(),
        n => format!("({n} attempts remaining)"),
    }
}

pub fn welcome(name: Option<&str>) -> Reply {
    let greeting = match name {
        Some(name) if !name.trim().is_empty() => format!("👋 Hi *{}*!", name.trim()),
        _ => "👋 Hi there!".to_string(),
    };
    Reply::text(format!(
        "{greeting}\n\n\
         Welcome to *NilEasy*. I help you file *Nil GST returns* in a few minutes, \
         right here on WhatsApp.\n\n\
         You'll need:\n\
         • Your GSTIN\n\
         • The mobile number registered on the GST portal\n\n\
         Ready to begin?"
    ))
    .with_buttons([(BTN_START, "Start Filing"), (BTN_HELP, "Help")])
}

pub fn help() -> Reply {
    Reply::text(
        "ℹ️ *How NilEasy works*\n\n\
         1. Share your GSTIN and solve a captcha so I can look up your business.\n\
         2. Pick the return (GSTR-1 or GSTR-3B) and the month.\n\
         3. I prepare the Nil filing SMS. You send it from your registered mobile.\n\
         4. The GST portal replies with an OTP. I prepare the confirmation SMS.\n\
         5. You receive an ARN. Your return is filed!\n\n\
         Type *Hi* at any time to start over.",
    )
    .with_buttons([(BTN_START, "Start Filing")])
}

pub fn ask_gstin() -> Reply {
    Reply::text(
        "📝 Please send your *15-character GSTIN*.\n\n\
         Example: 27AABCU9603R1ZM",
    )
}

pub fn invalid_gstin(attempts_left: u32) -> Reply {
    Reply::text(format!(
        "❌ *Invalid GSTIN Format*\n\n\
         A GSTIN has 15 characters: a 2-digit state code, a 10-character PAN, \
         an entity number, the letter Z and a check character.\n\n\
         Please check and send it again {}",
        attempts(attempts_left)
    ))
}

pub fn captcha(gstin: &str, image_url: &str) -> Reply {
    Reply::text(format!(
        "✅ *GSTIN Format Valid*\n\n\
         GSTIN: {gstin}\n\n\
         To fetch your business details from the GST portal, please type the \
         characters shown in this captcha image.\n\n\
         Reply *refresh* for a new image."
    ))
    .with_media(image_url)
}

pub fn captcha_retry(image_url: &str, attempts_left: u32) -> Reply {
    Reply::text(format!(
        "❌ That captcha didn't match. Here is a new one, please try again {}",
        attempts(attempts_left)
    ))
    .with_media(image_url)
}

pub fn captcha_refreshed(image_url: &str) -> Reply {
    Reply::text("🔄 Here is a fresh captcha. Please type the characters you see.")
        .with_media(image_url)
}

pub fn captcha_empty() -> Reply {
    Reply::text("Please type the characters shown in the captcha image.")
}

pub fn gstin_not_found(gstin: &str) -> Reply {
    Reply::text(format!(
        "❌ The GST portal has no taxpayer registered under *{gstin}*.\n\n\
         Please check the GSTIN and send it again."
    ))
}

pub fn portal_unavailable() -> Reply {
    Reply::text(
        "⚠️ The GST portal is not responding right now. Please try again in a moment.",
    )
}

pub fn temporarily_unavailable() -> Reply {
    Reply::text("⚠️ One of our services is not responding right now. Please try again in a moment.")
}

pub fn confirm_business(gstin: &str, details: &BusinessDetails, from_records: bool) -> Reply {
    let heading = if from_records {
        "🏢 *Business found in our records*"
    } else {
        "🏢 *Business details found*"
    };
    Reply::text(format!(
        "{heading}\n\n\
         *GSTIN:* {gstin}\n\
         *Trade name:* {}\n\
         *Legal name:* {}\n\
         *Address:* {}\n\
         *Registered on:* {}\n\
         *Status:* {}\n\n\
         Are these details correct?",
        details.business_name,
        details.legal_name,
        details.address,
        details.registration_date,
        details.status,
    ))
    .with_buttons([(BTN_CONFIRM_YES, "Yes, correct"), (BTN_CONFIRM_NO, "No, change GSTIN")])
}

pub fn confirm_prompt() -> Reply {
    Reply::text("Please reply *Yes* if the business details are correct, or *No* to enter a different GSTIN.")
        .with_buttons([(BTN_CONFIRM_YES, "Yes, correct"), (BTN_CONFIRM_NO, "No, change GSTIN")])
}

pub fn ask_return_type() -> Reply {
    Reply::text(format!(
        "📋 Which return do you want to file as *Nil*?\n\n\
         *GSTR-1*: {}\n\
         *GSTR-3B*: {}",
        ReturnType::Gstr1.description(),
        ReturnType::Gstr3b.description(),
    ))
    .with_buttons([(BTN_GSTR1, "GSTR-1"), (BTN_GSTR3B, "GSTR-3B")])
}

pub fn invalid_return_type(attempts_left: u32) -> Reply {
    Reply::text(format!(
        "❌ Please choose *1* for GSTR-1 or *2* for GSTR-3B {}",
        attempts(attempts_left)
    ))
    .with_buttons([(BTN_GSTR1, "GSTR-1"), (BTN_GSTR3B, "GSTR-3B")])
}

pub fn ask_period(return_type: ReturnType, periods: &[Period]) -> Reply {
    Reply::text(format!(
        "📅 Which month is this *{return_type}* for?\n\n\
         Pick one below, or type a month like *Jan 2026* or *012026*."
    ))
    .with_buttons(periods.iter().map(|p| (p.code(), p.display_name())))
}

pub fn invalid_period(reason: &str, attempts_left: u32) -> Reply {
    Reply::text(format!(
        "❌ {reason}\n\nPlease pick a listed month or type one like *Jan 2026* {}",
        attempts(attempts_left)
    ))
}

pub fn duplicate_warning(filing: &FilingAttempt) -> Reply {
    let when = filing
        .completed_at
        .unwrap_or(filing.updated_at)
        .format("%d %b %Y");
    let arn = filing
        .arn
        .as_deref()
        .map(|arn| format!(" (ARN {arn})"))
        .unwrap_or_default();
    Reply::text(format!(
        "⚠️ You already filed *{}* for *{}* on {when}{arn}.\n\n\
         You can continue if you need to file again.",
        filing.return_type,
        filing.period.display_name(),
    ))
}

pub fn sms_ready(
    return_type: ReturnType,
    period: Period,
    link: &str,
    sms_text: &str,
    sms_number: &str,
) -> Reply {
    Reply::text(format!(
        "📱 *Your Nil filing SMS is ready*\n\n\
         *Return:* {return_type}\n\
         *Period:* {}\n\n\
         Tap the link to open your SMS app with everything filled in:\n{link}\n\n\
         Or send this text to *{sms_number}* yourself:\n```{sms_text}```\n\n\
         ⚠️ Send it from the mobile number *registered on the GST portal*.",
        period.display_name(),
    ))
    .with_buttons([(BTN_SMS_SENT, "SMS sent"), (BTN_SMS_HELP, "Need help")])
}

pub fn sms_help(sms_text: &str, sms_number: &str) -> Reply {
    Reply::text(format!(
        "ℹ️ *Sending the filing SMS*\n\n\
         1. Open the SMS app on the phone registered with GST.\n\
         2. Send exactly this text to *{sms_number}*:\n```{sms_text}```\n\
         3. Standard SMS charges apply.\n\n\
         Reply *1* once sent, or *retry* for a fresh link."
    ))
    .with_buttons([(BTN_SMS_SENT, "SMS sent")])
}

pub fn sms_pending_prompt() -> Reply {
    Reply::text("Have you sent the filing SMS?")
        .with_buttons([(BTN_SMS_SENT, "SMS sent"), (BTN_SMS_HELP, "Need help")])
}

pub fn wait_for_otp() -> Reply {
    Reply::text(
        "⏳ The GST portal will reply with a *6-digit OTP* by SMS.\n\n\
         Forward that SMS here or type the OTP, and I'll prepare the confirmation.",
    )
    .with_buttons([(BTN_OTP_RECEIVED, "Got the OTP"), (BTN_OTP_MISSING, "No OTP yet")])
}

pub fn ask_otp_digits() -> Reply {
    Reply::text("👍 Great! Please type the *6-digit OTP* (or forward the SMS) here.")
}

pub fn otp_troubleshooting() -> Reply {
    Reply::text(
        "🔧 *No OTP yet?*\n\n\
         • OTPs can take a few minutes to arrive.\n\
         • Make sure the SMS went out from your GST-registered mobile.\n\
         • Check that the text was sent without changes.\n\n\
         Reply *retry* to get a fresh filing link.",
    )
}

pub fn confirmation_ready(link: &str, sms_text: &str, sms_number: &str) -> Reply {
    Reply::text(format!(
        "✅ *OTP received!*\n\n\
         Now send the confirmation SMS. Tap to open it ready to send:\n{link}\n\n\
         Or send this text to *{sms_number}*:\n```{sms_text}```\n\n\
         ⏱️ The OTP is valid for a short time only."
    ))
    .with_buttons([(BTN_CNF_SENT, "Confirmation sent"), (BTN_CNF_HELP, "Need help")])
}

pub fn confirmation_help(sms_text: &str, sms_number: &str) -> Reply {
    Reply::text(format!(
        "ℹ️ Send this text to *{sms_number}* from your GST-registered mobile:\n\
         ```{sms_text}```\n\n\
         Reply *1* once sent."
    ))
    .with_buttons([(BTN_CNF_SENT, "Confirmation sent")])
}

pub fn confirmation_prompt() -> Reply {
    Reply::text("Have you sent the confirmation SMS?")
        .with_buttons([(BTN_CNF_SENT, "Confirmation sent"), (BTN_CNF_HELP, "Need help")])
}

pub fn wait_for_arn() -> Reply {
    Reply::text(
        "⏳ Almost done! The portal will send an SMS with your *ARN* \
         (Acknowledgement Reference Number).\n\n\
         Forward it here, or tell me once it arrives.",
    )
    .with_buttons([(BTN_ARN_RECEIVED, "Got the ARN"), (BTN_ARN_MISSING, "No ARN yet")])
}

pub fn arn_troubleshooting() -> Reply {
    Reply::text(
        "🔧 *No ARN yet?*\n\n\
         • The ARN SMS can take up to 15 minutes.\n\
         • If the OTP expired, reply *retry* to start the SMS steps again.",
    )
    .with_buttons([(BTN_ARN_RECEIVED, "Got the ARN")])
}

pub fn filing_completed(
    return_type: ReturnType,
    period: Period,
    gstin: &str,
    arn: Option<&str>,
    total_filings: usize,
) -> Reply {
    let arn_line = arn.map(|arn| format!("*ARN:* {arn}\n")).unwrap_or_default();
    Reply::text(format!(
        "🎉 *Nil return filed!*\n\n\
         *GSTIN:* {gstin}\n\
         *Return:* {return_type}\n\
         *Period:* {}\n\
         {arn_line}\n\
         Filings completed with NilEasy: *{total_filings}*\n\n\
         What would you like to do next?",
        period.display_name(),
    ))
    .with_buttons(completed_buttons())
}

fn completed_buttons() -> [(&'static str, &'static str); 3] {
    [
        (BTN_ASPIRE, "Explore Aspire"),
        (BTN_FILE_ANOTHER, "File another"),
        (BTN_DONE, "Done"),
    ]
}

pub fn completed_menu() -> Reply {
    Reply::text("What would you like to do next?").with_buttons(completed_buttons())
}

pub fn aspire() -> Reply {
    Reply::text(
        "💼 *Aspire business account*\n\n\
         Open a business account with free GST-ready invoicing, expense cards \
         and automated bookkeeping.\n\n\
         Our team will reach out with details.",
    )
    .with_buttons([(BTN_FILE_ANOTHER, "File another"), (BTN_DONE, "Done")])
}

pub fn goodbye() -> Reply {
    Reply::text("🙏 Thanks for using NilEasy! Type *Hi* whenever you need to file again.")
}

pub fn session_expired() -> Reply {
    Reply::text(
        "⌛ Your session expired due to inactivity.\n\nType *Hi* to start a new filing.",
    )
}

pub fn too_many_attempts() -> Reply {
    Reply::text("⚠️ Too many invalid attempts. Let's take a step back.")
}

pub fn off_track() -> Reply {
    Reply::text("🤔 Let's continue from where we left off.")
}

pub fn please_resend() -> Reply {
    Reply::text("⚠️ I received two messages at once. Please send your last message again.")
}

pub fn internal_error(detail: Option<&str>) -> Reply {
    let body = match detail {
        Some(detail) => format!("❌ Something went wrong: {detail}"),
        None => "❌ Something went wrong on our side.".to_string(),
    };
    Reply::text(format!("{body}\n\nType *Hi* to restart."))
}

pub fn invalid_input(message: &str) -> Reply {
    Reply::text(format!("⚠️ {message}. Please try again."))
}
