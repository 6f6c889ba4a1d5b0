// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `nileasy serve` command implementation.
//!
//! Wires SQLite storage, the GST portal client, the link shortener and the
//! outbound WhatsApp channel into the conversation flow, then serves the
//! gateway until SIGINT/SIGTERM. A background sweeper soft-expires inactive
//! users and purges expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use nileasy_config::NilEasyConfig;
use nileasy_core::{Clock, LinkShortener, NilEasyError, StorageAdapter, SystemClock};
use nileasy_flow::{Dispatcher, FilingApi, FlowContext, FlowSettings};
use nileasy_gateway::{
    AuthConfig, GatewayState, HealthState, ServerConfig, WebhookAuth, start_server,
};
use nileasy_portal::{CaptchaService, GstPortalClient, RateLimiter};
use nileasy_shortlink::{ShortLinkClient, SmsLinkService};
use nileasy_storage::SqliteStorage;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::maintenance;
use crate::shutdown::install_signal_handler;

/// Runs the `nileasy serve` command.
pub async fn run_serve(config: NilEasyConfig) -> Result<(), NilEasyError> {
    init_tracing(&config.app.log_level);
    info!(
        environment = %config.app.environment,
        channel = %config.channel.provider,
        "starting nileasy serve"
    );

    let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
    storage.initialize().await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = build_gateway_state(&config, storage.clone(), clock.clone())?;

    let cancel = install_signal_handler();
    let sweeper = tokio::spawn(run_sweeper(
        storage.clone(),
        clock,
        config.storage.inactive_user_days,
        Duration::from_secs(config.storage.sweep_interval_minutes * 60),
        cancel.clone(),
    ));

    let server_config = ServerConfig {
        host: config.server.bind_address.clone(),
        port: config.server.port,
    };
    let result = start_server(&server_config, state, cancel.clone()).await;

    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "sweeper task ended abnormally");
    }
    storage.close().await?;
    info!("nileasy serve shutdown complete");
    result
}

/// Builds every service the gateway needs from configuration.
fn build_gateway_state(
    config: &NilEasyConfig,
    storage: Arc<SqliteStorage>,
    clock: Arc<dyn Clock>,
) -> Result<GatewayState, NilEasyError> {
    let portal = Arc::new(GstPortalClient::new(&config.portal)?);
    let shortener = if config.shortlink.enabled {
        let client: Arc<dyn LinkShortener> = Arc::new(ShortLinkClient::new(&config.shortlink)?);
        Some(client)
    } else {
        info!("link shortening disabled, sending raw sms: links");
        None
    };
    let channel = nileasy_whatsapp::build_channel(&config.channel)?;

    let captcha = Arc::new(CaptchaService::new(
        portal,
        storage.clone(),
        clock.clone(),
        config.portal.captcha_ttl_minutes,
        &config.app.public_base_url,
    ));
    let sms_links = SmsLinkService::new(shortener, &config.filing.sms_number);
    let ctx = Arc::new(FlowContext::new(
        storage.clone(),
        captcha,
        sms_links,
        clock.clone(),
        FlowSettings::from_config(config),
    ));
    let lookups = RateLimiter::new(
        storage,
        clock,
        "gstin_lookup",
        config.limits.gstin_lookups_per_hour,
        chrono::Duration::hours(1),
    );

    let twilio_auth_token = if config.channel.validate_twilio_signature {
        if config.channel.twilio_auth_token.is_none() {
            warn!("Twilio signature validation enabled without an auth token, skipping it");
        }
        config.channel.twilio_auth_token.clone()
    } else {
        None
    };
    if config.server.api_token.is_none() {
        warn!("server.api_token not set, /api/v1 is open");
    }

    Ok(GatewayState {
        dispatcher: Arc::new(Dispatcher::new(ctx.clone(), channel)),
        api: Arc::new(FilingApi::new(ctx, lookups)),
        webhook: WebhookAuth {
            twilio_auth_token,
            webhook_url: format!(
                "{}/webhook",
                config.app.public_base_url.trim_end_matches('/')
            ),
        },
        auth: AuthConfig {
            api_token: config.server.api_token.clone(),
        },
        health: HealthState::default(),
    })
}

/// Periodically expires inactive users and purges expired cache entries.
async fn run_sweeper(
    storage: Arc<SqliteStorage>,
    clock: Arc<dyn Clock>,
    inactive_user_days: u32,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match maintenance::sweep(storage.as_ref(), clock.now(), inactive_user_days).await {
                    Ok(report) if report.is_empty() => {}
                    Ok(report) => info!(
                        expired_users = report.expired_users,
                        purged_entries = report.purged_entries,
                        "sweep complete"
                    ),
                    Err(e) => warn!(error = %e, "sweep failed"),
                }
            }
            _ = cancel.cancelled() => {
                info!("sweeper stopped");
                break;
            }
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides `app.log_level`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("nileasy={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
