//! Notification dispatch: one report, two independent channels.
//!
//! A channel fires only when it is enabled for the trigger and has at least
//! one recipient. Both attempts run concurrently and are always both awaited;
//! a failure (or panic) in one is captured as that channel's outcome and never
//! touches the other.

pub mod email;
pub mod render;
pub mod whatsapp;

use std::panic::AssertUnwindSafe;

use anyhow::Result;
use futures::FutureExt;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::config::{Configuration, DigestToggles};
use crate::model::{Report, TriggerMode};

pub use email::SmtpEmailNotifier;
pub use whatsapp::TwilioWhatsAppNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Messaging,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Messaging => "messaging",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The trigger or its toggle does not activate this channel.
    DisabledForTrigger,
    NoRecipients,
}

/// Per-channel result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChannelOutcome {
    Sent,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, ChannelOutcome::Sent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChannelOutcome::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ChannelOutcome::Skipped { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            ChannelOutcome::Sent => "sent",
            ChannelOutcome::Skipped { .. } => "skipped",
            ChannelOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResult {
    pub email: ChannelOutcome,
    pub messaging: ChannelOutcome,
}

/// Delivery capability for one channel. Timeouts and retries live in the
/// implementation and surface as `Err`.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Stand-in used when a channel's credentials are missing from the
/// environment: every attempt fails with a readable error.
#[derive(Debug, Clone)]
pub struct UnconfiguredNotifier {
    channel: Channel,
    missing: String,
}

impl UnconfiguredNotifier {
    pub fn new(channel: Channel, missing: impl Into<String>) -> Self {
        Self {
            channel,
            missing: missing.into(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for UnconfiguredNotifier {
    async fn send(&self, _recipients: &[String], _report: &Report) -> Result<()> {
        Err(anyhow::anyhow!(
            "{} channel not configured: {}",
            self.channel.as_str(),
            self.missing
        ))
    }

    fn name(&self) -> &'static str {
        "unconfigured"
    }
}

/// Whether `channel` is active for `trigger`.
/// Realtime and manual use the realtime toggle for both channels;
/// daily and weekly digests go out by email only.
pub fn channel_enabled(channel: Channel, trigger: TriggerMode, toggles: DigestToggles) -> bool {
    match (trigger, channel) {
        (TriggerMode::Realtime | TriggerMode::Manual, _) => toggles.realtime,
        (TriggerMode::Daily, Channel::Email) => toggles.daily,
        (TriggerMode::Weekly, Channel::Email) => toggles.weekly,
        (TriggerMode::Daily | TriggerMode::Weekly, Channel::Messaging) => false,
    }
}

pub async fn dispatch(
    report: &Report,
    config: &Configuration,
    trigger: TriggerMode,
    email: &dyn Notifier,
    messaging: &dyn Notifier,
) -> NotificationResult {
    let toggles = config.toggles();
    let (email_out, messaging_out) = tokio::join!(
        attempt(Channel::Email, email, config.emails(), report, trigger, toggles),
        attempt(
            Channel::Messaging,
            messaging,
            config.messaging_recipients(),
            report,
            trigger,
            toggles
        ),
    );
    NotificationResult {
        email: email_out,
        messaging: messaging_out,
    }
}

async fn attempt(
    channel: Channel,
    notifier: &dyn Notifier,
    recipients: &[String],
    report: &Report,
    trigger: TriggerMode,
    toggles: DigestToggles,
) -> ChannelOutcome {
    let outcome = if !channel_enabled(channel, trigger, toggles) {
        ChannelOutcome::Skipped {
            reason: SkipReason::DisabledForTrigger,
        }
    } else if recipients.is_empty() {
        ChannelOutcome::Skipped {
            reason: SkipReason::NoRecipients,
        }
    } else {
        let sent = AssertUnwindSafe(notifier.send(recipients, report))
            .catch_unwind()
            .await;
        match sent {
            Ok(Ok(())) => ChannelOutcome::Sent,
            Ok(Err(e)) => ChannelOutcome::Failed {
                error: format!("{e:#}"),
            },
            Err(panic) => ChannelOutcome::Failed {
                error: format!("notifier panicked: {}", crate::panic_text(panic.as_ref())),
            },
        }
    };

    match &outcome {
        ChannelOutcome::Sent => {
            tracing::info!(target: "notify", channel = channel.as_str(), notifier = notifier.name(), recipients = recipients.len(), "report sent");
            counter!("notify_sent_total", "channel" => channel.as_str()).increment(1);
        }
        ChannelOutcome::Failed { error } => {
            tracing::warn!(target: "notify", channel = channel.as_str(), notifier = notifier.name(), %error, "delivery failed");
            counter!("notify_failed_total", "channel" => channel.as_str()).increment(1);
        }
        ChannelOutcome::Skipped { reason } => {
            tracing::debug!(target: "notify", channel = channel.as_str(), ?reason, "channel skipped");
            counter!("notify_skipped_total", "channel" => channel.as_str()).increment(1);
        }
    }
    tracing::trace!(target: "notify", channel = channel.as_str(), outcome = outcome.label());
    outcome
}
