use anyhow::{anyhow, Result};
use reqwest::Client;
use std::time::Duration;

use super::{render, Notifier};
use crate::model::Report;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";
/// Backoff doubles from 500ms and stops growing at 500ms << 6 (32s).
const MAX_BACKOFF_SHIFT: u8 = 6;

/// WhatsApp delivery through Twilio's Messages API. Every recipient is
/// attempted; the send fails if any of them failed.
#[derive(Clone)]
pub struct TwilioWhatsAppNotifier {
    account_sid: String,
    auth_token: String,
    from: String,
    base_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl TwilioWhatsAppNotifier {
    pub fn new(account_sid: String, auth_token: String, from: String) -> Self {
        Self {
            account_sid,
            auth_token,
            from,
            base_url: TWILIO_API.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    /// Reads TWILIO_ACCOUNT_SID, TWILIO_AUTH_TOKEN and TWILIO_WHATSAPP_FROM.
    pub fn from_env() -> Result<Self> {
        let get = |k: &str| std::env::var(k).map_err(|_| anyhow!("{k} missing"));
        Ok(Self::new(
            get("TWILIO_ACCOUNT_SID")?,
            get("TWILIO_AUTH_TOKEN")?,
            get("TWILIO_WHATSAPP_FROM")?,
        ))
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    /// Point at a different API root (tests, regional edges).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }

    async fn send_one(&self, to: &str, body: &str) -> Result<()> {
        let form = [
            ("From", whatsapp_address(&self.from)),
            ("To", whatsapp_address(to)),
            ("Body", body.to_string()),
        ];

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(self.endpoint())
                .basic_auth(&self.account_sid, Some(&self.auth_token))
                .timeout(self.timeout)
                .form(&form)
                .send()
                .await;

            let err = match res {
                Ok(rsp) => match rsp.error_for_status_ref() {
                    Ok(_) => return Ok(()),
                    Err(e) => anyhow!("Twilio HTTP error: {e}"),
                },
                Err(e) => anyhow!("Twilio request failed: {e}"),
            };
            if attempt >= self.max_retries {
                return Err(err);
            }
            tokio::time::sleep(backoff(attempt)).await;
        }
    }
}

/// Delay after the `attempt`-th failed try (1-based).
fn backoff(attempt: u8) -> Duration {
    let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
    Duration::from_millis(500u64 << shift)
}

/// `+1555...` → `whatsapp:+1555...`; already-prefixed numbers pass through.
pub fn whatsapp_address(number: &str) -> String {
    let n = number.trim();
    if n.starts_with("whatsapp:") {
        n.to_string()
    } else {
        format!("whatsapp:{n}")
    }
}

#[async_trait::async_trait]
impl Notifier for TwilioWhatsAppNotifier {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()> {
        let body = render::short_message(report, render::MESSAGE_MAX_CHARS);
        let mut errors = Vec::new();
        for to in recipients {
            if let Err(e) = self.send_one(to, &body).await {
                tracing::warn!(target: "notify", recipient = %to, error = %e, "whatsapp send failed");
                errors.push(format!("{to}: {e}"));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(
                "{}/{} whatsapp recipients failed: {}",
                errors.len(),
                recipients.len(),
                errors.join("; ")
            ))
        }
    }

    fn name(&self) -> &'static str {
        "twilio-whatsapp"
    }
}
