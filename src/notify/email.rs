use anyhow::{anyhow, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{render, Notifier};
use crate::model::Report;

/// SMTP delivery of the full plain-text report. One message per report,
/// every recipient on the `To:` line.
pub struct SmtpEmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

fn env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("{key} missing"))
}

impl SmtpEmailNotifier {
    /// Reads SMTP_HOST, SMTP_USER, SMTP_PASS and NOTIFY_EMAIL_FROM.
    pub fn from_env() -> Result<Self> {
        let host = env("SMTP_HOST")?;
        let user = env("SMTP_USER")?;
        let pass = env("SMTP_PASS")?;
        let from_addr = env("NOTIFY_EMAIL_FROM")?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .with_context(|| format!("invalid SMTP_HOST `{host}`"))?
            .credentials(Credentials::new(user, pass))
            .build();
        let from = from_addr
            .parse()
            .with_context(|| format!("invalid NOTIFY_EMAIL_FROM `{from_addr}`"))?;

        Ok(Self { mailer, from })
    }
}

pub(crate) fn build_message(from: &Mailbox, recipients: &[String], report: &Report) -> Result<Message> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(render::email_subject(report))
        .header(header::ContentType::TEXT_PLAIN);
    for r in recipients {
        let to: Mailbox = r.parse().with_context(|| format!("invalid recipient `{r}`"))?;
        builder = builder.to(to);
    }
    builder
        .body(render::email_body(report))
        .context("build email")
}

#[async_trait::async_trait]
impl Notifier for SmtpEmailNotifier {
    async fn send(&self, recipients: &[String], report: &Report) -> Result<()> {
        let msg = build_message(&self.from, recipients, report)?;
        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
