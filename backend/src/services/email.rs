use anyhow::Context;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use crate::{config::Config, services::tokens::PASSWORD_RESET_TTL};

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Returns None if SMTP is not fully configured.
    pub fn new(config: &Config) -> Option<Self> {
        let host = config.smtp_host.as_deref()?;
        let username = config.smtp_username.clone()?;
        let password = config.smtp_password.clone()?;
        let from_addr = config.smtp_from.as_deref()?;

        let port = config.smtp_port.unwrap_or(587);
        let creds = Credentials::new(username, password);

        let transport = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .ok()?
                .port(port)
                .credentials(creds)
                .build()
        };

        let from: Mailbox = from_addr.parse().ok()?;

        Some(Self { transport, from })
    }

    fn new_message_id(&self) -> String {
        format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain())
    }

    fn password_reset_message(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> anyhow::Result<Message> {
        let to = format!("{to_name} <{to_email}>")
            .parse::<Mailbox>()
            .or_else(|_| to_email.parse::<Mailbox>())
            .context("Invalid recipient address")?;
        let minutes = PASSWORD_RESET_TTL.as_secs() / 60;

        let text = format!(
            "Hello {to_name},\n\n\
            We received a request to reset the password of your hostel account.\n\n\
            Open this link to choose a new password (valid for {minutes} minutes):\n\
            {reset_url}\n\n\
            If you did not ask for this, you can ignore this email."
        );

        let html = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<body style="margin:0;padding:24px;background-color:#f1f5f9;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,Helvetica,Arial,sans-serif">
  <h1 style="margin:0 0 8px 0;font-size:22px;font-weight:700;color:#0f172a">Reset your password</h1>
  <p style="margin:0 0 24px 0;font-size:15px;color:#64748b;line-height:1.6">Hello <strong style="color:#334155">{to_name}</strong>, we received a request to reset the password of your hostel account.</p>
  <p style="margin:0 0 24px 0"><a href="{reset_url}" style="display:inline-block;padding:13px 28px;background:#2563eb;color:#ffffff;text-decoration:none;font-weight:600;border-radius:8px">Choose a new password</a></p>
  <p style="margin:0;font-size:13px;color:#94a3b8">This link expires in {minutes} minutes. If you did not ask for this, you can ignore this email.</p>
</body>
</html>"#
        );

        Message::builder()
            .message_id(Some(self.new_message_id()))
            .from(self.from.clone())
            .to(to)
            .subject("Reset your hostel account password")
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .context("Failed to build email message")
    }

    pub async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> anyhow::Result<()> {
        let email = self.password_reset_message(to_email, to_name, reset_url)?;
        self.transport
            .send(email)
            .await
            .context("Failed to send email")?;
        Ok(())
    }
}
