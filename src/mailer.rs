//! Outbound mail. Fire-and-forget from the caller's perspective: delivery
//! failures are logged by the caller, never retried here.

use anyhow::Context;
use axum::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;

use crate::config::{MailConfig, MailTransportConfig};
use crate::users::repo_types::User;

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_activation_email(&self, user: &User, token: &str) -> anyhow::Result<()>;
    async fn send_password_reset_email(&self, user: &User, token: &str) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: MailTransport,
    from: Mailbox,
    base_url: String,
}

enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let transport = match &config.transport {
            MailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
            } => {
                let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                    .context("create SMTP transport")?
                    .port(*port)
                    .credentials(Credentials::new(username.clone(), password.clone()));
                MailTransport::Smtp(builder.build())
            }
            MailTransportConfig::File { dir } => {
                let mail_dir = Path::new(dir);
                if !mail_dir.exists() {
                    std::fs::create_dir_all(mail_dir).context("create mail directory")?;
                }
                MailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(mail_dir))
            }
        };

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .context("parse from mailbox")?;

        Ok(Self {
            transport,
            from,
            base_url: config.base_url.clone(),
        })
    }

    async fn send(&self, user: &User, subject: &str, body: String) -> anyhow::Result<()> {
        let to = format!("{} <{}>", user.name, user.email)
            .parse::<Mailbox>()
            .context("parse to mailbox")?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .context("build message")?;

        match &self.transport {
            MailTransport::Smtp(smtp) => {
                smtp.send(message).await.context("send SMTP mail")?;
            }
            MailTransport::File(file) => {
                file.send(message).await.context("write mail file")?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_activation_email(&self, user: &User, token: &str) -> anyhow::Result<()> {
        let link = format!(
            "{}/activate?email={}&token={}",
            self.base_url, user.email, token
        );
        let body = activation_body(&user.name, &link);
        self.send(user, "Account activation", body).await
    }

    async fn send_password_reset_email(&self, user: &User, token: &str) -> anyhow::Result<()> {
        let link = format!(
            "{}/reset-password?email={}&token={}",
            self.base_url, user.email, token
        );
        let body = password_reset_body(&user.name, &link);
        self.send(user, "Password reset", body).await
    }
}

fn activation_body(name: &str, link: &str) -> String {
    format!(
        "Hi {name},\n\n\
         Welcome to Microgram! Click the link below to activate your account:\n\n\
         {link}\n\n\
         If you did not sign up, you can ignore this email.\n"
    )
}

fn password_reset_body(name: &str, link: &str) -> String {
    format!(
        "Hi {name},\n\n\
         We received a request to reset your password. Use the link below:\n\n\
         {link}\n\n\
         This link expires in two hours. If you did not request a reset, you\n\
         can safely ignore this email and your password will stay unchanged.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_body_contains_name_and_link() {
        let body = activation_body("Alice", "http://localhost:8080/activate?email=a&token=t");
        assert!(body.contains("Hi Alice,"));
        assert!(body.contains("http://localhost:8080/activate?email=a&token=t"));
    }

    #[test]
    fn password_reset_body_contains_name_and_link() {
        let body =
            password_reset_body("Bob", "http://localhost:8080/reset-password?email=b&token=t");
        assert!(body.contains("Hi Bob,"));
        assert!(body.contains("http://localhost:8080/reset-password?email=b&token=t"));
        assert!(body.contains("expires"));
    }
}
