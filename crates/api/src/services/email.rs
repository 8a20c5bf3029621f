//! Verification-code delivery.
//!
//! The [`Notifier`] trait is the out-of-band delivery contract: accept
//! (recipient, code, display name) and either succeed or fail with a
//! delivery error. Delivery failures never panic; callers decide whether
//! they are fatal.
//!
//! Production uses SMTP via lettre with askama-rendered multipart bodies.
//! Without SMTP configured the [`LogNotifier`] writes codes to the log,
//! which is only acceptable in development.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use teslaverse_core::{Email, VerificationCode};

use crate::config::SmtpConfig;

/// HTML template for the verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.html")]
struct VerificationCodeEmailHtml<'a> {
    code: &'a str,
    display_name: &'a str,
}

/// Plain text template for the verification code email.
#[derive(Template)]
#[template(path = "email/verification_code.txt")]
struct VerificationCodeEmailText<'a> {
    code: &'a str,
    display_name: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Delivery did not complete within the allowed time.
    #[error("Email delivery timed out")]
    Timeout,
}

/// Out-of-band delivery channel for verification codes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a verification code to `to`.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if delivery fails; never panics.
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
        display_name: &str,
    ) -> Result<(), EmailError>;
}

/// SMTP-backed notifier for transactional email.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a new notifier from SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay parameters are invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
        display_name: &str,
    ) -> Result<(), EmailError> {
        let html = VerificationCodeEmailHtml {
            code: code.as_str(),
            display_name,
        }
        .render()?;
        let text = VerificationCodeEmailText {
            code: code.as_str(),
            display_name,
        }
        .render()?;

        let subject = format!("{code} is your TeslaVerse verification code");
        self.send_multipart_email(to.as_str(), &subject, &text, &html)
            .await
    }
}

/// Notifier that writes codes to the log instead of sending mail.
///
/// Used when SMTP is not configured. Development only: codes end up in the
/// server log.
#[derive(Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_verification_code(
        &self,
        to: &Email,
        code: &VerificationCode,
        display_name: &str,
    ) -> Result<(), EmailError> {
        tracing::warn!(
            to = %to,
            display_name = %display_name,
            code = %code,
            "SMTP not configured; verification code logged instead of sent"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_html_template_includes_code_and_name() {
        let html = VerificationCodeEmailHtml {
            code: "042917",
            display_name: "Ann",
        }
        .render()
        .unwrap();

        assert!(html.contains("042917"));
        assert!(html.contains("Ann"));
    }

    #[test]
    fn test_text_template_includes_code() {
        let text = VerificationCodeEmailText {
            code: "042917",
            display_name: "Ann",
        }
        .render()
        .unwrap();

        assert!(text.contains("042917"));
        assert!(text.contains("10 minutes"));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        let email = Email::parse("a@x.com").unwrap();
        let code = VerificationCode::parse("123456").unwrap();
        assert!(
            notifier
                .send_verification_code(&email, &code, "Ann")
                .await
                .is_ok()
        );
    }
}
