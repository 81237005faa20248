//! Email service for studio, support and customer notifications.
//!
//! Two modes:
//! 1. Send via Resend API (when an API key is configured)
//! 2. Disabled (no email sent, log only)
//!
//! Reconciliation builds `OutboundEmail` values and the webhook handler
//! dispatches them fire-and-forget; a delivery failure is logged and never
//! propagates back to the gateway.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// A message queued for delivery: subject, plain-text body, recipient list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

impl OutboundEmail {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipients,
        }
    }
}

/// Result of attempting to send an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailSendResult {
    /// Email was sent successfully via Resend
    Sent,
    /// No API key configured; the message was logged only
    Disabled,
}

/// Resend API request body.
#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    text: &'a str,
}

/// Resend API response.
#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    #[allow(dead_code)]
    id: String,
}

/// Email service using the Resend API.
#[derive(Clone)]
pub struct Mailer {
    api_key: Option<String>,
    from_email: String,
    http_client: Client,
}

impl Mailer {
    pub fn new(api_key: Option<String>, from_email: String) -> Self {
        Self {
            api_key,
            from_email,
            http_client: Client::new(),
        }
    }

    /// A mailer that only logs, for dev mode and tests.
    pub fn disabled(from_email: String) -> Self {
        Self::new(None, from_email)
    }

    /// Send one message, retrying transient failures.
    pub async fn send(&self, email: &OutboundEmail) -> Result<EmailSendResult> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!(
                subject = %email.subject,
                recipients = ?email.recipients,
                "Email disabled, message logged only"
            );
            return Ok(EmailSendResult::Disabled);
        };

        let request = ResendEmailRequest {
            from: &self.from_email,
            to: &email.recipients,
            subject: &email.subject,
            text: &email.body,
        };

        let mut last_error: Option<AppError> = None;

        for (attempt, delay_secs) in std::iter::once(&0u64).chain(RETRY_DELAYS).enumerate() {
            if *delay_secs > 0 {
                tracing::warn!(
                    attempt,
                    delay_secs,
                    "Retrying email send after transient failure"
                );
                tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
            }

            match self.send_resend_request(api_key, &request).await {
                Ok(()) => {
                    tracing::info!(
                        subject = %email.subject,
                        recipients = ?email.recipients,
                        "Email sent via Resend"
                    );
                    return Ok(EmailSendResult::Sent);
                }
                Err((error, is_transient)) => {
                    if is_transient {
                        last_error = Some(error);
                    } else {
                        return Err(error);
                    }
                }
            }
        }

        tracing::error!(
            subject = %email.subject,
            attempts = RETRY_DELAYS.len() + 1,
            "Email send failed after all retries"
        );
        Err(last_error
            .unwrap_or_else(|| AppError::Internal("Email service error: all retries exhausted".into())))
    }

    /// Send a single request to the Resend API.
    ///
    /// Returns Ok(()) on success, or Err((AppError, is_transient)) on failure.
    async fn send_resend_request(
        &self,
        api_key: &str,
        request: &ResendEmailRequest<'_>,
    ) -> std::result::Result<(), (AppError, bool)> {
        let response = self
            .http_client
            .post(RESEND_API_URL)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to Resend API");
                // Network errors are transient
                (AppError::Internal(format!("Email service error: {}", e)), true)
            })?;

        let status = response.status();

        if status.is_success() {
            let _result: ResendEmailResponse = response.json().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to parse Resend API response");
                (AppError::Internal("Email service response error".into()), false)
            })?;
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            let is_transient = status.as_u16() == 429 || status.is_server_error();

            if is_transient {
                tracing::warn!(status = %status, body = %body, "Resend API returned transient error");
            } else {
                tracing::error!(status = %status, body = %body, "Resend API returned non-transient error");
            }

            Err((
                AppError::Internal(format!("Email service error: {} - {}", status, body)),
                is_transient,
            ))
        }
    }
}

/// Dispatch a batch of queued messages in a background task.
///
/// Webhook handlers must answer the gateway promptly and must not fail on
/// delivery problems, so sends happen after the response, fire-and-forget.
pub fn spawn_send_all(mailer: Mailer, emails: Vec<OutboundEmail>) {
    if emails.is_empty() {
        return;
    }
    tokio::spawn(async move {
        for email in &emails {
            if let Err(e) = mailer.send(email).await {
                tracing::error!(
                    subject = %email.subject,
                    error = %e,
                    "Failed to deliver notification email"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delays_configuration() {
        assert_eq!(RETRY_DELAYS.len(), 3, "Should have 3 retry attempts");
        assert_eq!(RETRY_DELAYS, &[1, 4, 16], "Exponential backoff: 1s, 4s, 16s");
    }

    #[tokio::test]
    async fn test_disabled_mailer_logs_only() {
        let mailer = Mailer::disabled("noreply@darkroom.local".to_string());
        let email = OutboundEmail::new("subject", "body", vec!["a@example.com".to_string()]);
        let result = mailer.send(&email).await.unwrap();
        assert_eq!(result, EmailSendResult::Disabled);
    }
}
