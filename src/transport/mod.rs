//! Mail transport abstraction layer.
//!
//! Defines the [`MailTransport`] and [`SandboxMailer`] traits the contact
//! pipeline delivers through, plus the shared envelope and error types.
//!
//! Two transports are implemented:
//! - [`resend::ResendTransport`]: Resend `/emails` HTTP API (production)
//! - [`ethereal::EtherealSandbox`]: disposable Ethereal SMTP accounts (development)

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

pub mod ethereal;
pub mod resend;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// A named sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    /// Display name, if any.
    pub name: Option<String>,
    /// Mailbox address.
    pub address: String,
}

/// A fully rendered email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    /// Sender. `None` means the transport uses its own configured identity.
    pub from: Option<Sender>,
    /// Destination address.
    pub to: String,
    /// Optional reply-to address.
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Proof that a transport accepted a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Provider-assigned message id.
    pub message_id: String,
    /// Web link for inspecting a sandbox message.
    pub preview_url: Option<String>,
}

/// Credentials for a disposable sandbox account.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct TestAccount {
    /// SMTP username.
    pub user: String,
    /// SMTP password.
    pub pass: String,
    /// SMTP relay settings.
    pub smtp: SmtpEndpoint,
    /// Base URL of the web inbox used for previews.
    pub web: String,
}

impl std::fmt::Debug for TestAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestAccount")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .field("smtp", &self.smtp)
            .field("web", &self.web)
            .finish()
    }
}

/// SMTP relay host settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpEndpoint {
    /// Relay hostname.
    pub host: String,
    /// Relay port.
    pub port: u16,
    /// Implicit TLS (`true`) or STARTTLS (`false`).
    pub secure: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by mail transports.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP transport failure.
    #[error("transport request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream responded with an error status.
    #[error("transport returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },
    /// Response did not match the expected schema.
    #[error("transport response parse error: {0}")]
    Parse(String),
    /// Provider accepted the request but reported an error.
    #[error("provider reported an error: {0}")]
    Provider(String),
    /// An address could not be turned into a mailbox.
    #[error("invalid mailbox address: {0}")]
    Address(String),
    /// SMTP submission failed.
    #[error("smtp delivery failed: {0}")]
    Smtp(String),
    /// Sandbox account could not be created.
    #[error("sandbox provisioning failed: {0}")]
    Provisioning(String),
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

/// Default bound on one provider call, connect to last byte.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client whose requests fail after `timeout` instead of hanging.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "failed to build HTTP client with timeouts, using default");
            reqwest::Client::new()
        })
}

/// Check HTTP response status and return body text or a structured error.
///
/// # Errors
///
/// Returns `TransportError::Request` on transport failure, `TransportError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TransportError::HttpStatus {
            status: status.as_u16(),
            body: sanitize_http_error_body(&body),
        });
    }
    Ok(body)
}

/// Collapse whitespace, redact key-like tokens and cap the length of an error body.
pub fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [
        r"re_[A-Za-z0-9_]{16,}",
        r"Bearer [A-Za-z0-9._\-]{8,}",
        r"sk-[A-Za-z0-9]{32,}",
    ] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A transport that delivers a rendered email in one call.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver the email.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on network, auth, or provider rejection.
    async fn send(&self, email: &OutgoingEmail) -> Result<Receipt, TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// A development-only transport that needs a fresh account before sending.
#[async_trait]
pub trait SandboxMailer: Send + Sync {
    /// Create a disposable account.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Provisioning`] or a request error when the
    /// account service is unreachable or answers unexpectedly.
    async fn provision_test_account(&self) -> Result<TestAccount, TransportError>;

    /// Send through a previously provisioned account.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the message cannot be built or the
    /// relay refuses it.
    async fn send(
        &self,
        account: &TestAccount,
        email: &OutgoingEmail,
    ) -> Result<Receipt, TransportError>;
}
