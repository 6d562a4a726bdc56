//! Ethereal sandbox: disposable SMTP accounts for development sends.
//!
//! Accounts come from the Ethereal account API (`POST {api_base}/user`).
//! Mail is submitted over SMTP to the relay the API returns, and the relay's
//! acceptance line carries the `MSGID` that the web preview is keyed on.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, instrument};

use super::{
    check_http_response, http_client, OutgoingEmail, Receipt, SandboxMailer, Sender,
    TestAccount, TransportError, DEFAULT_REQUEST_TIMEOUT,
};

/// Default account API base.
pub const ETHEREAL_API_BASE: &str = "https://api.nodemailer.com";

/// Account request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ProvisionRequest {
    /// Identifies the requesting application.
    pub requestor: String,
    /// Requesting application version.
    pub version: String,
}

/// Sandbox backed by Ethereal test accounts.
#[derive(Debug, Clone)]
pub struct EtherealSandbox {
    api_base: String,
    requestor: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl EtherealSandbox {
    /// Create a sandbox that provisions accounts from `api_base`.
    ///
    /// Account requests and SMTP sessions time out after
    /// [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(api_base: String, requestor: String) -> Self {
        Self {
            api_base,
            requestor,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            client: http_client(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Replace the timeout used for account requests and SMTP sessions.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = http_client(timeout);
        self
    }
}

/// Parse the account API response.
///
/// # Errors
///
/// Returns `TransportError::Provisioning` when the API reports a failure and
/// `TransportError::Parse` when the body is not the expected shape.
#[doc(hidden)]
pub fn parse_account(body: &str) -> Result<TestAccount, TransportError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))?;
    let status = value.get("status").and_then(|s| s.as_str()).unwrap_or("");
    if status != "success" {
        let reason = value
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("account service did not report success");
        return Err(TransportError::Provisioning(reason.to_owned()));
    }
    serde_json::from_value(value).map_err(|e| TransportError::Parse(e.to_string()))
}

/// Build the preview link from the relay's acceptance text.
///
/// Ethereal answers `250 Accepted [STATUS=new MSGID=...]`; the preview lives at
/// `{web}/message/{MSGID}`.
pub fn preview_url(web: &str, smtp_reply: &str) -> Option<String> {
    message_id_from_reply(smtp_reply)
        .map(|id| format!("{}/message/{id}", web.trim_end_matches('/')))
}

fn message_id_from_reply(smtp_reply: &str) -> Option<String> {
    let regex = Regex::new(r"MSGID=([^\s\]]+)").ok()?;
    regex
        .captures(smtp_reply)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}

fn mailbox(sender: &Sender) -> Result<Mailbox, TransportError> {
    let address: Address = sender
        .address
        .parse()
        .map_err(|e| TransportError::Address(format!("{}: {e}", sender.address)))?;
    Ok(Mailbox::new(sender.name.clone(), address))
}

fn plain_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    mailbox(&Sender {
        name: None,
        address: address.to_owned(),
    })
}

/// Build the MIME message for an outgoing email.
///
/// Falls back to the account's own address when the email has no sender.
///
/// # Errors
///
/// Returns `TransportError::Address` when any address is unparseable.
#[doc(hidden)]
pub fn build_message(account: &TestAccount, email: &OutgoingEmail) -> Result<Message, TransportError> {
    let from = match &email.from {
        Some(sender) => mailbox(sender)?,
        None => plain_mailbox(&account.user)?,
    };
    let mut builder = Message::builder()
        .from(from)
        .to(plain_mailbox(&email.to)?)
        .subject(email.subject.clone());
    if let Some(reply_to) = &email.reply_to {
        builder = builder.reply_to(plain_mailbox(reply_to)?);
    }
    builder
        .multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))
        .map_err(|e| TransportError::Address(e.to_string()))
}

#[async_trait]
impl SandboxMailer for EtherealSandbox {
    #[instrument(skip(self), fields(transport = "ethereal"))]
    async fn provision_test_account(&self) -> Result<TestAccount, TransportError> {
        let url = format!("{}/user", self.api_base.trim_end_matches('/'));
        let request = ProvisionRequest {
            requestor: self.requestor.clone(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        };
        let response = self.client.post(url).json(&request).send().await?;
        let body = check_http_response(response).await?;
        let account = parse_account(&body)?;
        debug!(user = %account.user, host = %account.smtp.host, "sandbox account provisioned");
        Ok(account)
    }

    #[instrument(skip(self, account, email), fields(transport = "ethereal"))]
    async fn send(
        &self,
        account: &TestAccount,
        email: &OutgoingEmail,
    ) -> Result<Receipt, TransportError> {
        let message = build_message(account, email)?;

        let relay = if account.smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&account.smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.smtp.host)
        }
        .map_err(|e| TransportError::Smtp(e.to_string()))?;

        let mailer = relay
            .port(account.smtp.port)
            .timeout(Some(self.timeout))
            .credentials(Credentials::new(account.user.clone(), account.pass.clone()))
            .build();

        let response = mailer
            .send(message)
            .await
            .map_err(|e| TransportError::Smtp(e.to_string()))?;

        Ok(receipt_from_reply(&account.web, response.message()))
    }
}

/// Turn the relay's acceptance lines into a receipt.
///
/// The message id is the `MSGID` token when present, otherwise the whole reply.
pub fn receipt_from_reply<'a>(web: &str, lines: impl Iterator<Item = &'a str>) -> Receipt {
    let reply = lines.collect::<Vec<_>>().join(" ");
    let message_id = message_id_from_reply(&reply).unwrap_or_else(|| reply.clone());
    Receipt {
        message_id,
        preview_url: preview_url(web, &reply),
    }
}
