//! Resend transport using the `/emails` API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{
    check_http_response, http_client, MailTransport, OutgoingEmail, Receipt, TransportError,
    DEFAULT_REQUEST_TIMEOUT,
};

/// Default API base for Resend.
pub const RESEND_API_BASE: &str = "https://api.resend.com";

// ---------------------------------------------------------------------------
// Wire types (pub for integration testing)
// ---------------------------------------------------------------------------

/// Resend send-email request body.
#[doc(hidden)]
#[derive(Debug, Serialize)]
pub struct ResendRequest {
    /// Verified sender identity.
    pub from: String,
    /// Recipients.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// Reply-to address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Resend response body. Success carries `id`; errors carry `name`/`message`.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
pub struct ResendResponse {
    /// Message id on success.
    #[serde(default)]
    pub id: Option<String>,
    /// Error name on failure.
    #[serde(default)]
    pub name: Option<String>,
    /// Error message on failure.
    #[serde(default)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Resend transactional email transport.
#[derive(Clone)]
pub struct ResendTransport {
    api_key: String,
    api_base: String,
    from: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for ResendTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendTransport")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("from", &self.from)
            .finish()
    }
}

impl ResendTransport {
    /// Create a transport for the given key, API base and sender identity.
    ///
    /// Requests time out after [`DEFAULT_REQUEST_TIMEOUT`].
    pub fn new(api_key: String, api_base: String, from: String) -> Self {
        Self {
            api_key,
            api_base,
            from,
            client: http_client(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    /// Replace the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = http_client(timeout);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.api_base.trim_end_matches('/'))
    }
}

/// Build the Resend request body for an email.
#[doc(hidden)]
pub fn build_request(default_from: &str, email: &OutgoingEmail) -> ResendRequest {
    let from = match &email.from {
        Some(sender) => match &sender.name {
            Some(name) => format!("{name} <{}>", sender.address),
            None => sender.address.clone(),
        },
        None => default_from.to_owned(),
    };
    ResendRequest {
        from,
        to: vec![email.to.clone()],
        subject: email.subject.clone(),
        text: email.text.clone(),
        html: email.html.clone(),
        reply_to: email.reply_to.clone(),
    }
}

/// Parse a successful Resend response into a receipt.
///
/// # Errors
///
/// Returns `TransportError::Parse` for malformed JSON and
/// `TransportError::Provider` when the body carries an error instead of an id.
#[doc(hidden)]
pub fn parse_response(body: &str) -> Result<Receipt, TransportError> {
    let resp: ResendResponse =
        serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))?;
    match resp.id {
        Some(id) => Ok(Receipt {
            message_id: id,
            preview_url: None,
        }),
        None => {
            let reason = resp
                .message
                .or(resp.name)
                .unwrap_or_else(|| "response carried no message id".to_owned());
            Err(TransportError::Provider(reason))
        }
    }
}

#[async_trait]
impl MailTransport for ResendTransport {
    #[instrument(skip(self, email), fields(transport = "resend"))]
    async fn send(&self, email: &OutgoingEmail) -> Result<Receipt, TransportError> {
        let body = build_request(&self.from, email);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let text = check_http_response(response).await?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        "resend"
    }
}
