//! Contact form domain: submitted fields, the stamped message, and the
//! outcome reported back to the page.
//!
//! The delivery logic lives in [`pipeline::ContactPipeline`]; this module only
//! holds the data types and the validation rules they are built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod compose;
pub mod pipeline;

// ---------------------------------------------------------------------------
// User-facing text
// ---------------------------------------------------------------------------

/// Shown when any field is missing or empty.
pub const MSG_MISSING_FIELDS: &str = "Please fill in all fields";
/// Shown when the email address has no `@`.
pub const MSG_INVALID_EMAIL: &str = "Please enter a valid email address";
/// Shown after a successful primary send.
pub const MSG_SENT: &str = "Your message has been sent successfully!";
/// Shown after a successful sandbox send.
pub const MSG_SENT_SANDBOX: &str =
    "Your message has been sent successfully! (Development mode - check console for preview URL)";
/// Shown when the message was only recorded by the sink.
pub const MSG_RECEIVED: &str = "Your message has been received! I'll get back to you soon.";
/// Shown when production has no primary transport configured.
pub const MSG_CONFIGURATION: &str =
    "Server configuration error. Please try again later or contact directly via email.";

/// Failure text pointing the visitor at a direct address.
pub fn failure_message(contact_address: &str) -> String {
    format!(
        "Failed to send message. Please try again later or contact directly via email at {contact_address}."
    )
}

// ---------------------------------------------------------------------------
// Inbound fields
// ---------------------------------------------------------------------------

/// Raw form fields as posted by the page. Any of them may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFields {
    /// Visitor name.
    pub name: Option<String>,
    /// Visitor reply address.
    pub email: Option<String>,
    /// Message subject.
    pub subject: Option<String>,
    /// Message body. Keyed `message` on the wire.
    pub message: Option<String>,
}

impl RawFields {
    /// Convenience constructor with all four fields present.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            subject: Some(subject.into()),
            message: Some(message.into()),
        }
    }
}

/// Reasons a submission is rejected before any delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),
    /// The email field does not contain `@`.
    #[error("email address is malformed")]
    InvalidEmail,
}

impl ValidationError {
    /// The canned message shown to the visitor.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingField(_) => MSG_MISSING_FIELDS,
            Self::InvalidEmail => MSG_INVALID_EMAIL,
        }
    }
}

/// The four fields after validation, still exactly as the caller sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidFields {
    name: String,
    email: String,
    subject: String,
    body: String,
}

/// Check the raw fields.
///
/// All four must be present and non-empty, then `email` must contain `@`.
/// Whitespace counts as content.
/// Values are never trimmed or rewritten.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] for the first empty field in
/// form order, otherwise [`ValidationError::InvalidEmail`].
pub fn validate(raw: &RawFields) -> Result<ValidFields, ValidationError> {
    let name = required(raw.name.as_deref(), "name")?;
    let email = required(raw.email.as_deref(), "email")?;
    let subject = required(raw.subject.as_deref(), "subject")?;
    let body = required(raw.message.as_deref(), "message")?;

    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(ValidFields {
        name: name.to_owned(),
        email: email.to_owned(),
        subject: subject.to_owned(),
        body: body.to_owned(),
    })
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField(field)),
    }
}

// ---------------------------------------------------------------------------
// Stamped message
// ---------------------------------------------------------------------------

/// A validated submission annotated with an id and a receive time.
///
/// Fields are private so a message cannot change after it is stamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    id: Uuid,
    name: String,
    email: String,
    subject: String,
    #[serde(rename = "message")]
    body: String,
    submitted_at: DateTime<Utc>,
}

impl ContactMessage {
    /// Stamp validated fields with a fresh time-ordered id and the current time.
    pub fn stamp(fields: ValidFields) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: fields.name,
            email: fields.email,
            subject: fields.subject,
            body: fields.body,
            submitted_at: Utc::now(),
        }
    }

    /// Unique id assigned on receipt.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Visitor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Visitor reply address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Message subject.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Message body.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// When the pipeline received the message.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Which strategy produced the final outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Delivered through the transactional email provider.
    Primary,
    /// Delivered through the development SMTP sandbox.
    Sandbox,
    /// Recorded by the message sink.
    Sink,
    /// Not delivered.
    Rejected,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Sandbox => "sandbox",
            Self::Sink => "sink",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Why a rejected outcome was rejected. Never shown to visitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The submitted fields were invalid.
    Validation,
    /// The deployment has no usable transport.
    Configuration,
    /// Every transport failed and so did the sink.
    Delivery,
}

/// Result of one submission, safe to hand straight to the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    /// Whether the message reached the owner (by email or by the sink).
    pub delivered: bool,
    /// Human-readable text, displayable verbatim.
    #[serde(rename = "message")]
    pub user_message: String,
    /// Strategy that produced this outcome.
    pub channel: Channel,
    /// Sandbox preview link, only for sandbox deliveries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Failure classification for logs and tests.
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl SubmissionOutcome {
    /// A successful outcome on the given channel.
    pub fn delivered(channel: Channel, user_message: impl Into<String>) -> Self {
        Self {
            delivered: true,
            user_message: user_message.into(),
            channel,
            preview_url: None,
            failure: None,
        }
    }

    /// A rejected outcome with the given classification.
    pub fn rejected(failure: FailureKind, user_message: impl Into<String>) -> Self {
        Self {
            delivered: false,
            user_message: user_message.into(),
            channel: Channel::Rejected,
            preview_url: None,
            failure: Some(failure),
        }
    }

    /// Attach a sandbox preview link.
    #[must_use]
    pub fn with_preview(mut self, preview_url: Option<String>) -> Self {
        self.preview_url = preview_url;
        self
    }
}
