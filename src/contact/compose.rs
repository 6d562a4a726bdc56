//! Renders a [`ContactMessage`] into the emails handed to each transport.

use crate::transport::{OutgoingEmail, Sender};

use super::ContactMessage;

/// Subject prefix used on mail sent through the primary provider.
const PRIMARY_SUBJECT_PREFIX: &str = "Portfolio Contact: ";

/// Plain-text rendering of the message.
pub fn text_body(message: &ContactMessage) -> String {
    format!(
        "Name: {}\nEmail: {}\n\nMessage:\n{}\n",
        message.name(),
        message.email(),
        message.body()
    )
}

/// HTML rendering of the message. Every interpolated value is escaped.
pub fn html_body(message: &ContactMessage) -> String {
    let body = escape_html(message.body()).replace('\n', "<br>");
    format!(
        "<h2>New Contact Form Submission</h2>\n\
         <p><strong>Name:</strong> {}</p>\n\
         <p><strong>Email:</strong> {}</p>\n\
         <p><strong>Subject:</strong> {}</p>\n\
         <h3>Message:</h3>\n\
         <p>{body}</p>\n",
        escape_html(message.name()),
        escape_html(message.email()),
        escape_html(message.subject()),
    )
}

/// Email for the primary provider.
///
/// The provider supplies its own verified sender, so `from` is left empty and
/// the visitor is set as `reply_to`.
pub fn primary_email(message: &ContactMessage, owner: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: None,
        to: owner.to_owned(),
        reply_to: Some(message.email().to_owned()),
        subject: format!("{PRIMARY_SUBJECT_PREFIX}{}", message.subject()),
        text: text_body(message),
        html: html_body(message),
    }
}

/// Email for the sandbox, sent as if from the visitor.
pub fn sandbox_email(message: &ContactMessage, owner: &str) -> OutgoingEmail {
    OutgoingEmail {
        from: Some(Sender {
            name: Some(message.name().to_owned()),
            address: message.email().to_owned(),
        }),
        to: owner.to_owned(),
        reply_to: None,
        subject: message.subject().to_owned(),
        text: text_body(message),
        html: html_body(message),
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
