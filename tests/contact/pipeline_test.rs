//! Delivery ordering and fallback behaviour of the contact pipeline.

use std::collections::HashSet;

use folio::config::ExecutionMode;
use folio::contact::pipeline::ContactPipeline;
use folio::contact::{
    failure_message, Channel, FailureKind, RawFields, MSG_RECEIVED, MSG_SENT, MSG_SENT_SANDBOX,
};

use crate::mocks::{MockSandbox, MockSink, MockTransport};

const OWNER: &str = "owner@example.com";

fn fields() -> RawFields {
    RawFields::new("Grace Hopper", "grace@example.com", "Compilers", "Line one\nLine two")
}

#[tokio::test]
async fn primary_success_skips_sandbox_and_sink() {
    let primary = MockTransport::ok();
    let sandbox = MockSandbox::ok();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Development, OWNER)
        .primary(primary.clone())
        .sandbox(sandbox.clone())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.channel, Channel::Primary);
    assert_eq!(outcome.user_message, MSG_SENT);
    assert_eq!(primary.calls(), 1);
    assert_eq!(sandbox.provisions(), 0);
    assert_eq!(sandbox.sends(), 0);
    assert_eq!(sink.calls(), 0);
}

#[tokio::test]
async fn primary_email_goes_to_owner_with_prefixed_subject() {
    let primary = MockTransport::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, OWNER)
        .primary(primary.clone())
        .build();

    let _ = pipeline.submit(&fields()).await;

    let sent = primary.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, OWNER);
    assert_eq!(sent[0].subject, "Portfolio Contact: Compilers");
    assert_eq!(sent[0].reply_to.as_deref(), Some("grace@example.com"));
    assert!(sent[0].html.contains("Line one<br>Line two"));
}

#[tokio::test]
async fn failing_primary_in_development_falls_back_to_sandbox_once() {
    let primary = MockTransport::failing();
    let sandbox = MockSandbox::ok();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Development, OWNER)
        .primary(primary.clone())
        .sandbox(sandbox.clone())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.channel, Channel::Sandbox);
    assert_eq!(outcome.user_message, MSG_SENT_SANDBOX);
    assert_eq!(
        outcome.preview_url.as_deref(),
        Some("https://ethereal.email/message/MSG123")
    );
    assert_eq!(primary.calls(), 1);
    assert_eq!(sandbox.provisions(), 1);
    assert_eq!(sandbox.sends(), 1);
    assert_eq!(sink.calls(), 0);

    let sent = sandbox.sent();
    let from = sent[0].from.clone().expect("sandbox mail has a sender");
    assert_eq!(from.name.as_deref(), Some("Grace Hopper"));
    assert_eq!(from.address, "grace@example.com");
    assert_eq!(sent[0].subject, "Compilers");
}

#[tokio::test]
async fn failing_primary_and_sandbox_hand_message_to_sink_once() {
    let primary = MockTransport::failing();
    let sandbox = MockSandbox::failing_send();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Development, OWNER)
        .primary(primary.clone())
        .sandbox(sandbox.clone())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.channel, Channel::Sink);
    assert_eq!(outcome.user_message, MSG_RECEIVED);
    assert_eq!(primary.calls(), 1);
    assert_eq!(sandbox.sends(), 1);
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn sandbox_provisioning_failure_goes_straight_to_sink() {
    let primary = MockTransport::failing();
    let sandbox = MockSandbox::failing_provision();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Development, OWNER)
        .primary(primary.clone())
        .sandbox(sandbox.clone())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert_eq!(outcome.channel, Channel::Sink);
    assert_eq!(sandbox.provisions(), 1);
    assert_eq!(sandbox.sends(), 0);
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn failing_primary_in_production_never_touches_sandbox() {
    let primary = MockTransport::failing();
    let sandbox = MockSandbox::ok();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, OWNER)
        .primary(primary.clone())
        .sandbox(sandbox.clone())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.channel, Channel::Sink);
    assert_eq!(primary.calls(), 1);
    assert_eq!(sandbox.provisions(), 0);
    assert_eq!(sandbox.sends(), 0);
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn sink_receives_verbatim_fields_with_fresh_id() {
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, OWNER)
        .primary(MockTransport::failing())
        .sink(sink.clone())
        .build();

    let raw = RawFields::new(" Grace ", "grace@example.com", "Compilers ", "Body\n");
    let before = chrono::Utc::now();
    let _ = pipeline.submit(&raw).await;
    let after = chrono::Utc::now();

    let recorded = sink.recorded();
    assert_eq!(recorded.len(), 1);
    let message = &recorded[0];
    assert_eq!(message.name(), " Grace ");
    assert_eq!(message.email(), "grace@example.com");
    assert_eq!(message.subject(), "Compilers ");
    assert_eq!(message.body(), "Body\n");
    assert!(!message.id().is_nil());
    assert!(message.submitted_at() >= before && message.submitted_at() <= after);
}

#[tokio::test]
async fn sink_failure_is_reported_with_direct_contact_address() {
    let sink = MockSink::failing();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, OWNER)
        .contact_address("hello@example.com")
        .primary(MockTransport::failing())
        .sink(sink.clone())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.channel, Channel::Rejected);
    assert_eq!(outcome.failure, Some(FailureKind::Delivery));
    assert_eq!(outcome.user_message, failure_message("hello@example.com"));
    assert!(outcome.user_message.contains("hello@example.com"));
    assert!(!outcome.user_message.contains("read-only"));
    assert_eq!(sink.calls(), 1);
}

#[tokio::test]
async fn identical_submissions_get_distinct_ids() {
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, OWNER)
        .primary(MockTransport::failing())
        .sink(sink.clone())
        .build();

    for _ in 0..5 {
        let _ = pipeline.submit(&fields()).await;
    }

    let ids: HashSet<_> = sink.recorded().iter().map(|m| m.id()).collect();
    assert_eq!(ids.len(), 5);
}

#[tokio::test]
async fn user_text_never_carries_transport_errors() {
    let pipeline = ContactPipeline::builder(ExecutionMode::Development, OWNER)
        .primary(MockTransport::failing())
        .sandbox(MockSandbox::failing_send())
        .sink(MockSink::failing())
        .build();

    let outcome = pipeline.submit(&fields()).await;

    assert!(!outcome.user_message.contains("401"));
    assert!(!outcome.user_message.contains("invalid api key"));
    assert!(!outcome.user_message.contains("connection refused"));
}
