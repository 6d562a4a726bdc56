//! Validation rejects before any collaborator is touched.

use folio::config::ExecutionMode;
use folio::contact::pipeline::ContactPipeline;
use folio::contact::{
    validate, Channel, FailureKind, RawFields, ValidationError, MSG_INVALID_EMAIL,
    MSG_MISSING_FIELDS,
};

use crate::mocks::{MockSandbox, MockSink, MockTransport};

fn valid() -> RawFields {
    RawFields::new("Ada Lovelace", "ada@example.com", "Engines", "Let's talk.")
}

fn with_each_field_blank(value: Option<&str>) -> Vec<RawFields> {
    let blank = value.map(str::to_owned);
    vec![
        RawFields { name: blank.clone(), ..valid() },
        RawFields { email: blank.clone(), ..valid() },
        RawFields { subject: blank.clone(), ..valid() },
        RawFields { message: blank, ..valid() },
    ]
}

#[tokio::test]
async fn any_missing_or_empty_field_is_rejected_without_side_effects() {
    for value in [None, Some("")] {
        for raw in with_each_field_blank(value) {
            let primary = MockTransport::ok();
            let sandbox = MockSandbox::ok();
            let sink = MockSink::ok();
            let pipeline = ContactPipeline::builder(ExecutionMode::Development, "owner@example.com")
                .primary(primary.clone())
                .sandbox(sandbox.clone())
                .sink(sink.clone())
                .build();

            let outcome = pipeline.submit(&raw).await;

            assert!(!outcome.delivered);
            assert_eq!(outcome.channel, Channel::Rejected);
            assert_eq!(outcome.user_message, MSG_MISSING_FIELDS);
            assert_eq!(outcome.failure, Some(FailureKind::Validation));
            assert_eq!(primary.calls(), 0);
            assert_eq!(sandbox.provisions(), 0);
            assert_eq!(sink.calls(), 0);
        }
    }
}

#[tokio::test]
async fn whitespace_only_values_are_delivered_verbatim() {
    let primary = MockTransport::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, "owner@example.com")
        .primary(primary.clone())
        .sink(MockSink::ok())
        .build();
    let raw = RawFields {
        name: Some(" ".to_owned()),
        subject: Some("  \n".to_owned()),
        message: Some("\t".to_owned()),
        ..valid()
    };

    let outcome = pipeline.submit(&raw).await;

    assert!(outcome.delivered);
    assert_eq!(outcome.channel, Channel::Primary);
    assert_eq!(primary.calls(), 1);
    let sent = primary.sent();
    assert_eq!(sent[0].subject, "Portfolio Contact:   \n");
}

#[tokio::test]
async fn email_without_at_sign_is_rejected() {
    let primary = MockTransport::ok();
    let sink = MockSink::ok();
    let pipeline = ContactPipeline::builder(ExecutionMode::Production, "owner@example.com")
        .primary(primary.clone())
        .sink(sink.clone())
        .build();

    let raw = RawFields { email: Some("ada.example.com".to_owned()), ..valid() };
    let outcome = pipeline.submit(&raw).await;

    assert!(!outcome.delivered);
    assert_eq!(outcome.channel, Channel::Rejected);
    assert_eq!(outcome.user_message, MSG_INVALID_EMAIL);
    assert_eq!(primary.calls(), 0);
    assert_eq!(sink.calls(), 0);
}

#[test]
fn email_needs_only_an_at_sign() {
    let raw = RawFields { email: Some("@".to_owned()), ..valid() };
    assert!(validate(&raw).is_ok());
}

#[test]
fn validation_errors_map_to_canned_text() {
    assert_eq!(ValidationError::MissingField("name").user_message(), MSG_MISSING_FIELDS);
    assert_eq!(ValidationError::InvalidEmail.user_message(), MSG_INVALID_EMAIL);
}
