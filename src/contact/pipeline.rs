//! Contact submission pipeline.
//!
//! Turns raw form fields into a stamped [`ContactMessage`] and walks it through
//! a forward-only sequence of delivery stages:
//!
//! ```text
//! Validate -> Primary -> Sandbox -> Sinking -> Done
//!                 \_________\__________\______> Done
//! ```
//!
//! Each stage is attempted at most once per call. Sandbox stages are only
//! reachable outside production. Collaborator errors are logged and mapped to
//! the next stage; [`ContactPipeline::submit`] never returns an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::{ExecutionMode, FolioConfig, SinkKind};
use crate::sink::{JsonlSink, LogSink, MessageSink};
use crate::transport::ethereal::EtherealSandbox;
use crate::transport::resend::ResendTransport;
use crate::transport::{MailTransport, SandboxMailer};

use super::compose::{primary_email, sandbox_email};
use super::{
    failure_message, validate, Channel, ContactMessage, FailureKind, RawFields,
    SubmissionOutcome, MSG_CONFIGURATION, MSG_RECEIVED, MSG_SENT, MSG_SENT_SANDBOX,
};

/// Delivery stage for one submission.
enum Stage<'a> {
    Primary(&'a dyn MailTransport),
    Sandbox(&'a dyn SandboxMailer),
    Sinking,
    Misconfigured,
    Done(SubmissionOutcome),
}

/// Validates and delivers contact form submissions.
pub struct ContactPipeline {
    mode: ExecutionMode,
    owner_email: String,
    contact_address: String,
    primary: Option<Arc<dyn MailTransport>>,
    sandbox: Option<Arc<dyn SandboxMailer>>,
    sink: Arc<dyn MessageSink>,
}

impl std::fmt::Debug for ContactPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactPipeline")
            .field("mode", &self.mode)
            .field("owner_email", &self.owner_email)
            .field("primary", &self.primary.as_ref().map(|p| p.name().to_owned()))
            .field("sandbox", &self.sandbox.is_some())
            .field("sink", &self.sink.name())
            .finish()
    }
}

impl ContactPipeline {
    /// Start building a pipeline for the given mode and owner address.
    pub fn builder(mode: ExecutionMode, owner_email: impl Into<String>) -> ContactPipelineBuilder {
        let owner_email = owner_email.into();
        ContactPipelineBuilder {
            mode,
            contact_address: owner_email.clone(),
            owner_email,
            primary: None,
            sandbox: None,
            sink: None,
        }
    }

    /// Build the production wiring from configuration.
    ///
    /// Registers Resend when an API key is present, Ethereal when the mode is
    /// development and the sandbox is enabled, and the configured sink.
    pub fn from_config(config: &FolioConfig) -> Self {
        let mut builder = Self::builder(config.site.mode, config.site.owner_email.clone())
            .contact_address(config.contact_address());

        if let Some(key) = config
            .primary
            .api_key
            .clone()
            .filter(|_| config.primary.is_configured())
        {
            builder = builder.primary(Arc::new(
                ResendTransport::new(
                    key,
                    config.primary.api_base.clone(),
                    config.primary.from.clone(),
                )
                .with_timeout(Duration::from_secs(config.primary.timeout_secs)),
            ));
            info!("primary transport registered");
        }

        if config.site.mode.allows_sandbox() && config.sandbox.enabled {
            builder = builder.sandbox(Arc::new(
                EtherealSandbox::new(
                    config.sandbox.api_base.clone(),
                    config.sandbox.requestor.clone(),
                )
                .with_timeout(Duration::from_secs(config.sandbox.timeout_secs)),
            ));
            info!("sandbox transport registered");
        }

        let sink: Arc<dyn MessageSink> = match config.sink.kind {
            SinkKind::File => Arc::new(JsonlSink::new(&config.sink.path)),
            SinkKind::Log => Arc::new(LogSink),
        };
        builder.sink(sink).build()
    }

    /// Execution mode this pipeline was built for.
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Whether a primary transport is registered.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Whether the sandbox can be reached in this mode.
    pub fn has_sandbox(&self) -> bool {
        self.mode.allows_sandbox() && self.sandbox.is_some()
    }

    /// Name of the registered sink.
    pub fn sink_name(&self) -> &str {
        self.sink.name()
    }

    /// Validate and deliver one submission.
    pub async fn submit(&self, raw: &RawFields) -> SubmissionOutcome {
        let fields = match validate(raw) {
            Ok(fields) => fields,
            Err(e) => {
                info!(reason = %e, kind = "validation", "contact submission rejected");
                return SubmissionOutcome::rejected(FailureKind::Validation, e.user_message());
            }
        };
        let message = ContactMessage::stamp(fields);
        info!(id = %message.id(), mode = %self.mode, "contact submission accepted");

        let mut stage = self.entry_stage();
        loop {
            stage = match stage {
                Stage::Primary(transport) => self.try_primary(transport, &message).await,
                Stage::Sandbox(sandbox) => self.try_sandbox(sandbox, &message).await,
                Stage::Sinking => Stage::Done(self.try_sink(&message).await),
                Stage::Misconfigured => {
                    error!(
                        id = %message.id(),
                        mode = %self.mode,
                        kind = "configuration",
                        "no mail transport configured"
                    );
                    Stage::Done(SubmissionOutcome::rejected(
                        FailureKind::Configuration,
                        MSG_CONFIGURATION,
                    ))
                }
                Stage::Done(outcome) => {
                    info!(
                        id = %message.id(),
                        channel = %outcome.channel,
                        delivered = outcome.delivered,
                        "contact submission finished"
                    );
                    return outcome;
                }
            };
        }
    }

    fn entry_stage(&self) -> Stage<'_> {
        if let Some(primary) = &self.primary {
            return Stage::Primary(primary.as_ref());
        }
        match self.sandbox_stage() {
            Some(stage) => stage,
            None => Stage::Misconfigured,
        }
    }

    fn sandbox_stage(&self) -> Option<Stage<'_>> {
        if !self.mode.allows_sandbox() {
            return None;
        }
        self.sandbox.as_ref().map(|s| Stage::Sandbox(s.as_ref()))
    }

    async fn try_primary(
        &self,
        transport: &dyn MailTransport,
        message: &ContactMessage,
    ) -> Stage<'_> {
        let email = primary_email(message, &self.owner_email);
        match transport.send(&email).await {
            Ok(receipt) => {
                info!(
                    id = %message.id(),
                    transport = transport.name(),
                    message_id = %receipt.message_id,
                    "contact email sent"
                );
                Stage::Done(SubmissionOutcome::delivered(Channel::Primary, MSG_SENT))
            }
            Err(e) => {
                warn!(
                    id = %message.id(),
                    transport = transport.name(),
                    error = %e,
                    kind = "transport",
                    "primary transport failed"
                );
                self.sandbox_stage().unwrap_or(Stage::Sinking)
            }
        }
    }

    async fn try_sandbox(
        &self,
        sandbox: &dyn SandboxMailer,
        message: &ContactMessage,
    ) -> Stage<'_> {
        let account = match sandbox.provision_test_account().await {
            Ok(account) => account,
            Err(e) => {
                warn!(id = %message.id(), error = %e, kind = "transport", "sandbox provisioning failed");
                return Stage::Sinking;
            }
        };

        let email = sandbox_email(message, &self.owner_email);
        match sandbox.send(&account, &email).await {
            Ok(receipt) => {
                info!(
                    id = %message.id(),
                    message_id = %receipt.message_id,
                    preview_url = receipt.preview_url.as_deref().unwrap_or("unavailable"),
                    "sandbox message sent"
                );
                Stage::Done(
                    SubmissionOutcome::delivered(Channel::Sandbox, MSG_SENT_SANDBOX)
                        .with_preview(receipt.preview_url),
                )
            }
            Err(e) => {
                warn!(id = %message.id(), error = %e, kind = "transport", "sandbox send failed");
                Stage::Sinking
            }
        }
    }

    async fn try_sink(&self, message: &ContactMessage) -> SubmissionOutcome {
        match self.sink.record(message).await {
            Ok(()) => {
                info!(id = %message.id(), sink = self.sink.name(), "contact message recorded by sink");
                SubmissionOutcome::delivered(Channel::Sink, MSG_RECEIVED)
            }
            Err(e) => {
                error!(
                    id = %message.id(),
                    sink = self.sink.name(),
                    error = %e,
                    kind = "sink",
                    "contact message lost: sink failed"
                );
                SubmissionOutcome::rejected(
                    FailureKind::Delivery,
                    failure_message(&self.contact_address),
                )
            }
        }
    }
}

/// Builder for [`ContactPipeline`].
pub struct ContactPipelineBuilder {
    mode: ExecutionMode,
    owner_email: String,
    contact_address: String,
    primary: Option<Arc<dyn MailTransport>>,
    sandbox: Option<Arc<dyn SandboxMailer>>,
    sink: Option<Arc<dyn MessageSink>>,
}

impl ContactPipelineBuilder {
    /// Address shown to visitors when delivery fails. Defaults to the owner.
    #[must_use]
    pub fn contact_address(mut self, address: impl Into<String>) -> Self {
        self.contact_address = address.into();
        self
    }

    /// Register the primary transport.
    #[must_use]
    pub fn primary(mut self, transport: Arc<dyn MailTransport>) -> Self {
        self.primary = Some(transport);
        self
    }

    /// Register the sandbox. Ignored in production.
    #[must_use]
    pub fn sandbox(mut self, sandbox: Arc<dyn SandboxMailer>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Register the fallback sink. Defaults to [`LogSink`].
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Finish building.
    pub fn build(self) -> ContactPipeline {
        ContactPipeline {
            mode: self.mode,
            owner_email: self.owner_email,
            contact_address: self.contact_address,
            primary: self.primary,
            sandbox: self.sandbox,
            sink: self.sink.unwrap_or_else(|| Arc::new(LogSink)),
        }
    }
}
