//! Notification email collaborator.
//!
//! The core only depends on the narrow `Mailer` trait; delivery failures
//! are logged and never fail the operation that triggered the send (a
//! password change succeeds even when the notification email does not).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailTemplate {
    Welcome,
    PasswordChanged,
    PasswordReset,
}

impl EmailTemplate {
    pub fn id(&self) -> &'static str {
        match self {
            EmailTemplate::Welcome => "welcome",
            EmailTemplate::PasswordChanged => "password-changed",
            EmailTemplate::PasswordReset => "password-reset",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub template: EmailTemplate,
    pub recipient: String,
    pub variables: HashMap<String, String>,
}

impl EmailMessage {
    pub fn new(template: EmailTemplate, recipient: impl Into<String>) -> Self {
        Self {
            template,
            recipient: recipient.into(),
            variables: HashMap::new(),
        }
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Default mailer: records the send through tracing. Deployments wire a
/// provider-backed implementation via `set_mailer` at startup.
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            template = message.template.id(),
            recipient = %message.recipient,
            "Email queued"
        );
        Ok(())
    }
}

static MAILER: OnceLock<Box<dyn Mailer>> = OnceLock::new();

pub fn set_mailer(mailer: Box<dyn Mailer>) {
    if MAILER.set(mailer).is_err() {
        tracing::warn!("Mailer already configured; ignoring replacement");
    }
}

fn mailer() -> &'static dyn Mailer {
    MAILER.get_or_init(|| Box::new(TracingMailer)).as_ref()
}

/// Fire-and-log send: delivery failure never propagates to the caller.
pub async fn send_quietly(message: EmailMessage) {
    let template = message.template.id();
    let recipient = message.recipient.clone();
    if let Err(e) = mailer().send(message).await {
        tracing::warn!(
            template,
            recipient = %recipient,
            "Email delivery failed (operation unaffected): {}",
            e
        );
    }
}
