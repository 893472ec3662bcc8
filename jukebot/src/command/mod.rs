//! Chat commands
//!
//! A chat line such as `?play never gonna` becomes a [`RequestContext`] and
//! runs through the matching [`Command`]'s validate → authorize → execute
//! pipeline. The [`dispatcher`] owns the command list; commands get what they
//! need (session handle, resolver, voice directory, submitter) at
//! construction.

pub mod dispatcher;
pub mod help;
pub mod music;
pub mod output;
pub mod parser;
pub mod sound;
pub mod text;

use crate::host::Destination;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

/// A chat user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    /// Platform id
    pub id: String,
    /// Display tag used to address replies
    pub tag: String,
}

impl User {
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
        }
    }
}

/// A user request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub user: User,
    /// Command word without the prefix
    pub command: String,
    /// Whitespace-separated arguments
    pub args: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(user: User, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            user,
            command: command.into(),
            args,
            timestamp: Utc::now(),
        }
    }

    /// Arguments joined back with single spaces
    pub fn arg_string(&self) -> String {
        self.args.join(" ")
    }
}

/// Outcome of a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResponseType {
    Success,
    Error,
    /// The user may not run this command; counts towards being ignored
    Unauthorized,
}

/// Response of a pipeline step, with an optional reply for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub kind: CommandResponseType,
    pub message: Option<String>,
}

impl CommandResponse {
    /// Success without a reply
    pub fn success() -> Self {
        Self {
            kind: CommandResponseType::Success,
            message: None,
        }
    }

    pub fn success_with(message: impl Into<String>) -> Self {
        Self {
            kind: CommandResponseType::Success,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: CommandResponseType::Error,
            message: Some(message.into()),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: CommandResponseType::Unauthorized,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == CommandResponseType::Success
    }
}

/// A chat command
#[async_trait]
pub trait Command: Send + Sync {
    /// Name shown in help
    fn name(&self) -> &str;

    fn description(&self) -> String;

    /// Example syntax, without the prefix
    fn syntax(&self) -> String;

    /// Whether this command handles the command word
    fn matches(&self, command: &str) -> bool {
        command == self.name()
    }

    /// Check the request's arguments
    fn validate(&self, request: &RequestContext) -> CommandResponse;

    /// Check that the user may run the command
    fn authorize(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse;

    /// Run the full pipeline, stopping at the first unsuccessful step
    async fn validate_authorize_and_execute(&self, request: &RequestContext) -> CommandResponse {
        let validation = self.validate(request);
        if !validation.is_success() {
            debug!(command = self.name(), "Validation failed");
            return validation;
        }
        let authorization = self.authorize(request);
        if !authorization.is_success() {
            debug!(command = self.name(), "Authorization failed");
            return authorization;
        }
        self.execute(request).await
    }
}

/// Resubmits synthetic requests (sound shortcuts, reaction controls)
pub trait CommandSubmitter: Send + Sync {
    fn submit(&self, request: RequestContext);
}

/// Submitter that queues requests for the dispatcher
///
/// The dispatcher drains the queue after each command it runs, so a command
/// can submit follow-up requests without holding a reference to the
/// dispatcher that owns it.
#[derive(Debug, Clone)]
pub struct QueuedSubmitter {
    tx: mpsc::UnboundedSender<RequestContext>,
}

impl QueuedSubmitter {
    /// Create a submitter and the receiving end handed to the dispatcher
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RequestContext>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CommandSubmitter for QueuedSubmitter {
    fn submit(&self, request: RequestContext) {
        debug!(command = %request.command, user = %request.user.tag, "Synthetic request");
        let _ = self.tx.send(request);
    }
}

/// Answers which voice destination a user is in
#[async_trait]
pub trait VoiceDirectory: Send + Sync {
    async fn voice_destination_of(&self, user: &User) -> Option<Destination>;
}

/// Directory placing every user in the same destination
#[derive(Debug, Clone, Default)]
pub struct FixedVoiceDirectory {
    destination: Option<Destination>,
}

impl FixedVoiceDirectory {
    pub fn new(destination: Option<Destination>) -> Self {
        Self { destination }
    }
}

#[async_trait]
impl VoiceDirectory for FixedVoiceDirectory {
    async fn voice_destination_of(&self, _user: &User) -> Option<Destination> {
        self.destination.clone()
    }
}
