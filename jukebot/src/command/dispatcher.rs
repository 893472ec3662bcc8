//! Command dispatcher
//!
//! Turns prefixed chat lines into requests, runs them through the matching
//! command and writes replies (addressed with the user's tag) to the
//! [`CommandOutput`]. Users who keep getting `Unauthorized` responses are
//! ignored for a while.

use super::output::CommandOutput;
use super::{Command, CommandResponseType, RequestContext, User};
use crate::config::CommandSettings;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Reply sent when a user starts being ignored
pub const IGNORE_MESSAGE: &str = "you have been ignored for a while because of repeated unauthorized commands";

/// Per-user unauthorized-attempt bookkeeping
#[derive(Debug)]
struct UnauthorizedThrottle {
    threshold: u32,
    window: Duration,
    ignore_period: Duration,
    tries: HashMap<String, (u32, Instant)>,
    ignored: HashMap<String, Instant>,
}

impl UnauthorizedThrottle {
    fn new(settings: &CommandSettings) -> Self {
        Self {
            threshold: settings.unauthorized_threshold.max(1),
            window: settings.unauthorized_window(),
            ignore_period: settings.ignore_period(),
            tries: HashMap::new(),
            ignored: HashMap::new(),
        }
    }

    fn is_ignored(&mut self, user_id: &str) -> bool {
        match self.ignored.get(user_id) {
            Some(until) if Instant::now() < *until => true,
            Some(_) => {
                self.ignored.remove(user_id);
                false
            }
            None => false,
        }
    }

    /// Count an attempt; true when the user just crossed the threshold
    fn record(&mut self, user_id: &str) -> bool {
        let now = Instant::now();
        let window = self.window;
        self.tries.retain(|_, (_, start)| now.duration_since(*start) < window);
        self.ignored.retain(|_, until| now < *until);

        let entry = self.tries.entry(user_id.to_string()).or_insert((0, now));
        entry.0 += 1;
        if entry.0 < self.threshold {
            return false;
        }
        self.tries.remove(user_id);
        self.ignored.insert(user_id.to_string(), now + self.ignore_period);
        true
    }
}

pub struct Dispatcher {
    prefix: String,
    commands: Vec<Arc<dyn Command>>,
    output: Arc<CommandOutput>,
    pending: tokio::sync::Mutex<mpsc::UnboundedReceiver<RequestContext>>,
    throttle: Mutex<UnauthorizedThrottle>,
}

impl Dispatcher {
    /// `pending` is the receiving end of the submitter handed to commands
    pub fn new(
        prefix: impl Into<String>,
        commands: Vec<Arc<dyn Command>>,
        output: Arc<CommandOutput>,
        pending: mpsc::UnboundedReceiver<RequestContext>,
        settings: &CommandSettings,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            commands,
            output,
            pending: tokio::sync::Mutex::new(pending),
            throttle: Mutex::new(UnauthorizedThrottle::new(settings)),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn output(&self) -> &Arc<CommandOutput> {
        &self.output
    }

    /// Build a request from a chat line; `None` unless it carries the prefix
    pub fn parse_message(&self, user: User, content: &str) -> Option<RequestContext> {
        let line = content.trim().strip_prefix(self.prefix.as_str())?;
        let mut words = line.split_whitespace();
        let command = words.next()?;
        Some(RequestContext::new(
            user,
            command,
            words.map(str::to_string).collect(),
        ))
    }

    /// Handle one chat line; returns whether it was a command
    pub async fn handle_message(&self, user: User, content: &str) -> bool {
        match self.parse_message(user, content) {
            Some(request) => {
                self.handle_command(request).await;
                true
            }
            None => false,
        }
    }

    /// Run a request, then any requests it submitted
    pub async fn handle_command(&self, request: RequestContext) {
        let mut pending = self.pending.lock().await;
        let mut next = Some(request);
        while let Some(request) = next {
            self.run(request).await;
            next = pending.try_recv().ok();
        }
    }

    fn throttle(&self) -> std::sync::MutexGuard<'_, UnauthorizedThrottle> {
        self.throttle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn run(&self, request: RequestContext) {
        if self.throttle().is_ignored(&request.user.id) {
            debug!(user = %request.user.tag, "Ignoring request from ignored user");
            return;
        }

        let Some(command) = self
            .commands
            .iter()
            .find(|command| command.matches(&request.command))
        else {
            info!(
                "{} tried executing unknown command {} {}",
                request.user.tag,
                request.command,
                request.arg_string()
            );
            self.reply(&request.user, &format!("command '{}' does not exist", request.command));
            return;
        };

        let response = command.validate_authorize_and_execute(&request).await;
        info!(
            "{} executed command '{} {}'. response was [{:?}] '{}'",
            request.user.tag,
            request.command,
            request.arg_string(),
            response.kind,
            response.message.as_deref().unwrap_or("")
        );
        if let Some(message) = &response.message {
            self.reply(&request.user, message);
        }

        if response.kind == CommandResponseType::Unauthorized && self.throttle().record(&request.user.id) {
            warn!(user = %request.user.tag, "Ignoring user after repeated unauthorized commands");
            self.reply(&request.user, IGNORE_MESSAGE);
        }
    }

    fn reply(&self, user: &User, message: &str) {
        self.output.push(format!("{}, {}", user.tag, message));
    }
}
