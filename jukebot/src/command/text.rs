//! Text commands: ping, voiceChannel, clear

use super::output::CommandOutput;
use super::{Command, CommandResponse, RequestContext, VoiceDirectory};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// `ping`
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> String {
        "pongs!".to_string()
    }

    fn syntax(&self) -> String {
        "ping".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success_with("pong")
    }
}

/// `voiceChannel`: tell the user which voice destination they are in
pub struct VoiceChannelCommand {
    voice: Arc<dyn VoiceDirectory>,
}

impl VoiceChannelCommand {
    pub fn new(voice: Arc<dyn VoiceDirectory>) -> Self {
        Self { voice }
    }
}

#[async_trait]
impl Command for VoiceChannelCommand {
    fn name(&self) -> &str {
        "voiceChannel"
    }

    fn description(&self) -> String {
        "tells which voice channel you are in".to_string()
    }

    fn syntax(&self) -> String {
        "voiceChannel".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse {
        match self.voice.voice_destination_of(&request.user).await {
            Some(destination) => CommandResponse::success_with(format!("you are in {}", destination.name)),
            None => CommandResponse::error("you are not in a voice channel currently"),
        }
    }
}

/// `clear`: wipe the command replies, bot owner only
pub struct ClearOutputCommand {
    output: Arc<CommandOutput>,
    /// Nobody may clear without a configured owner
    owner_id: Option<String>,
}

impl ClearOutputCommand {
    pub fn new(output: Arc<CommandOutput>, owner_id: Option<String>) -> Self {
        Self { output, owner_id }
    }
}

#[async_trait]
impl Command for ClearOutputCommand {
    fn name(&self) -> &str {
        "clear"
    }

    fn description(&self) -> String {
        "clears the command replies".to_string()
    }

    fn syntax(&self) -> String {
        "clear".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    fn authorize(&self, request: &RequestContext) -> CommandResponse {
        if self.owner_id.as_deref() == Some(request.user.id.as_str()) {
            CommandResponse::success()
        } else {
            CommandResponse::unauthorized("only the owner of the bot can do this")
        }
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse {
        info!(user = %request.user.tag, "Clearing command output");
        self.output.clear();
        CommandResponse::success()
    }
}
