//! Sound shortcuts
//!
//! Each configured sound name is a command of its own that resubmits a
//! `play <locator>` request on behalf of the user.

use super::{Command, CommandResponse, CommandSubmitter, RequestContext};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct SoundCommand {
    sounds: BTreeMap<String, String>,
    submitter: Arc<dyn CommandSubmitter>,
}

impl SoundCommand {
    /// `sounds` maps shortcut names to locators
    pub fn new(sounds: BTreeMap<String, String>, submitter: Arc<dyn CommandSubmitter>) -> Self {
        Self { sounds, submitter }
    }
}

#[async_trait]
impl Command for SoundCommand {
    fn name(&self) -> &str {
        "sound"
    }

    fn description(&self) -> String {
        let names: Vec<&str> = self.sounds.keys().map(String::as_str).collect();
        format!("plays a sound, possible sounds are: {}", names.join(", "))
    }

    fn syntax(&self) -> String {
        "<sound>".to_string()
    }

    fn matches(&self, command: &str) -> bool {
        self.sounds.contains_key(command)
    }

    fn validate(&self, request: &RequestContext) -> CommandResponse {
        if self.sounds.contains_key(&request.command) {
            CommandResponse::success()
        } else {
            CommandResponse::error(format!("sound '{}' not found", request.command))
        }
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse {
        let Some(locator) = self.sounds.get(&request.command) else {
            return CommandResponse::error(format!("sound '{}' not found", request.command));
        };
        self.submitter.submit(RequestContext::new(
            request.user.clone(),
            "play",
            vec![locator.clone()],
        ));
        CommandResponse::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{QueuedSubmitter, User};

    #[tokio::test]
    async fn test_sound_resubmits_play() {
        let (submitter, mut rx) = QueuedSubmitter::channel();
        let mut sounds = BTreeMap::new();
        sounds.insert("tada".to_string(), "https://video.example/watch?v=tada".to_string());
        let command = SoundCommand::new(sounds, Arc::new(submitter));

        assert!(command.matches("tada"));
        assert!(!command.matches("sound"));
        assert!(command.description().ends_with("tada"));

        let user = User::new("7", "bob#0007");
        let request = RequestContext::new(user.clone(), "tada", Vec::new());
        let response = command.validate_authorize_and_execute(&request).await;
        assert_eq!(response, CommandResponse::success());

        let play = rx.try_recv().unwrap();
        assert_eq!(play.command, "play");
        assert_eq!(play.args, vec!["https://video.example/watch?v=tada"]);
        assert_eq!(play.user, user);
    }
}
