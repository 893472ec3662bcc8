//! `help`: list the available commands

use super::{Command, CommandResponse, RequestContext};
use async_trait::async_trait;
use std::sync::Arc;

pub struct HelpCommand {
    /// Rendered `prefix+syntax - description` lines
    lines: Vec<String>,
}

impl HelpCommand {
    /// Build the help text from the registered commands
    pub fn new(prefix: &str, commands: &[Arc<dyn Command>]) -> Self {
        let mut lines: Vec<String> = commands
            .iter()
            .map(|command| format!("`{}{}` - {}", prefix, command.syntax(), command.description()))
            .collect();
        lines.push(format!("`{}help` - shows this list", prefix));
        Self { lines }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn name(&self) -> &str {
        "help"
    }

    fn description(&self) -> String {
        "shows this list".to_string()
    }

    fn syntax(&self) -> String {
        "help".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success_with(format!("available commands:\n{}", self.lines.join("\n")))
    }
}
