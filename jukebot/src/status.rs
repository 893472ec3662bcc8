//! Now-playing status
//!
//! Renders the text of the bot's status message from a [`SessionView`] and
//! the recent command output, and maps reaction emoji on that message to
//! synthetic commands.

use crate::command::{RequestContext, User};
use crate::playback::SessionView;
use jukebot_common::human_time::format_clock;
use std::fmt::Write;

/// Seek bar track; one segment is replaced by [`SEEK_MARKER`]
pub const SEEK_LINE: &str = "▬▬▬▬▬▬▬▬▬▬▬▬";
pub const SEEK_MARKER: &str = "🔘";
/// Footer prompt shown under the command output
pub const PROMPT: &str = "**Enter a command to make me do something~**";

/// Queued entries listed by name
const QUEUE_PREVIEW: usize = 2;

/// Seek bar with the marker at `elapsed / total`
///
/// ```
/// use jukebot::status::seek_bar;
///
/// assert_eq!(seek_bar(0.0, 100.0), "🔘▬▬▬▬▬▬▬▬▬▬▬");
/// assert_eq!(seek_bar(100.0, 100.0), "▬▬▬▬▬▬▬▬▬▬▬🔘");
/// ```
pub fn seek_bar(elapsed: f64, total: f64) -> String {
    let segments: Vec<char> = SEEK_LINE.chars().collect();
    let fraction = if total > 0.0 {
        (elapsed / total).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let marker = (fraction * (segments.len() - 1) as f64).round() as usize;

    let mut bar = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index == marker {
            bar.push_str(SEEK_MARKER);
        } else {
            bar.push(*segment);
        }
    }
    bar
}

/// Full status text
///
/// Metadata of lazily resolved tracks is looked up here (bounded by the lazy
/// resolve timeout).
pub async fn render_status(view: &SessionView, output: &[String]) -> String {
    let mut text = String::new();
    for line in output {
        let _ = writeln!(text, "{}", line);
    }
    text.push_str(PROMPT);

    let Some(current) = view.current.as_ref().filter(|_| view.is_active()) else {
        return text;
    };

    let elapsed = view.elapsed_seconds();
    let length = current.duration_seconds().await as f64;
    let _ = write!(
        text,
        "\n\nCurrently playing\n{}\n{} [{}/{}] 🔊 {:.0}%",
        current.title().await,
        seek_bar(elapsed, length),
        format_clock(elapsed),
        format_clock(length),
        view.volume * 100.0
    );

    if !view.queue.is_empty() {
        text.push_str("\n\nQueued");
        for (index, track) in view.queue.iter().take(QUEUE_PREVIEW).enumerate() {
            let _ = write!(
                text,
                "\n`{}.` `[{}]` **{}**",
                index + 1,
                format_clock(track.duration_seconds().await as f64),
                track.title().await
            );
        }
        if view.queue.len() > QUEUE_PREVIEW {
            let _ = write!(text, "\n(+{} more)", view.queue.len() - QUEUE_PREVIEW);
        }
    }
    text
}

/// Media controls offered as reactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Stop,
    Skip,
    VolumeDown,
    VolumeUp,
}

impl Reaction {
    /// In the order they are attached to the status message
    pub const ALL: [Reaction; 4] = [
        Reaction::Stop,
        Reaction::Skip,
        Reaction::VolumeDown,
        Reaction::VolumeUp,
    ];

    pub fn emoji(self) -> &'static str {
        match self {
            Reaction::Stop => "⏹",
            Reaction::Skip => "⏩",
            Reaction::VolumeDown => "🔉",
            Reaction::VolumeUp => "🔊",
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reaction| reaction.emoji() == emoji)
    }
}

/// Maps reactions to commands
#[derive(Debug, Clone, Copy)]
pub struct ReactionControls {
    volume_step: f32,
}

impl ReactionControls {
    pub fn new(volume_step: f32) -> Self {
        Self { volume_step }
    }

    /// Reactions to show; none unless something is playing
    pub fn available(&self, view: &SessionView) -> Vec<Reaction> {
        if view.is_active() {
            Reaction::ALL.to_vec()
        } else {
            Vec::new()
        }
    }

    /// Request for a reaction added by `user`
    ///
    /// `None` for unknown emoji or while nothing is playing.
    pub fn request_for(&self, emoji: &str, user: User, view: &SessionView) -> Option<RequestContext> {
        if !view.is_active() {
            return None;
        }
        let (command, args) = match Reaction::from_emoji(emoji)? {
            Reaction::Stop => ("stop", Vec::new()),
            Reaction::Skip => ("skip", Vec::new()),
            Reaction::VolumeDown => ("volume", vec![self.volume_percent(view.volume - self.volume_step)]),
            Reaction::VolumeUp => ("volume", vec![self.volume_percent(view.volume + self.volume_step)]),
        };
        Some(RequestContext::new(user, command, args))
    }

    fn volume_percent(&self, volume: f32) -> String {
        format!("{:.0}", (volume * 100.0).clamp(0.0, 100.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{PlaybackPosition, SessionState};
    use crate::track::Track;
    use std::time::Duration;

    fn active_view(queued: usize) -> SessionView {
        SessionView {
            state: SessionState::Active,
            current: Some(Track::new("Current Song", 200, "loc://current")),
            queue: (0..queued)
                .map(|i| Track::new(format!("Queued {}", i + 1), 65, format!("loc://{}", i)))
                .collect(),
            volume: 0.5,
            destination: None,
            position: Some(PlaybackPosition::new(Duration::from_secs(100))),
        }
    }

    #[test]
    fn test_seek_bar_positions() {
        assert_eq!(seek_bar(50.0, 100.0).chars().count(), SEEK_LINE.chars().count());
        assert_eq!(seek_bar(200.0, 100.0), seek_bar(100.0, 100.0));
        assert_eq!(seek_bar(-5.0, 100.0), seek_bar(0.0, 100.0));
        assert_eq!(seek_bar(10.0, 0.0), seek_bar(0.0, 100.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_active_with_queue_overflow() {
        let output = vec!["alice, queued your song".to_string()];
        let text = render_status(&active_view(4), &output).await;

        assert!(text.starts_with("alice, queued your song\n"));
        assert!(text.contains("Currently playing\nCurrent Song\n"));
        assert!(text.contains("[01:40/03:20] 🔊 50%"));
        assert!(text.contains("`1.` `[01:05]` **Queued 1**"));
        assert!(text.contains("`2.` `[01:05]` **Queued 2**"));
        assert!(!text.contains("Queued 3"));
        assert!(text.ends_with("(+2 more)"));
    }

    #[tokio::test]
    async fn test_render_idle_shows_prompt_only() {
        let text = render_status(&SessionView::new(0.1), &[]).await;
        assert_eq!(text, PROMPT);
    }

    #[test]
    fn test_reactions_only_while_active() {
        let controls = ReactionControls::new(0.1);
        let idle = SessionView::new(0.5);
        assert!(controls.available(&idle).is_empty());
        assert!(controls.request_for("⏩", User::new("1", "a"), &idle).is_none());

        let active = active_view(0);
        assert_eq!(controls.available(&active).len(), 4);
        assert!(controls.request_for("👍", User::new("1", "a"), &active).is_none());
    }

    #[test]
    fn test_reaction_requests() {
        let controls = ReactionControls::new(0.1);
        let view = active_view(0);
        let user = User::new("1", "a");

        let stop = controls.request_for("⏹", user.clone(), &view).unwrap();
        assert_eq!(stop.command, "stop");

        let down = controls.request_for("🔉", user.clone(), &view).unwrap();
        assert_eq!((down.command.as_str(), down.args[0].as_str()), ("volume", "40"));

        let mut loud = active_view(0);
        loud.volume = 0.95;
        let up = controls.request_for("🔊", user, &loud).unwrap();
        assert_eq!(up.args, vec!["100"]);
    }
}
