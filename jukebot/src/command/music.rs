//! Music commands: play, skip, stop, volume

use super::parser::{parse_arguments, ParsedArguments};
use super::{Command, CommandResponse, RequestContext, VoiceDirectory};
use crate::error::SessionError;
use crate::playback::PlaybackSession;
use crate::resolver::{is_link, playlist_id, TrackResolver, MAX_SEARCH_RESULTS};
use crate::track::Track;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

fn session_failure(err: SessionError) -> CommandResponse {
    CommandResponse::error(format!("Something went wrong: '{}'", err))
}

/// `play <url|keywords>`: join the requester and queue a track
pub struct PlayCommand {
    session: PlaybackSession,
    resolver: Arc<dyn TrackResolver>,
    voice: Arc<dyn VoiceDirectory>,
}

impl PlayCommand {
    pub fn new(
        session: PlaybackSession,
        resolver: Arc<dyn TrackResolver>,
        voice: Arc<dyn VoiceDirectory>,
    ) -> Self {
        Self {
            session,
            resolver,
            voice,
        }
    }

    fn parse(request: &RequestContext) -> Result<ParsedArguments, CommandResponse> {
        parse_arguments(&request.args)
            .map_err(|_| CommandResponse::error("command format is invalid"))
    }

    /// Make sure the session is in the requester's voice destination
    async fn join_requester(&self, request: &RequestContext) -> Option<CommandResponse> {
        let wanted = self.voice.voice_destination_of(&request.user).await;
        let current = self.session.destination().await;

        match (wanted, current) {
            (None, None) => Some(CommandResponse::error("you must be in a voice channel")),
            // Requester is not in voice; keep playing where we are
            (None, Some(_)) => None,
            (Some(wanted), current) => {
                if current.as_ref() == Some(&wanted) {
                    return None;
                }
                match self.session.connect(wanted).await {
                    Ok(()) => None,
                    Err(e) => {
                        error!("Joining voice for {} failed: {}", request.user.tag, e);
                        Some(CommandResponse::error("I couldn't join your voice channel :("))
                    }
                }
            }
        }
    }

    async fn resolve_link(&self, link: &str) -> Result<Pending, CommandResponse> {
        if playlist_id(link).is_some() {
            return self.resolve_playlist(link).await;
        }
        match self.resolver.resolve_by_locator(link).await {
            Ok(track) => Ok(Pending::single(track, "queued your song")),
            Err(e) => {
                warn!("Resolving {} failed: {}", link, e);
                Err(CommandResponse::error("there is a problem with this song"))
            }
        }
    }

    async fn resolve_playlist(&self, link: &str) -> Result<Pending, CommandResponse> {
        let locators = match self.resolver.playlist_locators(link).await {
            Ok(locators) if !locators.is_empty() => locators,
            Ok(_) => return Err(CommandResponse::error("this playlist is empty")),
            Err(e) => {
                warn!("Expanding playlist {} failed: {}", link, e);
                return Err(CommandResponse::error("there is a problem with this playlist"));
            }
        };
        // Titles are looked up when first displayed
        let tracks: Vec<Track> = locators
            .into_iter()
            .map(|locator| Track::lazy(locator, Arc::clone(&self.resolver)))
            .collect();
        let reply = format!("queued {} songs from the playlist", tracks.len());
        Ok(Pending::Playlist { tracks, reply })
    }

    async fn resolve_search(&self, query: &str, pick: usize) -> Result<Pending, CommandResponse> {
        let results = match self.resolver.search(query).await {
            Ok(results) => results,
            Err(e) => {
                error!("Searching '{}' failed: {}", query, e);
                return Err(CommandResponse::error("problem while searching for songs"));
            }
        };
        let Some(track) = results.into_iter().nth(pick - 1) else {
            return Err(CommandResponse::error(format!("no results for '{}'", query)));
        };
        let title = track.title().await;
        Ok(Pending::single(track, format!("queued {}", title)))
    }

    async fn queue(&self, pending: Pending) -> CommandResponse {
        let (queued, reply) = match pending {
            Pending::Single { track, reply } => (self.session.enqueue(track).await, reply),
            Pending::Playlist { tracks, reply } => (self.session.enqueue_many(tracks).await, reply),
        };
        match queued {
            Ok(()) => CommandResponse::success_with(reply),
            Err(SessionError::Configuration(reason)) => CommandResponse::error(reason),
            Err(e) => session_failure(e),
        }
    }
}

/// Tracks resolved for a play request, not yet queued
enum Pending {
    Single { track: Track, reply: String },
    Playlist { tracks: Vec<Track>, reply: String },
}

impl Pending {
    fn single(track: Track, reply: impl Into<String>) -> Self {
        Pending::Single {
            track,
            reply: reply.into(),
        }
    }
}

/// Search result picked with `-n <1-5>`, first by default
fn result_index(parsed: &ParsedArguments) -> Result<usize, CommandResponse> {
    let Some(option) = parsed.option("n") else {
        return Ok(1);
    };
    option
        .value
        .as_deref()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|index| (1..=MAX_SEARCH_RESULTS).contains(index))
        .ok_or_else(|| {
            CommandResponse::error(format!(
                "-n must be a result number between 1 and {}",
                MAX_SEARCH_RESULTS
            ))
        })
}

#[async_trait]
impl Command for PlayCommand {
    fn name(&self) -> &str {
        "play"
    }

    fn description(&self) -> String {
        "queues a song".to_string()
    }

    fn syntax(&self) -> String {
        "play [-n <result>] <keyword|url>".to_string()
    }

    fn validate(&self, request: &RequestContext) -> CommandResponse {
        let parsed = match Self::parse(request) {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };
        if parsed.body.is_empty() {
            return CommandResponse::error("you must give a url or keyword");
        }
        match result_index(&parsed) {
            Ok(_) => CommandResponse::success(),
            Err(response) => response,
        }
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse {
        let (parsed, pick) = match Self::parse(request)
            .and_then(|parsed| result_index(&parsed).map(|pick| (parsed, pick)))
        {
            Ok(parsed) => parsed,
            Err(response) => return response,
        };

        if self.voice.voice_destination_of(&request.user).await.is_none()
            && !self.session.is_connected().await
        {
            return CommandResponse::error("you must be in a voice channel");
        }

        info!(user = %request.user.tag, query = %parsed.body, "Play request");
        let resolved = if is_link(&parsed.body) {
            self.resolve_link(&parsed.body).await
        } else {
            self.resolve_search(&parsed.body, pick).await
        };
        let pending = match resolved {
            Ok(pending) => pending,
            Err(response) => return response,
        };

        // The session may have left voice while resolving
        if let Some(response) = self.join_requester(request).await {
            return response;
        }
        let response = self.queue(pending).await;
        if !self.session.is_connected().await {
            if let Some(response) = self.join_requester(request).await {
                return response;
            }
        }
        response
    }
}

/// `skip`: end the current track
pub struct SkipCommand {
    session: PlaybackSession,
}

impl SkipCommand {
    pub fn new(session: PlaybackSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Command for SkipCommand {
    fn name(&self) -> &str {
        "skip"
    }

    fn description(&self) -> String {
        "skips the current song".to_string()
    }

    fn syntax(&self) -> String {
        "skip".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, _request: &RequestContext) -> CommandResponse {
        if !self.session.is_active().await {
            return CommandResponse::error("nothing is playing");
        }
        match self.session.skip().await {
            Ok(()) => CommandResponse::success_with("skipped current song"),
            Err(e) => session_failure(e),
        }
    }
}

/// `stop`: clear the queue and stop playback
pub struct StopCommand {
    session: PlaybackSession,
}

impl StopCommand {
    pub fn new(session: PlaybackSession) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Command for StopCommand {
    fn name(&self) -> &str {
        "stop"
    }

    fn description(&self) -> String {
        "stops playback and clears the queue".to_string()
    }

    fn syntax(&self) -> String {
        "stop".to_string()
    }

    fn validate(&self, _request: &RequestContext) -> CommandResponse {
        CommandResponse::success()
    }

    async fn execute(&self, _request: &RequestContext) -> CommandResponse {
        match self.session.stop().await {
            Ok(()) => CommandResponse::success_with("stopped the music"),
            Err(e) => session_failure(e),
        }
    }
}

/// `volume|vol <0-100>`
pub struct VolumeCommand {
    session: PlaybackSession,
}

impl VolumeCommand {
    pub fn new(session: PlaybackSession) -> Self {
        Self { session }
    }

    fn percent(request: &RequestContext) -> Result<f32, CommandResponse> {
        let [value] = request.args.as_slice() else {
            return Err(CommandResponse::error("you must give a new volume value (0-100)"));
        };
        let percent: f32 = value
            .parse()
            .ok()
            .filter(|percent: &f32| percent.is_finite())
            .ok_or_else(|| CommandResponse::error(format!("'{}' is not a valid volume value", value)))?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(CommandResponse::error("volume must be between 0 and 100 (inclusive)"));
        }
        Ok(percent)
    }
}

#[async_trait]
impl Command for VolumeCommand {
    fn name(&self) -> &str {
        "volume"
    }

    fn description(&self) -> String {
        "changes the music volume".to_string()
    }

    fn syntax(&self) -> String {
        "volume|vol <0-100>".to_string()
    }

    fn matches(&self, command: &str) -> bool {
        command == "volume" || command == "vol"
    }

    fn validate(&self, request: &RequestContext) -> CommandResponse {
        match Self::percent(request) {
            Ok(_) => CommandResponse::success(),
            Err(response) => response,
        }
    }

    async fn execute(&self, request: &RequestContext) -> CommandResponse {
        let percent = match Self::percent(request) {
            Ok(percent) => percent,
            Err(response) => return response,
        };
        match self.session.set_volume(percent / 100.0).await {
            Ok(applied) => CommandResponse::success_with(format!("volume set to {:.0}%", applied * 100.0)),
            Err(e) => session_failure(e),
        }
    }
}
