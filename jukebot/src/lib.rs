//! # Jukebot Library
//!
//! Voice playback session for a chat music bot.
//!
//! **Purpose:** Queue tracks requested through chat commands, play them one at
//! a time into a voice destination, and report what is happening so a status
//! message can be kept up to date.
//!
//! **Architecture:** Each [`playback::PlaybackSession`] is a single tokio task
//! owning the queue, the voice connection and the live sink. The chat
//! platform, track lookup and voice transport are reached through the traits
//! in [`host`] and [`resolver`].

pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod playback;
pub mod resolver;
pub mod status;
pub mod track;

pub use error::{HostError, ResolveError, Result, SessionError};
pub use playback::{PlaybackSession, SessionConfig, SessionState};
pub use track::Track;
