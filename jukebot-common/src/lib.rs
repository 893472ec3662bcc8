//! # Jukebot Common Library
//!
//! Shared code for the jukebot crates:
//! - Session event types and the EventBus
//! - Configuration file resolution and TOML loading
//! - Clock-style time formatting for status displays

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;

pub use error::{Error, Result};
