//! Playback session and queue management
//!
//! A session owns one queue, at most one voice connection and at most one
//! live sink. Its lifecycle:
//!
//! ```text
//!  Idle --connect+enqueue--> Active --queue empty--> Draining --leave timer--> Idle
//!                              ^                        |
//!                              +-------enqueue----------+
//! ```

pub mod discipline;
mod session;
mod task;
mod timers;
pub mod view;

pub use discipline::{Advance, FifoQueue, QueueDiscipline, RepeatOne};
pub use jukebot_common::events::SessionState;
pub use session::{PlaybackSession, SessionConfig};
pub use view::{PlaybackPosition, SessionView};
