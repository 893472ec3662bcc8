//! Queue disciplines
//!
//! A discipline decides which track plays next. It is consulted on every
//! transition and is the only place queue order policy lives; connection and
//! sink lifecycle is shared by all disciplines.

use crate::track::Track;
use std::collections::VecDeque;

/// Why the session is looking for the next track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Nothing was playing (first enqueue, enqueue while draining, connect)
    Start,
    /// The previous track played to its end
    Finished,
    /// The previous track was skipped
    Skipped,
    /// The previous track could not be started or broke mid-stream
    Failed,
}

/// Strategy deciding the next track
pub trait QueueDiscipline: Send + Sync + 'static {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Whether `enqueue_many` is meaningful for this discipline
    fn supports_bulk_enqueue(&self) -> bool {
        true
    }

    /// Pick the next track, popping it from `queue` if it comes from there
    ///
    /// `previous` is the track that was current (or failed to start) when the
    /// transition began.
    fn next_track(
        &mut self,
        queue: &mut VecDeque<Track>,
        previous: Option<&Track>,
        cause: Advance,
    ) -> Option<Track>;
}

/// Plays the queue front to back
#[derive(Debug, Default, Clone, Copy)]
pub struct FifoQueue;

impl QueueDiscipline for FifoQueue {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn next_track(
        &mut self,
        queue: &mut VecDeque<Track>,
        _previous: Option<&Track>,
        _cause: Advance,
    ) -> Option<Track> {
        queue.pop_front()
    }
}

/// Repeats the current track until it is skipped or fails
///
/// After a skip or a failure the front of the queue is taken instead, so a
/// broken track cannot loop forever.
#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatOne;

impl QueueDiscipline for RepeatOne {
    fn name(&self) -> &'static str {
        "repeat-one"
    }

    fn supports_bulk_enqueue(&self) -> bool {
        false
    }

    fn next_track(
        &mut self,
        queue: &mut VecDeque<Track>,
        previous: Option<&Track>,
        cause: Advance,
    ) -> Option<Track> {
        match (cause, previous) {
            (Advance::Finished, Some(track)) => Some(track.clone()),
            _ => queue.pop_front(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_of(titles: &[&str]) -> VecDeque<Track> {
        titles
            .iter()
            .map(|title| Track::new(*title, 60, format!("loc://{}", title)))
            .collect()
    }

    #[test]
    fn test_fifo_pops_front_regardless_of_cause() {
        let mut queue = queue_of(&["a", "b"]);
        let previous = Track::new("x", 1, "loc://x");
        let mut fifo = FifoQueue;

        let next = fifo.next_track(&mut queue, Some(&previous), Advance::Finished);
        assert_eq!(next.unwrap().locator(), "loc://a");
        let next = fifo.next_track(&mut queue, None, Advance::Skipped);
        assert_eq!(next.unwrap().locator(), "loc://b");
        assert!(fifo.next_track(&mut queue, None, Advance::Start).is_none());
        assert!(fifo.supports_bulk_enqueue());
    }

    #[test]
    fn test_repeat_one_replays_after_natural_end() {
        let mut queue = queue_of(&["a"]);
        let current = Track::new("x", 1, "loc://x");
        let mut repeat = RepeatOne;

        let next = repeat.next_track(&mut queue, Some(&current), Advance::Finished);
        assert_eq!(next.as_ref(), Some(&current));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_repeat_one_moves_on_after_skip_or_failure() {
        let mut queue = queue_of(&["a", "b"]);
        let current = Track::new("x", 1, "loc://x");
        let mut repeat = RepeatOne;

        let next = repeat.next_track(&mut queue, Some(&current), Advance::Skipped);
        assert_eq!(next.unwrap().locator(), "loc://a");
        let next = repeat.next_track(&mut queue, Some(&current), Advance::Failed);
        assert_eq!(next.unwrap().locator(), "loc://b");
        assert!(repeat
            .next_track(&mut queue, Some(&current), Advance::Failed)
            .is_none());
        assert!(!repeat.supports_bulk_enqueue());
    }
}
