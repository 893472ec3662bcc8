//! Recent command replies
//!
//! Replies are shown above the status text; only the newest few are kept.

use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::watch;

#[derive(Debug)]
pub struct CommandOutput {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    /// Bumped on every change so renderers can refresh
    changed: watch::Sender<u64>,
}

impl CommandOutput {
    pub fn new(capacity: usize) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
            changed,
        }
    }

    /// Append a reply, dropping the oldest beyond capacity
    pub fn push(&self, line: impl Into<String>) {
        {
            let mut lines = self.lines.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            lines.push_back(line.into());
            while lines.len() > self.capacity {
                lines.pop_front();
            }
        }
        self.changed.send_modify(|version| *version += 1);
    }

    /// Drop every reply
    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
        self.changed.send_modify(|version| *version += 1);
    }

    /// Oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    /// Receiver notified whenever the output changes
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }
}
