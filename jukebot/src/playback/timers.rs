//! Quiescence timers
//!
//! Each timer is a small task that posts a generation-tagged [`TimerFired`]
//! to the session task. Cancelling aborts the task and drops its handle, so a
//! fire that was already in the channel no longer matches a live handle and
//! is ignored.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TimerKind {
    /// Releases the connection after the queue stayed empty
    Leave,
    /// Periodic status refresh while active
    StatusTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TimerFired {
    pub kind: TimerKind,
    pub generation: u64,
}

struct TimerHandle {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub(super) struct Timers {
    tx: mpsc::UnboundedSender<TimerFired>,
    leave_delay: Duration,
    status_interval: Duration,
    generation: u64,
    leave: Option<TimerHandle>,
    ticker: Option<TimerHandle>,
}

impl Timers {
    pub fn new(
        tx: mpsc::UnboundedSender<TimerFired>,
        leave_delay: Duration,
        status_interval: Duration,
    ) -> Self {
        Self {
            tx,
            leave_delay,
            status_interval,
            generation: 0,
            leave: None,
            ticker: None,
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Arm the leave timer unless it is already running
    pub fn arm_leave(&mut self) {
        if self.leave.is_some() {
            return;
        }
        let generation = self.next_generation();
        let tx = self.tx.clone();
        let delay = self.leave_delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerFired {
                kind: TimerKind::Leave,
                generation,
            });
        });
        debug!(generation, delay_ms = delay.as_millis() as u64, "Leave timer armed");
        self.leave = Some(TimerHandle { generation, task });
    }

    pub fn cancel_leave(&mut self) {
        if let Some(handle) = self.leave.take() {
            debug!(generation = handle.generation, "Leave timer cancelled");
        }
    }

    #[cfg(test)]
    pub fn leave_armed(&self) -> bool {
        self.leave.is_some()
    }

    /// Consume a leave fire; false if that timer was cancelled meanwhile
    pub fn take_leave(&mut self, generation: u64) -> bool {
        match &self.leave {
            Some(handle) if handle.generation == generation => {
                self.leave = None;
                true
            }
            _ => false,
        }
    }

    /// Start the status ticker unless it is running (zero interval disables it)
    pub fn start_ticker(&mut self) {
        if self.ticker.is_some() || self.status_interval.is_zero() {
            return;
        }
        let generation = self.next_generation();
        let tx = self.tx.clone();
        let period = self.status_interval;
        let task = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let fired = TimerFired {
                    kind: TimerKind::StatusTick,
                    generation,
                };
                if tx.send(fired).is_err() {
                    break;
                }
            }
        });
        self.ticker = Some(TimerHandle { generation, task });
    }

    pub fn stop_ticker(&mut self) {
        self.ticker = None;
    }

    #[cfg(test)]
    pub fn ticker_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether a tick belongs to the live ticker
    pub fn is_live_tick(&self, generation: u64) -> bool {
        matches!(&self.ticker, Some(handle) if handle.generation == generation)
    }

    pub fn cancel_all(&mut self) {
        self.cancel_leave();
        self.stop_ticker();
    }
}
