//! Recurring timers on the tokio runtime.
//!
//! Each armed timer is a spawned task ticking at its period and forwarding a
//! [`TimerFired`] event to the engine's event loop. Fires are delivered over a
//! channel instead of running callbacks in place, so channel state is only
//! ever touched from the loop that owns the engine.

use super::{TimerFired, TimerService, TimerToken};
use crate::ess::uuids::Characteristic;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};

/// Timer service backed by tokio interval tasks.
///
/// Must be used from within a tokio runtime.
pub struct TokioTimerService {
    next_token: AtomicU64,
    tasks: Mutex<HashMap<TimerToken, JoinHandle<()>>>,
    fired_tx: mpsc::UnboundedSender<TimerFired>,
}

impl TokioTimerService {
    /// Create the service together with the receiver the event loop drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerFired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let service = Self {
            next_token: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
            fired_tx,
        };
        (service, fired_rx)
    }

    /// Number of timers currently armed.
    pub fn armed(&self) -> usize {
        self.tasks.lock().len()
    }
}

impl TimerService for TokioTimerService {
    fn schedule(&self, channel: Characteristic, period_ms: u64) -> TimerToken {
        let token = TimerToken(self.next_token.fetch_add(1, Ordering::SeqCst));
        let period = Duration::from_millis(period_ms.max(1));
        let tx = self.fired_tx.clone();

        let task = tokio::spawn(async move {
            // First fire one full period after arming
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(TimerFired { channel, token }).is_err() {
                    break;
                }
            }
        });

        debug!("[Timer] armed {:?} for {} every {} ms", token, channel, period_ms);
        self.tasks.lock().insert(token, task);
        token
    }

    fn cancel(&self, token: TimerToken) {
        if let Some(task) = self.tasks.lock().remove(&token) {
            task.abort();
            debug!("[Timer] cancelled {:?}", token);
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }
}
