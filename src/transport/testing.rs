//! Deterministic collaborators for unit tests.

use super::{Notifier, SampleSource, TimerFired, TimerService, TimerToken};
use crate::ess::codec::{Value, ValueFormat};
use crate::ess::registry::ValidRange;
use crate::ess::uuids::Characteristic;
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};

/// Records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(u16, Vec<u8>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(u16, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, handle: u16, value: &[u8]) {
        self.sent.lock().push((handle, value.to_vec()));
    }
}

/// Timer service that never fires on its own; tests fire timers explicitly.
#[derive(Default)]
pub struct ManualTimerService {
    next_token: Mutex<u64>,
    armed: Mutex<BTreeMap<TimerToken, (Characteristic, u64)>>,
    schedule_calls: Mutex<usize>,
}

impl ManualTimerService {
    /// The timer armed for `channel` and its period, if any.
    pub fn armed_for(&self, channel: Characteristic) -> Option<(TimerToken, u64)> {
        self.armed
            .lock()
            .iter()
            .find(|(_, (c, _))| *c == channel)
            .map(|(token, (_, period))| (*token, *period))
    }

    pub fn armed_count(&self) -> usize {
        self.armed.lock().len()
    }

    /// Total number of `schedule` calls so far.
    pub fn schedule_calls(&self) -> usize {
        *self.schedule_calls.lock()
    }

    /// Build the fire event for the timer armed on `channel`.
    pub fn fire(&self, channel: Characteristic) -> Option<TimerFired> {
        self.armed_for(channel)
            .map(|(token, _)| TimerFired { channel, token })
    }
}

impl TimerService for ManualTimerService {
    fn schedule(&self, channel: Characteristic, period_ms: u64) -> TimerToken {
        let mut next = self.next_token.lock();
        *next += 1;
        let token = TimerToken(*next);
        self.armed.lock().insert(token, (channel, period_ms));
        *self.schedule_calls.lock() += 1;
        token
    }

    fn cancel(&self, token: TimerToken) {
        self.armed.lock().remove(&token);
    }
}

/// Returns queued samples in order, then repeats the last one.
#[derive(Default)]
pub struct ScriptedSource {
    queue: VecDeque<Value>,
    last: Option<Value>,
}

impl ScriptedSource {
    pub fn push(&mut self, value: Value) {
        self.queue.push_back(value);
    }
}

impl SampleSource for ScriptedSource {
    fn sample(
        &mut self,
        _channel: Characteristic,
        format: &ValueFormat,
        _range: &ValidRange,
    ) -> Value {
        if let Some(next) = self.queue.pop_front() {
            self.last = Some(next);
        }
        self.last.unwrap_or_else(|| Value::splat(0, format.dims))
    }
}
