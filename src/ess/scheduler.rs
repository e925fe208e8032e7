//! Per-channel notification schedule.
//!
//! A channel is `Idle` (no timer), `TimeArmed` (fires every configured
//! interval and always notifies) or `PollArmed` (fires every second and
//! notifies when the decision accepts). [`reconcile`] moves a channel to the
//! state its configuration calls for, touching the timer only when the mode
//! or period actually changes.

use super::trigger::{TriggerMode, TriggerSetting};
use super::uuids::Characteristic;
use crate::transport::{TimerService, TimerToken};
use log::debug;
use serde::Serialize;

/// Cadence of value-driven evaluation.
pub const POLL_PERIOD_MS: u64 = 1000;

/// Shortest time-based period; an interval of 0 s is armed at this period.
pub const MIN_TIME_PERIOD_MS: u64 = 1000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScheduleState {
    Idle,
    TimeArmed { period_ms: u64 },
    PollArmed,
}

impl ScheduleState {
    /// Period of the armed timer, 0 when idle.
    pub fn period_ms(&self) -> u64 {
        match self {
            ScheduleState::Idle => 0,
            ScheduleState::TimeArmed { period_ms } => *period_ms,
            ScheduleState::PollArmed => POLL_PERIOD_MS,
        }
    }

    pub fn is_armed(&self) -> bool {
        !matches!(self, ScheduleState::Idle)
    }
}

/// The state a channel with this configuration should be in.
pub fn desired_state(notify_enabled: bool, trigger: &TriggerSetting) -> ScheduleState {
    if !notify_enabled {
        return ScheduleState::Idle;
    }
    match trigger.mode() {
        TriggerMode::Inactive => ScheduleState::Idle,
        TriggerMode::Time => {
            // 24-bit seconds times 1000 needs more than 32 bits
            let period_ms = (u64::from(trigger.interval_secs()) * 1000).max(MIN_TIME_PERIOD_MS);
            ScheduleState::TimeArmed { period_ms }
        }
        TriggerMode::Value => ScheduleState::PollArmed,
    }
}

/// Scheduling bookkeeping of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSchedule {
    state: ScheduleState,
    token: Option<TimerToken>,
}

impl Default for ChannelSchedule {
    fn default() -> Self {
        Self {
            state: ScheduleState::Idle,
            token: None,
        }
    }
}

impl ChannelSchedule {
    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn token(&self) -> Option<TimerToken> {
        self.token
    }

    /// Period currently armed, 0 when idle.
    pub fn scheduled_period_ms(&self) -> u64 {
        self.state.period_ms()
    }
}

/// Bring `schedule` to `desired`, cancelling and arming timers as needed.
///
/// Returns `true` when the timer was changed.
pub fn reconcile<T: TimerService + ?Sized>(
    schedule: &mut ChannelSchedule,
    channel: Characteristic,
    desired: ScheduleState,
    timers: &T,
) -> bool {
    if schedule.state == desired && schedule.token.is_some() == desired.is_armed() {
        return false;
    }

    if let Some(token) = schedule.token.take() {
        timers.cancel(token);
    }

    schedule.state = desired;
    if desired.is_armed() {
        schedule.token = Some(timers.schedule(channel, desired.period_ms()));
    }

    debug!("[Schedule] {} -> {:?}", channel, desired);
    true
}
