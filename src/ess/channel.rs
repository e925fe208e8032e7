//! State of one measurement channel.
//!
//! All mutation goes through [`Channel::write_trigger`],
//! [`Channel::write_enablement`] and [`Channel::poll`]. Writes validate fully
//! before touching state and reconcile the schedule before returning, so the
//! next timer fire always sees the new configuration.

use super::codec::Value;
use super::decision::decide;
use super::registry::ChannelSpec;
use super::scheduler::{self, ChannelSchedule, ScheduleState};
use super::trigger::{Condition, TriggerSetting};
use super::uuids::Characteristic;
use crate::error::AttError;
use crate::transport::{TimerService, TimerToken};
use log::debug;
use serde::Serialize;

/// Client Characteristic Configuration write length.
pub const CLIENT_CONFIG_LEN: usize = 2;

const CCC_DISABLE: u8 = 0x00;
const CCC_NOTIFY: u8 = 0x01;

/// One served characteristic with its trigger, enablement and schedule.
pub struct Channel {
    spec: &'static ChannelSpec,
    value: Value,
    notify_enabled: bool,
    indication_echo: u16,
    /// `None` for channels without trigger support
    trigger: Option<TriggerSetting>,
    schedule: ChannelSchedule,
    handle: Option<u16>,
}

impl Channel {
    /// Create a channel with notifications disabled.
    ///
    /// `default_interval_secs` selects a time-based startup trigger; `None`
    /// starts the trigger inactive.
    pub fn new(spec: &'static ChannelSpec, default_interval_secs: Option<u32>) -> Self {
        let trigger = spec.has_trigger.then(|| match default_interval_secs {
            Some(secs) => TriggerSetting::fixed_interval(&spec.format, secs),
            None => TriggerSetting::inactive(&spec.format),
        });

        Self {
            spec,
            value: spec.initial,
            notify_enabled: false,
            indication_echo: 0,
            trigger,
            schedule: ChannelSchedule::default(),
            handle: None,
        }
    }

    pub fn spec(&self) -> &'static ChannelSpec {
        self.spec
    }

    pub fn characteristic(&self) -> Characteristic {
        self.spec.characteristic
    }

    pub fn value(&self) -> Value {
        self.value
    }

    pub fn notify_enabled(&self) -> bool {
        self.notify_enabled
    }

    pub fn indication_echo(&self) -> u16 {
        self.indication_echo
    }

    pub fn trigger(&self) -> Option<&TriggerSetting> {
        self.trigger.as_ref()
    }

    pub fn schedule(&self) -> &ChannelSchedule {
        &self.schedule
    }

    pub fn handle(&self) -> Option<u16> {
        self.handle
    }

    pub fn set_handle(&mut self, handle: u16) {
        self.handle = Some(handle);
    }

    /// Encoded current value.
    pub fn encoded_value(&self) -> Vec<u8> {
        self.spec.format.encode(&self.value)
    }

    /// Encoded trigger setting.
    pub fn encoded_trigger(&self) -> Result<Vec<u8>, AttError> {
        self.trigger
            .as_ref()
            .map(|t| t.encode(&self.spec.format))
            .ok_or(AttError::UnknownChannel(self.characteristic().uuid()))
    }

    /// Apply a trigger setting write.
    pub fn write_trigger<T: TimerService + ?Sized>(
        &mut self,
        bytes: &[u8],
        timers: &T,
    ) -> Result<(), AttError> {
        let current = self.trigger.as_ref().ok_or(AttError::WriteNotPermitted)?;
        let next = current.parse(&self.spec.format, bytes)?;

        if next.condition() == Condition::Inactive {
            self.notify_enabled = false;
            self.indication_echo = 0;
        }

        debug!(
            "[Channel] {} trigger {:?} -> {:?}",
            self.characteristic(),
            current.condition(),
            next.condition()
        );
        self.trigger = Some(next);
        self.reconcile(timers);
        Ok(())
    }

    /// Apply a Client Characteristic Configuration write.
    pub fn write_enablement<T: TimerService + ?Sized>(
        &mut self,
        bytes: &[u8],
        timers: &T,
    ) -> Result<(), AttError> {
        let inactive = match &self.trigger {
            Some(trigger) => trigger.is_inactive(),
            None => return Err(AttError::WriteNotPermitted),
        };
        if bytes.len() != CLIENT_CONFIG_LEN {
            return Err(AttError::InvalidAttributeLength(bytes.len()));
        }

        match bytes[0] {
            value if value == CCC_DISABLE || inactive => {
                self.notify_enabled = false;
                self.indication_echo = 0;
            }
            CCC_NOTIFY => {
                self.notify_enabled = true;
                self.indication_echo = 1;
            }
            other => return Err(AttError::ApplicationError(other)),
        }

        self.reconcile(timers);
        Ok(())
    }

    /// Handle a timer fire with a fresh sample.
    ///
    /// Returns the encoded value to notify, or `None` when the fire is stale
    /// or the decision suppresses it.
    pub fn poll(&mut self, token: TimerToken, sample: Value) -> Option<Vec<u8>> {
        if self.schedule.token() != Some(token) {
            return None;
        }

        match self.schedule.state() {
            ScheduleState::Idle => None,
            ScheduleState::TimeArmed { .. } => {
                self.value = sample;
                Some(self.encoded_value())
            }
            ScheduleState::PollArmed => {
                let trigger = self.trigger.as_ref()?;
                let decision = decide(trigger.condition(), sample, self.value, trigger.threshold());
                self.value = decision.value;
                decision.notify.then(|| self.encoded_value())
            }
        }
    }

    /// Cancel any armed timer regardless of configuration.
    pub fn disarm<T: TimerService + ?Sized>(&mut self, timers: &T) {
        scheduler::reconcile(
            &mut self.schedule,
            self.spec.characteristic,
            ScheduleState::Idle,
            timers,
        );
    }

    fn reconcile<T: TimerService + ?Sized>(&mut self, timers: &T) {
        let desired = match &self.trigger {
            Some(trigger) => scheduler::desired_state(self.notify_enabled, trigger),
            None => ScheduleState::Idle,
        };
        scheduler::reconcile(
            &mut self.schedule,
            self.spec.characteristic,
            desired,
            timers,
        );
    }

    /// Serializable view for diagnostics.
    pub fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            characteristic: self.characteristic(),
            uuid: self.characteristic().uuid(),
            name: self.spec.name,
            handle: self.handle,
            value: self.value,
            notify_enabled: self.notify_enabled,
            trigger: self.trigger.clone(),
            schedule: self.schedule.state(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSnapshot {
    pub characteristic: Characteristic,
    pub uuid: u16,
    pub name: &'static str,
    pub handle: Option<u16>,
    pub value: Value,
    pub notify_enabled: bool,
    pub trigger: Option<TriggerSetting>,
    pub schedule: ScheduleState,
}
