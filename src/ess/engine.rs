//! The notification engine: every channel plus the collaborators it drives.
//!
//! `EssEngine` is owned by a single event loop. Attribute reads and writes
//! from the transport and timer fires from the timer service are all handled
//! through `&mut self`, which serializes access to channel state.

use super::channel::{Channel, ChannelSnapshot};
use super::descriptors::read_at_offset;
use super::registry::CATALOG;
use super::scheduler::ScheduleState;
use super::uuids::{
    CLIENT_CONFIG_UUID, Characteristic, MEASUREMENT_UUID, TRIGGER_SETTING_UUID,
    USER_DESCRIPTION_UUID, VALID_RANGE_UUID,
};
use crate::error::AttError;
use crate::transport::{Notifier, SampleSource, TimerFired, TimerService};
use log::{debug, info, warn};

/// Every channel of the service plus the collaborators that drive them.
pub struct EssEngine<N, T, S> {
    channels: Vec<Channel>,
    notifier: N,
    timers: T,
    source: S,
}

impl<N, T, S> EssEngine<N, T, S>
where
    N: Notifier,
    T: TimerService,
    S: SampleSource,
{
    /// Build one channel per catalog entry.
    ///
    /// `default_interval_secs` selects a time-based startup trigger for every
    /// trigger-capable channel; `None` starts them inactive.
    pub fn new(notifier: N, timers: T, source: S, default_interval_secs: Option<u32>) -> Self {
        let channels = CATALOG
            .iter()
            .map(|spec| Channel::new(spec, default_interval_secs))
            .collect();

        Self {
            channels,
            notifier,
            timers,
            source,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn channel(&self, characteristic: Characteristic) -> Result<&Channel, AttError> {
        self.channels
            .iter()
            .find(|c| c.characteristic() == characteristic)
            .ok_or(AttError::UnknownChannel(characteristic.uuid()))
    }

    fn channel_mut(&mut self, characteristic: Characteristic) -> Result<&mut Channel, AttError> {
        self.channels
            .iter_mut()
            .find(|c| c.characteristic() == characteristic)
            .ok_or(AttError::UnknownChannel(characteristic.uuid()))
    }

    /// Record the value handle the attribute database assigned to a channel.
    pub fn bind_handle(
        &mut self,
        characteristic: Characteristic,
        handle: u16,
    ) -> Result<(), AttError> {
        self.channel_mut(characteristic)?.set_handle(handle);
        Ok(())
    }

    /// Resolve a characteristic UUID to a served channel.
    pub fn resolve_uuid(&self, uuid: u16) -> Result<Characteristic, AttError> {
        let characteristic =
            Characteristic::from_repr(uuid).ok_or(AttError::UnknownChannel(uuid))?;
        self.channel(characteristic).map(Channel::characteristic)
    }

    /// Resolve a value handle to its channel.
    pub fn resolve_handle(&self, handle: u16) -> Result<Characteristic, AttError> {
        self.channels
            .iter()
            .find(|c| c.handle() == Some(handle))
            .map(Channel::characteristic)
            .ok_or(AttError::UnknownChannel(handle))
    }

    pub fn read_value(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let bytes = self.channel(characteristic)?.encoded_value();
        read_at_offset(&bytes, offset).ok_or(AttError::InvalidOffset(offset))
    }

    pub fn read_trigger(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let bytes = self.channel(characteristic)?.encoded_trigger()?;
        read_at_offset(&bytes, offset).ok_or(AttError::InvalidOffset(offset))
    }

    /// Write the ES Trigger Setting descriptor.
    pub fn write_trigger(
        &mut self,
        characteristic: Characteristic,
        offset: u16,
        bytes: &[u8],
    ) -> Result<(), AttError> {
        if offset != 0 {
            return Err(AttError::InvalidOffset(offset));
        }
        let timers = &self.timers;
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.characteristic() == characteristic)
            .ok_or(AttError::UnknownChannel(characteristic.uuid()))?;

        match channel.write_trigger(bytes, timers) {
            Ok(()) => {
                info!(
                    "{} trigger set to {:02X?} ({:?})",
                    characteristic,
                    bytes,
                    channel.schedule().state()
                );
                Ok(())
            }
            Err(e) => {
                debug!("{} trigger write {:02X?} rejected: {}", characteristic, bytes, e);
                Err(e)
            }
        }
    }

    pub fn read_enablement(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let echo = self.channel(characteristic)?.indication_echo();
        read_at_offset(&echo.to_le_bytes(), offset).ok_or(AttError::InvalidOffset(offset))
    }

    /// Write the Client Characteristic Configuration descriptor.
    pub fn write_enablement(
        &mut self,
        characteristic: Characteristic,
        offset: u16,
        bytes: &[u8],
    ) -> Result<(), AttError> {
        let timers = &self.timers;
        let channel = self
            .channels
            .iter_mut()
            .find(|c| c.characteristic() == characteristic)
            .ok_or(AttError::UnknownChannel(characteristic.uuid()))?;

        // Length is checked ahead of the offset
        if bytes.len() == super::channel::CLIENT_CONFIG_LEN && offset != 0 {
            return Err(AttError::InvalidOffset(offset));
        }

        match channel.write_enablement(bytes, timers) {
            Ok(()) => {
                info!(
                    "{} notifications {}",
                    characteristic,
                    if channel.notify_enabled() { "enabled" } else { "disabled" }
                );
                Ok(())
            }
            Err(e) => {
                debug!(
                    "{} client config write {:02X?} rejected: {}",
                    characteristic, bytes, e
                );
                Err(e)
            }
        }
    }

    pub fn read_valid_range(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let spec = self.channel(characteristic)?.spec();
        let bytes = spec.range.encode(&spec.format);
        read_at_offset(&bytes, offset).ok_or(AttError::InvalidOffset(offset))
    }

    /// ES Measurement descriptor bytes.
    pub fn read_descriptor_metadata(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let bytes = self.channel(characteristic)?.spec().measurement.encode();
        read_at_offset(&bytes, offset).ok_or(AttError::InvalidOffset(offset))
    }

    pub fn read_user_description(
        &self,
        characteristic: Characteristic,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        let name = self.channel(characteristic)?.spec().name;
        read_at_offset(name.as_bytes(), offset).ok_or(AttError::InvalidOffset(offset))
    }

    /// Read a descriptor of `characteristic` by its descriptor UUID.
    pub fn read_descriptor(
        &self,
        characteristic: Characteristic,
        descriptor: u16,
        offset: u16,
    ) -> Result<Vec<u8>, AttError> {
        match descriptor {
            USER_DESCRIPTION_UUID => self.read_user_description(characteristic, offset),
            CLIENT_CONFIG_UUID => self.read_enablement(characteristic, offset),
            VALID_RANGE_UUID => self.read_valid_range(characteristic, offset),
            MEASUREMENT_UUID => self.read_descriptor_metadata(characteristic, offset),
            TRIGGER_SETTING_UUID => self.read_trigger(characteristic, offset),
            other => Err(AttError::UnknownChannel(other)),
        }
    }

    /// Write a descriptor of `characteristic` by its descriptor UUID.
    ///
    /// Only the trigger setting and client configuration are writable.
    pub fn write_descriptor(
        &mut self,
        characteristic: Characteristic,
        descriptor: u16,
        offset: u16,
        bytes: &[u8],
    ) -> Result<(), AttError> {
        match descriptor {
            TRIGGER_SETTING_UUID => self.write_trigger(characteristic, offset, bytes),
            CLIENT_CONFIG_UUID => self.write_enablement(characteristic, offset, bytes),
            USER_DESCRIPTION_UUID | VALID_RANGE_UUID | MEASUREMENT_UUID => {
                self.channel(characteristic)?;
                Err(AttError::WriteNotPermitted)
            }
            other => Err(AttError::UnknownChannel(other)),
        }
    }

    /// Handle a timer fire: sample, decide, and notify.
    pub fn on_timer(&mut self, fired: TimerFired) {
        let Some(channel) = self
            .channels
            .iter_mut()
            .find(|c| c.characteristic() == fired.channel)
        else {
            return;
        };

        if channel.schedule().token() != Some(fired.token) {
            debug!("{} dropping stale fire {:?}", fired.channel, fired.token);
            return;
        }

        let spec = channel.spec();
        let sample = self.source.sample(fired.channel, &spec.format, &spec.range);
        let Some(bytes) = channel.poll(fired.token, sample) else {
            return;
        };

        match channel.handle() {
            Some(handle) => self.notifier.notify(handle, &bytes),
            None => warn!("{} has no bound handle, notification dropped", fired.channel),
        }
    }

    pub fn schedule_state(
        &self,
        characteristic: Characteristic,
    ) -> Result<ScheduleState, AttError> {
        Ok(self.channel(characteristic)?.schedule().state())
    }

    pub fn snapshot(&self) -> Vec<ChannelSnapshot> {
        self.channels.iter().map(Channel::snapshot).collect()
    }

    /// Cancel every armed timer.
    pub fn shutdown(&mut self) {
        let timers = &self.timers;
        for channel in self.channels.iter_mut() {
            channel.disarm(timers);
        }
        info!("All channel timers cancelled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ess::codec::Value;
    use crate::transport::testing::{ManualTimerService, RecordingNotifier, ScriptedSource};
    use strum::IntoEnumIterator;

    type TestEngine = EssEngine<RecordingNotifier, ManualTimerService, ScriptedSource>;

    fn engine() -> TestEngine {
        let mut engine = EssEngine::new(
            RecordingNotifier::default(),
            ManualTimerService::default(),
            ScriptedSource::default(),
            None,
        );
        for (i, characteristic) in Characteristic::iter().enumerate() {
            engine.bind_handle(characteristic, 0x0010 + i as u16 * 8).unwrap();
        }
        engine
    }

    fn fire(engine: &mut TestEngine, characteristic: Characteristic) {
        let fired = engine.timers().fire(characteristic).expect("no timer armed");
        engine.on_timer(fired);
    }

    fn assert_invariant(engine: &TestEngine) {
        for channel in engine.channels() {
            let should_arm = channel.notify_enabled()
                && channel.trigger().is_some_and(|t| !t.is_inactive());
            let armed = engine.timers().armed_for(channel.characteristic()).is_some();
            assert_eq!(should_arm, armed, "{}", channel.characteristic());
        }
    }

    #[test]
    fn test_time_based_scenario() {
        let mut engine = engine();
        let temp = Characteristic::Temperature;
        let handle = engine.channel(temp).unwrap().handle().unwrap();

        engine.write_trigger(temp, 0, &[0x01, 0x05, 0x00, 0x00]).unwrap();
        assert_eq!(engine.schedule_state(temp).unwrap(), ScheduleState::Idle);
        engine.write_enablement(temp, 0, &[0x01, 0x00]).unwrap();
        assert_eq!(
            engine.schedule_state(temp).unwrap(),
            ScheduleState::TimeArmed { period_ms: 5000 }
        );
        assert_eq!(engine.timers().armed_for(temp).map(|(_, p)| p), Some(5000));

        engine.source.push(Value::scalar(-150));
        fire(&mut engine, temp);
        assert_eq!(engine.notifier().sent(), vec![(handle, vec![0x6A, 0xFF])]);
        assert_eq!(engine.read_value(temp, 0).unwrap(), vec![0x6A, 0xFF]);
        assert_invariant(&engine);
    }

    #[test]
    fn test_threshold_poll_filters() {
        let mut engine = engine();
        let humidity = Characteristic::Humidity;
        // Notify while below 50.00 %
        engine.write_trigger(humidity, 0, &[0x04, 0x88, 0x13]).unwrap();
        engine.write_enablement(humidity, 0, &[0x01, 0x00]).unwrap();
        assert_eq!(engine.schedule_state(humidity).unwrap(), ScheduleState::PollArmed);
        assert_eq!(engine.timers().armed_for(humidity).map(|(_, p)| p), Some(1000));

        for sample in [4999, 5000, 5001] {
            engine.source.push(Value::scalar(sample));
            fire(&mut engine, humidity);
        }
        let sent = engine.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, 4999u16.to_le_bytes().to_vec());
    }

    #[test]
    fn test_vector_threshold_scenario() {
        let mut engine = engine();
        let flux = Characteristic::MagneticFluxDensity2D;
        engine
            .write_trigger(flux, 0, &[0x07, 0x0A, 0x00, 0x14, 0x00])
            .unwrap();
        engine.write_enablement(flux, 0, &[0x01, 0x00]).unwrap();

        engine.source.push(Value::xy(15, 5));
        fire(&mut engine, flux);
        let sent = engine.notifier().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, vec![0x0F, 0x00, 0x05, 0x00]);
    }

    #[test]
    fn test_reserved_code_leaves_state_untouched() {
        let mut engine = engine();
        let wind = Characteristic::TrueWindSpeed;
        engine.write_trigger(wind, 0, &[0x03]).unwrap();
        let before = engine.read_trigger(wind, 0).unwrap();

        for bytes in [&[15u8][..], &[15, 1][..], &[15, 1, 2, 3][..]] {
            assert_eq!(
                engine.write_trigger(wind, 0, bytes),
                Err(AttError::OutOfRange(15))
            );
        }
        assert_eq!(engine.read_trigger(wind, 0).unwrap(), before);
    }

    #[test]
    fn test_inactive_write_from_any_state() {
        let mut engine = engine();
        let priors: [&[u8]; 3] = [&[0x01, 0x02, 0x00, 0x00], &[0x03], &[0x08, 0x05]];
        for prior in priors {
            let uv = Characteristic::UvIndex;
            engine.write_trigger(uv, 0, prior).unwrap();
            engine.write_enablement(uv, 0, &[0x01, 0x00]).unwrap();
            engine.write_trigger(uv, 0, &[0x00]).unwrap();

            let channel = engine.channel(uv).unwrap();
            assert!(channel.trigger().unwrap().is_inactive());
            assert!(!channel.notify_enabled());
            assert!(engine.timers().armed_for(uv).is_none());
            assert_eq!(engine.read_enablement(uv, 0).unwrap(), vec![0x00, 0x00]);
        }
        assert_invariant(&engine);
    }

    #[test]
    fn test_invariant_across_write_sequence() {
        let mut engine = engine();
        let dew = Characteristic::DewPoint;
        let writes: [(bool, &[u8]); 10] = [
            (false, &[0x01, 0x00]),
            (true, &[0x03]),
            (false, &[0x01, 0x00]),
            (true, &[0x05, 0xF6]),
            (true, &[0x0A]),
            (false, &[0x07, 0x00]),
            (true, &[0x01, 0x03, 0x00, 0x00]),
            (false, &[0x00, 0x00]),
            (false, &[0x01, 0x00]),
            (true, &[0x00]),
        ];
        for (is_trigger, bytes) in writes {
            let _ = if is_trigger {
                engine.write_trigger(dew, 0, bytes)
            } else {
                engine.write_enablement(dew, 0, bytes)
            };
            assert_invariant(&engine);
        }
    }

    #[test]
    fn test_offsets() {
        let mut engine = engine();
        let temp = Characteristic::Temperature;
        assert_eq!(
            engine.write_trigger(temp, 1, &[0x03]),
            Err(AttError::InvalidOffset(1))
        );
        assert_eq!(
            engine.write_enablement(temp, 1, &[0x01, 0x00]),
            Err(AttError::InvalidOffset(1))
        );
        assert_eq!(
            engine.write_enablement(temp, 1, &[0x01]),
            Err(AttError::InvalidAttributeLength(1))
        );
        assert_eq!(engine.read_enablement(temp, 2).unwrap(), Vec::<u8>::new());
        assert_eq!(
            engine.read_enablement(temp, 3),
            Err(AttError::InvalidOffset(3))
        );
        assert_eq!(engine.read_value(temp, 1).unwrap(), vec![0x0A]);
    }

    #[test]
    fn test_static_descriptors() {
        let engine = engine();
        let temp = Characteristic::Temperature;
        assert_eq!(
            engine.read_valid_range(temp, 0).unwrap(),
            vec![0x60, 0xF0, 0x34, 0x21]
        );
        assert_eq!(engine.read_descriptor_metadata(temp, 0).unwrap().len(), 11);
        assert_eq!(
            engine.read_user_description(temp, 0).unwrap(),
            b"Temperature".to_vec()
        );
        assert_eq!(
            engine.read_user_description(temp, 4).unwrap(),
            b"erature".to_vec()
        );
    }

    #[test]
    fn test_read_only_trend_channel() {
        let mut engine = engine();
        let trend = Characteristic::BarometricPressureTrend;
        assert_eq!(engine.read_value(trend, 0).unwrap(), vec![0x00]);
        assert_eq!(
            engine.write_trigger(trend, 0, &[0x03]),
            Err(AttError::WriteNotPermitted)
        );
        assert!(engine.read_trigger(trend, 0).is_err());
    }

    #[test]
    fn test_stale_fire_after_disable_is_dropped() {
        let mut engine = engine();
        let rain = Characteristic::Rainfall;
        engine.write_trigger(rain, 0, &[0x01, 0x01, 0x00, 0x00]).unwrap();
        engine.write_enablement(rain, 0, &[0x01, 0x00]).unwrap();
        let fired = engine.timers().fire(rain).unwrap();
        engine.write_enablement(rain, 0, &[0x00, 0x00]).unwrap();

        engine.on_timer(fired);
        assert!(engine.notifier().sent().is_empty());
    }

    #[test]
    fn test_resolve_and_shutdown() {
        let mut engine = engine();
        assert_eq!(engine.resolve_uuid(0x2A6F), Ok(Characteristic::Humidity));
        assert_eq!(
            engine.resolve_uuid(0x2A00),
            Err(AttError::UnknownChannel(0x2A00))
        );
        let handle = engine.channel(Characteristic::Pressure).unwrap().handle().unwrap();
        assert_eq!(engine.resolve_handle(handle), Ok(Characteristic::Pressure));

        engine.write_trigger(Characteristic::Pressure, 0, &[0x03]).unwrap();
        engine
            .write_enablement(Characteristic::Pressure, 0, &[0x01, 0x00])
            .unwrap();
        assert_eq!(engine.timers().armed_count(), 1);
        engine.shutdown();
        assert_eq!(engine.timers().armed_count(), 0);
    }

    #[test]
    fn test_snapshot_reports_schedule() {
        let mut engine = engine();
        let temp = Characteristic::Temperature;
        engine.write_trigger(temp, 0, &[0x03]).unwrap();
        engine.write_enablement(temp, 0, &[0x01, 0x00]).unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.len(), 20);
        let json = serde_json::to_value(&snapshot[0]).unwrap();
        assert_eq!(json["name"], "Temperature");
        assert_eq!(json["uuid"], 0x2A6E);
        assert_eq!(json["value"], 2700);
        assert_eq!(json["notify_enabled"], true);
        assert_eq!(json["schedule"]["state"], "poll_armed");
    }

    #[test]
    fn test_descriptor_dispatch() {
        let mut engine = engine();
        let temp = Characteristic::Temperature;

        engine
            .write_descriptor(temp, TRIGGER_SETTING_UUID, 0, &[0x01, 0x02, 0x00, 0x00])
            .unwrap();
        engine
            .write_descriptor(temp, CLIENT_CONFIG_UUID, 0, &[0x01, 0x00])
            .unwrap();
        assert_eq!(
            engine.read_descriptor(temp, TRIGGER_SETTING_UUID, 0).unwrap(),
            vec![0x01, 0x02, 0x00, 0x00]
        );
        assert_eq!(
            engine.read_descriptor(temp, CLIENT_CONFIG_UUID, 0).unwrap(),
            vec![0x01, 0x00]
        );
        assert_eq!(
            engine.read_descriptor(temp, USER_DESCRIPTION_UUID, 0).unwrap(),
            b"Temperature".to_vec()
        );
        assert_eq!(
            engine.read_descriptor(temp, VALID_RANGE_UUID, 0).unwrap(),
            engine.read_valid_range(temp, 0).unwrap()
        );
        assert_eq!(
            engine.read_descriptor(temp, MEASUREMENT_UUID, 0).unwrap().len(),
            11
        );

        assert_eq!(
            engine.write_descriptor(temp, VALID_RANGE_UUID, 0, &[0x00]),
            Err(AttError::WriteNotPermitted)
        );
        assert_eq!(
            engine.read_descriptor(temp, 0x2904, 0),
            Err(AttError::UnknownChannel(0x2904))
        );
        assert_eq!(
            engine.schedule_state(temp).unwrap(),
            ScheduleState::TimeArmed { period_ms: 2000 }
        );
    }
}
