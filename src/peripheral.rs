//! Wiring of the engine to its runtime collaborators.

use crate::config::{Config, DeviceConfig, SubscriberConfig};
use crate::error::{EssError, Result};
use crate::ess::EssEngine;
use crate::ess::uuids::SERVICE_UUID;
use crate::transport::{
    LoggingNotifier, Notifier, RandomSampleSource, SampleSource, TimerService, TokioTimerService,
};
use log::{debug, info, warn};
use std::future::Future;

/// Assign value handles to channels in catalog order.
pub fn bind_handles<N, T, S>(engine: &mut EssEngine<N, T, S>, device: &DeviceConfig) -> Result<()>
where
    N: Notifier,
    T: TimerService,
    S: SampleSource,
{
    let characteristics: Vec<_> = engine.channels().map(|c| c.characteristic()).collect();
    for (i, characteristic) in characteristics.into_iter().enumerate() {
        let handle = u16::try_from(i)
            .ok()
            .and_then(|i| i.checked_mul(device.handle_stride))
            .and_then(|offset| device.handle_base.checked_add(offset))
            .ok_or_else(|| EssError::InvalidConfig("handle range overflows u16".to_string()))?;
        engine.bind_handle(characteristic, handle)?;
    }
    Ok(())
}

/// Configure and enable the channels a simulated subscriber asks for.
pub fn apply_subscriber<N, T, S>(
    engine: &mut EssEngine<N, T, S>,
    subscriber: &SubscriberConfig,
) -> Result<()>
where
    N: Notifier,
    T: TimerService,
    S: SampleSource,
{
    let characteristics = subscriber.characteristics()?;
    if characteristics.is_empty() {
        return Ok(());
    }

    let trigger = subscriber.trigger_bytes()?;
    for characteristic in characteristics {
        engine.write_trigger(characteristic, 0, &trigger)?;
        engine.write_enablement(characteristic, 0, &[0x01, 0x00])?;
        if !engine.channel(characteristic)?.notify_enabled() {
            warn!("{} stays disabled: trigger {:02X?} is inactive", characteristic, trigger);
        }
    }
    Ok(())
}

/// Run the peripheral until `shutdown` resolves.
pub async fn run(config: Config, shutdown: impl Future<Output = ()>) -> Result<()> {
    let (timers, mut fired_rx) = TokioTimerService::new();
    let mut engine = EssEngine::new(
        LoggingNotifier::new(),
        timers,
        RandomSampleSource::new(config.sampling.seed),
        config.sampling.default_interval_secs,
    );

    bind_handles(&mut engine, &config.device)?;
    apply_subscriber(&mut engine, &config.subscriber)?;

    let active = engine.channels().filter(|c| c.notify_enabled()).count();
    info!(
        "{} serving service 0x{:04X} with {} channels ({} notifying)",
        config.device.device_name,
        SERVICE_UUID,
        engine.channels().count(),
        active
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            fired = fired_rx.recv() => match fired {
                Some(fired) => engine.on_timer(fired),
                None => break,
            },
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    engine.shutdown();
    match serde_json::to_string(&engine.snapshot()) {
        Ok(state) => debug!("Final channel state: {}", state),
        Err(e) => warn!("Failed to serialize channel state: {}", e),
    }
    info!("{} notifications sent", engine.notifier().sent());
    Ok(())
}
