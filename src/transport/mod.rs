//! Collaborators the notification engine consumes.
//!
//! The attribute transport pushes notifications, a timer service drives the
//! recurring evaluation, and a sample source supplies measurements. The
//! engine only sees these traits, so a BLE stack, a sensor driver or the test
//! doubles in [`testing`] can be plugged in without touching it.

mod logging;
mod sample;
mod timer;

#[cfg(test)]
pub mod testing;

pub use logging::LoggingNotifier;
pub use sample::RandomSampleSource;
pub use timer::TokioTimerService;

use crate::ess::codec::{Value, ValueFormat};
use crate::ess::registry::ValidRange;
use crate::ess::uuids::Characteristic;

/// Opaque handle of an armed recurring timer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

/// Delivered to the engine each time a recurring timer elapses.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimerFired {
    pub channel: Characteristic,
    pub token: TimerToken,
}

/// Pushes a value notification to the subscriber of `handle`.
///
/// Best effort: delivery failures are the transport's concern and are not
/// reported back.
pub trait Notifier {
    fn notify(&self, handle: u16, value: &[u8]);
}

/// Recurring timer primitive.
pub trait TimerService {
    /// Arm a timer that fires for `channel` every `period_ms`.
    fn schedule(&self, channel: Characteristic, period_ms: u64) -> TimerToken;

    /// Disarm a timer. Cancelling an unknown token is a no-op.
    ///
    /// A fire already in flight may still be delivered; the engine discards
    /// fires whose token it no longer holds.
    fn cancel(&self, token: TimerToken);
}

/// Source of fresh measurement values.
pub trait SampleSource {
    fn sample(
        &mut self,
        channel: Characteristic,
        format: &ValueFormat,
        range: &ValidRange,
    ) -> Value;
}
