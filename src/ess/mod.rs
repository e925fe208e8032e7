//! Environmental Sensing Service notification engine.
//!
//! Each measurement is a [`Channel`] configured by its subscriber through two
//! descriptors: the ES Trigger Setting (when to notify) and the Client
//! Characteristic Configuration (whether to notify at all). The
//! [`EssEngine`] owns all channels and turns timer fires into notifications.

pub mod channel;
pub mod codec;
pub mod decision;
pub mod descriptors;
pub mod engine;
pub mod registry;
pub mod scheduler;
pub mod trigger;
pub mod uuids;

pub use channel::{Channel, ChannelSnapshot};
pub use codec::{Value, ValueFormat};
pub use engine::EssEngine;
pub use registry::{CATALOG, ChannelSpec, ValidRange};
pub use scheduler::ScheduleState;
pub use trigger::{Condition, TriggerMode, TriggerSetting};
pub use uuids::Characteristic;
